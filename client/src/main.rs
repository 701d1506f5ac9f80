//! crewtalk Client – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet Relay-
//! Verbindung, Audio und Event-Schleife. Spielzustand kommt zeilenweise
//! ueber stdin, Overlay-Ereignisse gehen zeilenweise nach stdout.

use anyhow::{Context, Result};
use crewtalk_audio::dsp::vad::VadConfig;
use crewtalk_audio::PeerMixer;
use crewtalk_client::{
    event_kanal, provider, voice, AppContext, ClientConfig, MikrofonFreigabe, MitFreigabe,
    RelayClient, VoiceRuntime, WebRtcTransport,
};
use crewtalk_core::{OverlayEvent, OverlaySink};
use crewtalk_observability::logging_initialisieren;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config_pfad = ClientConfig::pfad_aus_env();
    let config = ClientConfig::laden(&config_pfad)?.mit_relay_anzeige();

    logging_initialisieren(&config.logging.level, &config.logging.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        relay = %config.relay.ziel(),
        "crewtalk Client wird initialisiert"
    );

    let (ctx, overlay_rx) = AppContext::neu(&config)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (events_tx, events_rx) = event_kanal();

    // Audio
    let mixer = PeerMixer::geteilt();
    let mut overlay = ctx.overlay.clone();
    let _lautsprecher = voice::lautsprecher_starten(&ctx.settings, mixer.clone(), &mut overlay);
    let freigabe = MikrofonFreigabe::neu(!ctx.settings.push_to_talk);
    let medien = WebRtcTransport::neu(events_tx.clone(), mixer.clone())
        .context("WebRTC konnte nicht initialisiert werden")?;
    let mut _mikrofon = None;
    if let Some((stream, lokale_stimme)) =
        voice::mikrofon_starten(&ctx.settings, VadConfig::default(), &mut overlay)
    {
        match medien.sender(stream.config().channels) {
            Ok(mut sender) => {
                let _verteilung = voice::lokale_stimme_starten(
                    lokale_stimme,
                    freigabe.clone(),
                    events_tx.clone(),
                    move |frame| sender.senden(frame),
                    shutdown_rx.clone(),
                );
                _mikrofon = Some(stream);
            }
            Err(e) => {
                warn!(fehler = %e, "Sendepfad nicht verfuegbar");
                overlay.senden(OverlayEvent::Fehler(format!("Opus-Encoder nicht verfuegbar: {e}")));
            }
        }
    }

    // Relay und Event-Schleife
    let (relay, relay_sender) = RelayClient::neu(&config.relay, events_tx.clone());
    let runtime = VoiceRuntime::neu(
        &ctx,
        MitFreigabe::neu(medien, freigabe),
        mixer,
        relay_sender,
        (events_tx.clone(), events_rx),
    );

    let relay_task = tokio::spawn(relay.laufen(shutdown_rx.clone()));
    let runtime_task = tokio::spawn(runtime.laufen(shutdown_rx.clone()));
    let overlay_task = tokio::spawn(provider::overlay_schreiben(overlay_rx, tokio::io::stdout()));
    let provider_task = tokio::spawn(async move {
        provider::spielzustand_lesen(BufReader::new(tokio::io::stdin()), &events_tx).await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Beende Client (Signal)"),
        ergebnis = provider_task => {
            let snapshots = ergebnis??;
            info!(snapshots, "Game-State-Provider beendet");
        }
    }

    shutdown_tx.send(true)?;
    relay_task.await?;
    let runtime = runtime_task.await?;
    info!(peers = runtime.mesh().peers().anzahl_peers(), "Event-Schleife gestoppt");
    debug!(metriken = %ctx.metrics.render()?, "Abschluss-Metriken");
    overlay_task.abort();

    info!("crewtalk Client beendet");
    Ok(())
}
