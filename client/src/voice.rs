//! Lokale Audio-Geraete und Mikrofon-Verteilung
//!
//! Das Mikrofon ist eine einzige geteilte Quelle fuer alle Sendepfade und
//! die lokale Sprach-Erkennung. Freigegeben oder gesperrt wird es nur
//! global (Push-to-Talk, Mute, Deafen).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crewtalk_audio::dsp::vad::VadConfig;
use crewtalk_audio::{
    load_cpal_output_device, mikrofon_oeffnen, open_playback_stream, CaptureStream, LocalVoice,
    PlaybackConfig, PlaybackStream, SharedMixer,
};
use crewtalk_core::{OverlayEvent, OverlaySink, PeerId, Settings};
use crewtalk_mesh::{Generation, MeshEvent, MeshResult, PeerTransport};
use crewtalk_protocol::{IceConfig, SignalData};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::runtime::EventSender;

/// Takt der Mikrofon-Verteilung (ein Frame)
pub const FRAME_TAKT: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// Freigabe
// ---------------------------------------------------------------------------

/// Globale Mikrofon-Freigabe, geteilt zwischen Mesh und Verteilung
#[derive(Debug, Clone)]
pub struct MikrofonFreigabe(Arc<AtomicBool>);

impl MikrofonFreigabe {
    pub fn neu(freigegeben: bool) -> Self {
        Self(Arc::new(AtomicBool::new(freigegeben)))
    }

    pub fn ist_freigegeben(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn setzen(&self, freigegeben: bool) {
        self.0.store(freigegeben, Ordering::Relaxed);
    }
}

/// Transport-Adapter der die Freigabe zusaetzlich in [`MikrofonFreigabe`] spiegelt
pub struct MitFreigabe<T> {
    inner: T,
    freigabe: MikrofonFreigabe,
}

impl<T> MitFreigabe<T> {
    pub fn neu(inner: T, freigabe: MikrofonFreigabe) -> Self {
        Self { inner, freigabe }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: PeerTransport> PeerTransport for MitFreigabe<T> {
    fn verbinden(
        &mut self,
        peer_id: &PeerId,
        generation: Generation,
        initiator: bool,
        ice: &IceConfig,
    ) -> MeshResult<()> {
        self.inner.verbinden(peer_id, generation, initiator, ice)
    }

    fn signal(&mut self, peer_id: &PeerId, data: SignalData) -> MeshResult<()> {
        self.inner.signal(peer_id, data)
    }

    fn trennen(&mut self, peer_id: &PeerId) {
        self.inner.trennen(peer_id);
    }

    fn mikrofon_freigeben(&mut self, freigegeben: bool) {
        self.freigabe.setzen(freigegeben);
        self.inner.mikrofon_freigeben(freigegeben);
    }
}

// ---------------------------------------------------------------------------
// Geraete
// ---------------------------------------------------------------------------

/// Oeffnet das Mikrofon; bei Fehler Meldung ans Overlay und `None`
///
/// Kein Neuversuch: der Benutzer muss die Geraete-Einstellung korrigieren
/// und die Sitzung neu starten.
pub fn mikrofon_starten(
    settings: &Settings,
    vad: VadConfig,
    overlay: &mut impl OverlaySink,
) -> Option<(CaptureStream, LocalVoice)> {
    match mikrofon_oeffnen(settings) {
        Ok((stream, consumer)) => {
            let voice = LocalVoice::new(consumer, stream.config(), vad);
            Some((stream, voice))
        }
        Err(e) => {
            overlay.senden(OverlayEvent::Fehler(format!(
                "Mikrofon nicht verfuegbar: {e}"
            )));
            None
        }
    }
}

/// Oeffnet die Lautsprecher-Ausgabe fuer den Mischer
pub fn lautsprecher_starten(
    settings: &Settings,
    mixer: SharedMixer,
    overlay: &mut impl OverlaySink,
) -> Option<PlaybackStream> {
    let config = PlaybackConfig::fuer_settings(settings);
    let ergebnis = load_cpal_output_device(config.device.as_deref())
        .and_then(|device| open_playback_stream(&device, config, mixer));
    match ergebnis {
        Ok(stream) => {
            info!("Lautsprecher geoeffnet");
            Some(stream)
        }
        Err(e) => {
            error!(fehler = %e, "Lautsprecher konnte nicht geoeffnet werden");
            overlay.senden(OverlayEvent::Fehler(format!(
                "Lautsprecher nicht verfuegbar: {e}"
            )));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Verteilung
// ---------------------------------------------------------------------------

/// Startet die Mikrofon-Verteilung im Frame-Takt
///
/// `senden` bekommt jeden freigegebenen Frame (Fan-out an alle Peers
/// uebernimmt der Medien-Transport). Sprech-Wechsel gehen als
/// `LokaleSprache` in die Event-Warteschlange.
pub fn lokale_stimme_starten<F>(
    mut voice: LocalVoice,
    freigabe: MikrofonFreigabe,
    events: EventSender,
    mut senden: F,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    F: FnMut(&[f32]) + Send + 'static,
{
    tokio::spawn(async move {
        let mut takt = tokio::time::interval(FRAME_TAKT);
        debug!("Mikrofon-Verteilung gestartet");
        loop {
            tokio::select! {
                _ = takt.tick() => {
                    if let Some(spricht) = voice.verarbeiten(freigabe.ist_freigegeben(), &mut senden) {
                        if events.send(MeshEvent::LokaleSprache(spricht)).is_err() {
                            break;
                        }
                    }
                }
                Ok(()) = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("Mikrofon-Verteilung beendet");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewtalk_audio::CaptureConfig;
    use ringbuf::traits::{Producer, Split};
    use ringbuf::HeapRb;
    use std::sync::atomic::AtomicUsize;

    fn schnelle_vad() -> VadConfig {
        VadConfig {
            smoothing: 0.0,
            hangover_frames: 0,
            ..VadConfig::default()
        }
    }

    #[test]
    fn unbekanntes_mikrofon_meldet_fehler() {
        let settings = Settings {
            microphone: "crewtalk-gibt-es-nicht-4711".into(),
            ..Settings::default()
        };
        let mut overlay: Vec<OverlayEvent> = Vec::new();
        assert!(mikrofon_starten(&settings, schnelle_vad(), &mut overlay).is_none());
        assert!(matches!(overlay.as_slice(), [OverlayEvent::Fehler(_)]));
    }

    #[test]
    fn freigabe_wird_gespiegelt() {
        struct Leer;
        impl PeerTransport for Leer {
            fn verbinden(&mut self, _: &PeerId, _: Generation, _: bool, _: &IceConfig) -> MeshResult<()> {
                Ok(())
            }
            fn signal(&mut self, _: &PeerId, _: SignalData) -> MeshResult<()> {
                Ok(())
            }
            fn trennen(&mut self, _: &PeerId) {}
            fn mikrofon_freigeben(&mut self, _: bool) {}
        }

        let freigabe = MikrofonFreigabe::neu(true);
        let mut t = MitFreigabe::neu(Leer, freigabe.clone());
        t.mikrofon_freigeben(false);
        assert!(!freigabe.ist_freigegeben());
    }

    #[tokio::test]
    async fn lokale_sprache_wird_gemeldet() {
        let config = CaptureConfig {
            channels: 1,
            ..CaptureConfig::default()
        };
        let (mut prod, cons) = HeapRb::<f32>::new(48_000).split();
        prod.push_slice(&vec![0.3f32; config.frame_samples() * 3]);

        let voice = LocalVoice::new(cons, &config, schnelle_vad());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let gesendet = Arc::new(AtomicUsize::new(0));
        let zaehler = gesendet.clone();

        let task = lokale_stimme_starten(
            voice,
            MikrofonFreigabe::neu(true),
            tx,
            move |_| {
                zaehler.fetch_add(1, Ordering::Relaxed);
            },
            shutdown_rx,
        );

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert!(matches!(event, Some(MeshEvent::LokaleSprache(true))));
        assert_eq!(gesendet.load(Ordering::Relaxed), 3);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
