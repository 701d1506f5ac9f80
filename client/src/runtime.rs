//! Voice-Runtime – serialisierte Event-Schleife
//!
//! Alle Quellen (Relay-Task, Medien-Transport, Audio-Thread, Game-State-
//! und Settings-Provider, Hotkeys) schieben `MeshEvent`s in eine einzige
//! Warteschlange. Nur diese Schleife fasst den `VoiceMesh` an.

use std::sync::Arc;

use crewtalk_audio::PlaybackConfig;
use crewtalk_mesh::{AudioOutput, MeshEvent, PeerEvent, PeerTransport, TalkingNotifier, VoiceMesh};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::context::{AppContext, OverlayKanal};
use crate::relay::RelaySender;

/// Sendeseite der Event-Warteschlange (klonbar, auch aus Nicht-async-Threads)
pub type EventSender = mpsc::UnboundedSender<MeshEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<MeshEvent>;

pub fn event_kanal() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Mesh mit den Client-Kollaborateuren
pub type ClientMesh<T, A> = VoiceMesh<T, RelaySender, A, OverlayKanal>;

pub struct VoiceRuntime<T, A> {
    mesh: ClientMesh<T, A>,
    events: EventReceiver,
}

impl<T, A> VoiceRuntime<T, A>
where
    T: PeerTransport,
    A: AudioOutput,
{
    /// Baut die Runtime; Sprech-Wechsel der Peer-Graphen laufen ueber `tx`
    /// zurueck in dieselbe Warteschlange
    pub fn neu(
        ctx: &AppContext,
        transport: T,
        audio: A,
        relay: RelaySender,
        (tx, rx): (EventSender, EventReceiver),
    ) -> Self {
        let notifier: TalkingNotifier = Arc::new(move |peer_id, generation, spricht| {
            let _ = tx.send(MeshEvent::Peer {
                peer_id,
                generation,
                event: PeerEvent::Spricht(spricht),
            });
        });
        let mesh = VoiceMesh::new(
            transport,
            relay,
            audio,
            ctx.overlay.clone(),
            ctx.settings.clone(),
        )
        .mit_metrics(ctx.metrics.clone())
        .mit_talking_notifier(notifier)
        .mit_sample_rate(PlaybackConfig::default().sample_rate);

        Self { mesh, events: rx }
    }

    pub fn mesh(&self) -> &ClientMesh<T, A> {
        &self.mesh
    }

    /// Ein Ereignis verarbeiten; Fehler werden geloggt, die Schleife laeuft weiter
    pub fn verarbeiten(&mut self, event: MeshEvent) {
        let art = event.art();
        if let Err(e) = self.mesh.handle(event) {
            warn!(art, fehler = %e, "Ereignis konnte nicht verarbeitet werden");
        }
    }

    /// Laeuft bis zum Shutdown-Signal; anstehende Ereignisse werden vorher
    /// noch abgearbeitet
    pub async fn laufen(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        info!("Voice-Runtime gestartet");
        loop {
            tokio::select! {
                biased;

                event = self.events.recv() => match event {
                    Some(event) => self.verarbeiten(event),
                    None => break,
                },

                Ok(()) = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Voice-Runtime beendet");
        self
    }
}
