//! TCP-Verbindung zum Relay
//!
//! Nutzt den Frame-Codec aus crewtalk-protocol (u32 BE Laenge + JSON).
//! Ein Task besitzt die Verbindung: eingehende Nachrichten und
//! Verbindungswechsel landen in der Event-Warteschlange der Runtime,
//! ausgehende Nachrichten kommen ueber [`RelaySender`] herein.
//! Bricht die Verbindung ab, wird nach einer Wartezeit neu verbunden.

use std::time::Duration;

use crewtalk_mesh::{MeshError, MeshEvent, MeshResult, SignalSink};
use crewtalk_protocol::{ClientCodec, ClientMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use crate::config::RelayEinstellungen;
use crate::runtime::EventSender;

// ---------------------------------------------------------------------------
// Ausgehende Nachrichten
// ---------------------------------------------------------------------------

/// Sendeseite fuer Relay-Nachrichten (blockiert nie)
#[derive(Debug, Clone)]
pub struct RelaySender {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl RelaySender {
    pub fn kanal() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SignalSink for RelaySender {
    fn senden(&mut self, message: ClientMessage) -> MeshResult<()> {
        self.tx
            .send(message)
            .map_err(|e| MeshError::RelaySenden(format!("Relay-Task beendet ({})", e.0.art())))
    }
}

// ---------------------------------------------------------------------------
// Verbindung
// ---------------------------------------------------------------------------

/// Warum eine Verbindung endete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trennung {
    /// Relay hat die Verbindung geschlossen
    VomRelay,
    Lesefehler,
    Schreibfehler,
    /// Shutdown-Signal oder Runtime beendet
    Beendet,
}

/// Bedient eine bestehende Verbindung bis sie endet
pub async fn verbindung_bedienen<S>(
    stream: S,
    events: &EventSender,
    ausgehend: &mut mpsc::UnboundedReceiver<ClientMessage>,
    shutdown: &mut watch::Receiver<bool>,
) -> Trennung
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, ClientCodec::new());

    loop {
        tokio::select! {
            // Eingehende Nachricht vom Relay
            frame = framed.next() => {
                match frame {
                    Some(Ok(nachricht)) => {
                        trace!(art = nachricht.art(), "Relay-Nachricht empfangen");
                        if events.send(MeshEvent::Relay(nachricht)).is_err() {
                            return Trennung::Beendet;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(fehler = %e, "Frame-Lesefehler");
                        return Trennung::Lesefehler;
                    }
                    None => {
                        info!("Verbindung vom Relay getrennt");
                        return Trennung::VomRelay;
                    }
                }
            }

            // Ausgehende Nachricht aus dem Mesh
            Some(ausgehende) = ausgehend.recv() => {
                let art = ausgehende.art();
                if let Err(e) = framed.send(ausgehende).await {
                    warn!(art, fehler = %e, "Senden an Relay fehlgeschlagen");
                    return Trennung::Schreibfehler;
                }
                trace!(art, "An Relay gesendet");
            }

            // Shutdown-Signal
            Ok(()) = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!("Shutdown-Signal, Relay-Verbindung wird getrennt");
                    return Trennung::Beendet;
                }
            }
        }
    }
}

/// Verbindungs-Task mit automatischem Wiederverbinden
pub struct RelayClient {
    ziel: String,
    wartezeit: Duration,
    events: EventSender,
    ausgehend: mpsc::UnboundedReceiver<ClientMessage>,
}

impl RelayClient {
    pub fn neu(einstellungen: &RelayEinstellungen, events: EventSender) -> (Self, RelaySender) {
        let (sender, ausgehend) = RelaySender::kanal();
        (
            Self {
                ziel: einstellungen.ziel(),
                wartezeit: einstellungen.wartezeit(),
                events,
                ausgehend,
            },
            sender,
        )
    }

    /// Laeuft bis zum Shutdown-Signal
    pub async fn laufen(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            match TcpStream::connect(&self.ziel).await {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    info!(ziel = %self.ziel, "Relay verbunden");
                    // Nachrichten aus der getrennten Zeit gehoeren nicht in die neue Sitzung
                    self.veraltete_verwerfen();
                    if self.events.send(MeshEvent::RelayVerbunden(true)).is_err() {
                        break;
                    }

                    let grund =
                        verbindung_bedienen(stream, &self.events, &mut self.ausgehend, &mut shutdown)
                            .await;
                    let _ = self.events.send(MeshEvent::RelayVerbunden(false));
                    if grund == Trennung::Beendet {
                        break;
                    }
                    warn!(ziel = %self.ziel, grund = ?grund, "Relay-Verbindung verloren");
                }
                Err(e) => {
                    warn!(ziel = %self.ziel, fehler = %e, "Relay nicht erreichbar");
                }
            }

            self.veraltete_verwerfen();
            tokio::select! {
                _ = tokio::time::sleep(self.wartezeit) => {}
                Ok(()) = shutdown.changed() => {}
            }
        }
        info!("Relay-Task beendet");
    }

    fn veraltete_verwerfen(&mut self) {
        let mut verworfen = 0usize;
        while self.ausgehend.try_recv().is_ok() {
            verworfen += 1;
        }
        if verworfen > 0 {
            debug!(verworfen, "Veraltete Relay-Nachrichten verworfen");
        }
    }
}
