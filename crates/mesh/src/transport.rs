//! Schnittstellen zu den externen Kollaborateuren des Mesh
//!
//! Die Mesh-Zustandsmaschinen sprechen nie direkt mit Netzwerk oder
//! Audio-Geraet. Medien-Transport, Relay-Verbindung und Audio-Ausgabe
//! werden als Traits injiziert; Ergebnisse kommen als `MeshEvent` zurueck.

use std::sync::Arc;

use crewtalk_audio::{PeerAudioGraph, SharedMixer};
use crewtalk_core::PeerId;
use crewtalk_protocol::{ClientMessage, IceConfig, SignalData};

use crate::error::MeshResult;
use crate::peer::Generation;

/// Medien-Transport (Aushandlung und Stream pro Peer)
///
/// Alle Aufrufe kehren sofort zurueck. Stream, lokal erzeugte
/// Signal-Daten, Fehler und Close kommen spaeter als `PeerEvent`, jeweils
/// mit der Generation aus `verbinden`. Ereignisse einer getrennten oder
/// ersetzten Verbindung verwirft das Mesh anhand dieser Generation.
pub trait PeerTransport {
    /// Startet eine neue Verbindung (Initiator erzeugt das Angebot)
    fn verbinden(
        &mut self,
        peer_id: &PeerId,
        generation: Generation,
        initiator: bool,
        ice: &IceConfig,
    ) -> MeshResult<()>;

    /// Reicht entfernte Signal-Daten an die Verbindung weiter
    fn signal(&mut self, peer_id: &PeerId, data: SignalData) -> MeshResult<()>;

    /// Zerstoert die Verbindung; laufende Aushandlungen werden abgebrochen
    fn trennen(&mut self, peer_id: &PeerId);

    /// Gibt das geteilte Mikrofon fuer alle Sendepfade frei oder sperrt es
    fn mikrofon_freigeben(&mut self, freigegeben: bool);
}

/// Ausgehende Relay-Nachrichten
pub trait SignalSink {
    fn senden(&mut self, message: ClientMessage) -> MeshResult<()>;
}

/// Ziel fuer fertig gebaute Peer-Audiographen
pub trait AudioOutput {
    fn anschliessen(&mut self, graph: PeerAudioGraph);
    fn trennen(&mut self, peer_id: &PeerId);
}

impl AudioOutput for SharedMixer {
    fn anschliessen(&mut self, graph: PeerAudioGraph) {
        self.lock().anschliessen(graph);
    }

    fn trennen(&mut self, peer_id: &PeerId) {
        self.lock().trennen(peer_id);
    }
}

/// Meldet Sprech-Wechsel eines Peers zurueck in die Event-Schleife
///
/// Wird aus dem Audio-Thread aufgerufen und muss daher nur einreihen.
pub type TalkingNotifier = Arc<dyn Fn(PeerId, Generation, bool) + Send + Sync>;
