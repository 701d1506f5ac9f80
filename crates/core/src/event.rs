//! Overlay-Ereignisse
//!
//! Definiert die Schnittstelle zum Overlay-Renderer. crewtalk pusht
//! Verbindungs- und Sprechzustaende; der Renderer selbst ist ein externer
//! Kollaborateur und nicht Teil dieses Workspaces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{PeerId, PlayerId};

/// Grober Zustand fuer die Overlay-Anzeige
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlayStatus {
    /// Nicht in einer Lobby
    Menu,
    /// Voice-Mesh fuer eine Lobby aktiv
    Voice,
}

/// Alle Ereignisse die an das Overlay fliessen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayEvent {
    /// Menue oder Voice
    Status(OverlayStatus),
    /// Anzeige-Texte fuer Lobby und Relay (ggf. verborgen)
    LobbyAnzeige { lobby: String, server: String },
    /// Verbindung zum Relay steht / ist weg
    RelayVerbunden(bool),
    /// Der lokale Spieler spricht
    SelbstSpricht(bool),
    /// Ein entfernter Spieler ist hoerbar am Sprechen
    Spricht { player_id: PlayerId, spricht: bool },
    /// Audio-Verbindung zu einem Peer steht / ist weg
    PeerVerbunden { peer_id: PeerId, verbunden: bool },
    /// Aktuelle Zuordnung Peer -> Spieler
    PeerZuordnung(BTreeMap<PeerId, PlayerId>),
    /// Wer fuer die Anzeige als tot gilt (verzoegert, siehe Todes-Sichtbarkeit)
    TotSichtbar(BTreeMap<PlayerId, bool>),
    /// Mikrofon-Zustand (Mute/Deafen)
    Mikrofon { muted: bool, deafened: bool },
    /// Behebbarer Fehler, Betrieb laeuft mit Standardwerten weiter
    Warnung(String),
    /// Fataler Fehler fuer die Voice-Funktion dieser Sitzung
    Fehler(String),
}

/// Empfaenger fuer Overlay-Ereignisse
///
/// Die konkrete Implementierung (Kanal zum Renderer-Prozess, Log, Test-
/// Aufzeichnung) wird vom Einbettenden bereitgestellt.
pub trait OverlaySink {
    /// Sendet ein Ereignis an das Overlay
    fn senden(&mut self, event: OverlayEvent);
}

impl OverlaySink for Vec<OverlayEvent> {
    fn senden(&mut self, event: OverlayEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_ist_serde_kompatibel() {
        let mut ids = BTreeMap::new();
        ids.insert(PeerId::neu("a"), PlayerId(2));
        let event = OverlayEvent::PeerZuordnung(ids);
        let json = serde_json::to_string(&event).unwrap();
        let zurueck: OverlayEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(zurueck, event);
    }

    #[test]
    fn vec_sammelt_events() {
        let mut sink: Vec<OverlayEvent> = Vec::new();
        sink.senden(OverlayEvent::SelbstSpricht(true));
        sink.senden(OverlayEvent::Status(OverlayStatus::Menu));
        assert_eq!(sink.len(), 2);
    }
}
