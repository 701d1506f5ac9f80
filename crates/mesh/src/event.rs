//! Ereignisse fuer die zentrale Mesh-Dispatch
//!
//! Alles was den Mesh-Zustand veraendert kommt als `MeshEvent` ueber eine
//! einzige serialisierte Warteschlange herein.

use crewtalk_core::{GameState, PeerId, Settings};
use crewtalk_protocol::{ServerMessage, SignalData};

use crate::error::PeerErrorCode;
use crate::peer::Generation;

#[derive(Debug, Clone)]
pub enum MeshEvent {
    /// Push des Game-State-Providers
    Spielzustand(GameState),
    /// Neuer Einstellungs-Snapshot
    Einstellungen(Settings),
    /// Nachricht vom Relay
    Relay(ServerMessage),
    /// Relay-Verbindung steht / ist weg
    RelayVerbunden(bool),
    /// Ereignis einer Peer-Verbindung (Generation aus `verbinden`)
    Peer {
        peer_id: PeerId,
        generation: Generation,
        event: PeerEvent,
    },
    /// Lokale Sprachaktivitaet (VAD am Mikrofon)
    LokaleSprache(bool),
    Hotkey(Hotkey),
}

/// Rueckmeldungen des Medien-Transports bzw. Audiographen
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// Lokal erzeugte Signal-Daten fuer den Peer
    Signal(SignalData),
    /// Entfernter Audio-Stream ist da
    StreamEtabliert,
    Fehler(PeerErrorCode),
    Geschlossen,
    /// VAD-Abgriff des Peer-Graphen
    Spricht(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    MuteUmschalten,
    DeafenUmschalten,
    /// Push-to-Talk-Taste gedrueckt / losgelassen
    PushToTalk(bool),
}

impl PeerEvent {
    /// Kurzname fuer Logs
    pub fn art(&self) -> &'static str {
        match self {
            PeerEvent::Signal(_) => "signal",
            PeerEvent::StreamEtabliert => "stream_etabliert",
            PeerEvent::Fehler(_) => "fehler",
            PeerEvent::Geschlossen => "geschlossen",
            PeerEvent::Spricht(_) => "spricht",
        }
    }
}

impl MeshEvent {
    /// Kurzname fuer Logs
    pub fn art(&self) -> &'static str {
        match self {
            MeshEvent::Spielzustand(_) => "spielzustand",
            MeshEvent::Einstellungen(_) => "einstellungen",
            MeshEvent::Relay(_) => "relay",
            MeshEvent::RelayVerbunden(_) => "relay_verbunden",
            MeshEvent::Peer { .. } => "peer",
            MeshEvent::LokaleSprache(_) => "lokale_sprache",
            MeshEvent::Hotkey(_) => "hotkey",
        }
    }
}
