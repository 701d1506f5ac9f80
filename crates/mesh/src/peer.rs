//! Zustand einer einzelnen Peer-Verbindung
//!
//! ```text
//! Negotiating --stream--> Connected --close--> Closed
//!      \____________________close___________/
//! ```
//!
//! Wiederholungszaehler und letzter Fehler sind explizite Felder; ob nach
//! einem Close neu verbunden wird, ist eine reine Funktion dieser Felder.
//!
//! Jede Verbindung traegt eine [`Generation`]. Ereignisse des Transports
//! nennen die Generation, fuer die sie erzeugt wurden; nach Ersetzen oder
//! Neuverbinden unter derselben Peer-ID sind Ereignisse der alten
//! Verbindung daran erkennbar.

use std::fmt;

use crewtalk_core::{PeerId, PlayerId};

use crate::error::PeerErrorCode;

/// Obergrenze automatischer Neuverbindungen pro Peer
pub const MAX_RETRIES: u8 = 10;

/// Laufende Nummer einer Verbindung, eindeutig pro Mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    pub fn naechste(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Negotiating,
    Connected,
    Closed,
}

/// Was nach einem Close passiert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Sofort neu als Initiator verbinden, mit diesem Zaehlerstand
    Erneut { retries: u8 },
    /// Peer bleibt getrennt bis zum naechsten Signaling-Ereignis
    Endgueltig,
}

#[derive(Debug, Clone)]
pub struct PeerConnection {
    peer_id: PeerId,
    generation: Generation,
    player_id: Option<PlayerId>,
    state: PeerState,
    initiator: bool,
    retries: u8,
    last_error: Option<PeerErrorCode>,
}

impl PeerConnection {
    /// Lokal initiierte Verbindung (Relay meldete `join`)
    pub fn initiator(peer_id: PeerId, player_id: Option<PlayerId>, retries: u8) -> Self {
        Self {
            peer_id,
            generation: Generation::default(),
            player_id,
            state: PeerState::Negotiating,
            initiator: true,
            retries: retries.min(MAX_RETRIES),
            last_error: None,
        }
    }

    /// Antwortende Verbindung (erstes `signal` eines unbekannten Peers)
    pub fn responder(peer_id: PeerId, player_id: Option<PlayerId>) -> Self {
        Self {
            peer_id,
            generation: Generation::default(),
            player_id,
            state: PeerState::Negotiating,
            initiator: false,
            retries: 0,
            last_error: None,
        }
    }

    pub fn mit_generation(mut self, generation: Generation) -> Self {
        self.generation = generation;
        self
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn set_player_id(&mut self, player_id: Option<PlayerId>) {
        self.player_id = player_id;
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }

    pub fn retries(&self) -> u8 {
        self.retries
    }

    pub fn last_error(&self) -> Option<PeerErrorCode> {
        self.last_error
    }

    /// Merkt sich den letzten Fehler (der neueste gewinnt)
    pub fn fehler_merken(&mut self, code: PeerErrorCode) {
        self.last_error = Some(code);
    }

    pub fn stream_established(&mut self) {
        if self.state == PeerState::Negotiating {
            self.state = PeerState::Connected;
        }
    }

    pub fn schliessen(&mut self) {
        self.state = PeerState::Closed;
    }

    /// Entscheidung nach einem Close
    pub fn reconnect_decision(&self) -> ReconnectDecision {
        let transient = self.last_error.is_some_and(|e| e.is_transient());
        if self.initiator && transient && self.retries < MAX_RETRIES {
            ReconnectDecision::Erneut {
                retries: self.retries + 1,
            }
        } else {
            ReconnectDecision::Endgueltig
        }
    }
}
