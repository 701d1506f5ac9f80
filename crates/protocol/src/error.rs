//! Fehlertypen fuer das Relay-Protokoll

use thiserror::Error;

/// Alle Fehler des Protokoll-Crates
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// peerConfig entspricht nicht dem Schema
    #[error("Ungueltige peerConfig: {0}")]
    UngueltigePeerConfig(String),

    /// Relay-Only erzwungen, aber keine TURN-Server geliefert
    #[error("Relay-Modus erzwungen, aber keine Relay-Server angegeben")]
    RelayOhneTurnServer,

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Konfigurationsfehler die mit der Standard-Konfiguration ueberbrueckt werden
    pub fn ist_konfigurationsfehler(&self) -> bool {
        matches!(self, Self::UngueltigePeerConfig(_) | Self::RelayOhneTurnServer)
    }
}

/// Result-Typ fuer das Protokoll-Crate
pub type ProtocolResult<T> = Result<T, ProtocolError>;
