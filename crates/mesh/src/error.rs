//! Fehlertypen fuer das Voice-Mesh

use crewtalk_core::PeerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geschlossene Fehler-Taxonomie einer Peer-Verbindung
///
/// Nur Verbindungsabbrueche und Datenkanal-Fehler gelten als
/// voruebergehend; alles andere deutet auf ein echtes Faehigkeits- oder
/// Aushandlungsproblem und wird nie automatisch wiederholt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerErrorCode {
    /// Plattform kann keine Echtzeit-Medien
    WebrtcSupport,
    CreateOffer,
    CreateAnswer,
    SetLocalDescription,
    SetRemoteDescription,
    /// Entfernter Kandidat abgelehnt
    AddIceCandidate,
    /// Konnektivitaet ueber ICE verloren
    IceConnectionFailure,
    Signaling,
    DataChannel,
    /// Allgemeiner Verbindungsabbruch
    ConnectionFailure,
}

impl PeerErrorCode {
    /// Nimmt der Fehler an der automatischen Neuverbindung teil?
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DataChannel | Self::ConnectionFailure)
    }

    /// Stabiler Kurzname (Logs, Metrik-Label)
    pub fn code(&self) -> &'static str {
        match self {
            Self::WebrtcSupport => "ERR_WEBRTC_SUPPORT",
            Self::CreateOffer => "ERR_CREATE_OFFER",
            Self::CreateAnswer => "ERR_CREATE_ANSWER",
            Self::SetLocalDescription => "ERR_SET_LOCAL_DESCRIPTION",
            Self::SetRemoteDescription => "ERR_SET_REMOTE_DESCRIPTION",
            Self::AddIceCandidate => "ERR_ADD_ICE_CANDIDATE",
            Self::IceConnectionFailure => "ERR_ICE_CONNECTION_FAILURE",
            Self::Signaling => "ERR_SIGNALING",
            Self::DataChannel => "ERR_DATA_CHANNEL",
            Self::ConnectionFailure => "ERR_CONNECTION_FAILURE",
        }
    }
}

impl std::fmt::Display for PeerErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Fehler der Mesh-Schicht und ihrer Kollaborateure
#[derive(Debug, Error)]
pub enum MeshError {
    /// Relay-Nachricht konnte nicht abgesetzt werden
    #[error("Senden an Relay fehlgeschlagen: {0}")]
    RelaySenden(String),

    /// Medien-Transport hat eine Aktion abgelehnt
    #[error("Transport-Fehler fuer {peer}: {code}")]
    Transport { peer: PeerId, code: PeerErrorCode },

    #[error("Unbekannter Peer: {0}")]
    UnbekannterPeer(PeerId),
}

/// Result-Typ fuer das Mesh-Crate
pub type MeshResult<T> = Result<T, MeshError>;
