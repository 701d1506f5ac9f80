//! Relay-Nachrichten (JSON, getaggt ueber `type`)
//!
//! ## Client -> Relay
//! - `join` – Lobby betreten (Lobby-Code + eigene Spieler-ID)
//! - `leave` – Lobby verlassen
//! - `signal` – Aushandlungsdaten an einen Peer (`to`)
//! - `id` – eigene Spieler-ID hat sich geaendert
//!
//! ## Relay -> Client
//! - `join` – ein Peer ist der Lobby beigetreten (wir initiieren)
//! - `signal` – Aushandlungsdaten von einem Peer (`from`)
//! - `setId` / `setIds` – Zuordnung Peer -> Spieler
//! - `peerConfig` – optionale Traversal-Konfiguration (ungeprueft)

use std::collections::HashMap;

use crewtalk_core::types::{PeerId, PlayerId};
use serde::{Deserialize, Serialize};

/// Opake Aushandlungsdaten (SDP-Angebot, -Antwort oder ICE-Kandidat)
pub type SignalData = serde_json::Value;

/// Nachrichten vom Client an das Relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Join {
        #[serde(rename = "lobbyCode")]
        lobby_code: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    Leave,
    Signal { data: SignalData, to: PeerId },
    Id {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
}

/// Nachrichten vom Relay an den Client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Join {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    Signal { data: SignalData, from: PeerId },
    SetId {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    SetIds { ids: HashMap<PeerId, PlayerId> },
    /// Rohdaten; das Schema wird erst in `PeerConfig::validieren` geprueft,
    /// damit ein fehlerhaftes Objekt nicht den ganzen Frame verwirft
    PeerConfig { config: serde_json::Value },
}

impl ClientMessage {
    /// Kurzname fuer Logs
    pub fn art(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave => "leave",
            Self::Signal { .. } => "signal",
            Self::Id { .. } => "id",
        }
    }
}
