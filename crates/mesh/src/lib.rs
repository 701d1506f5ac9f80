//! crewtalk-mesh – Voice-Mesh zwischen den Spielern einer Lobby
//!
//! - Peer-Verbindungen mit begrenzter automatischer Neuverbindung
//! - Lobby-Mitgliedschaft (Join/Leave am Relay)
//! - Todes-Sichtbarkeit (an Phasengrenzen verzoegert)
//! - Zentrale Dispatch aller Ereignisse ueber [`VoiceMesh::handle`]

pub mod death;
pub mod error;
pub mod event;
pub mod lobby;
pub mod manager;
pub mod mesh;
pub mod peer;
pub mod transport;

pub use death::DeathVisibility;
pub use error::{MeshError, MeshResult, PeerErrorCode};
pub use event::{Hotkey, MeshEvent, PeerEvent};
pub use lobby::{LobbyAktion, LobbyMembership, Membership};
pub use manager::{CloseOutcome, PeerManager};
pub use mesh::VoiceMesh;
pub use peer::{Generation, PeerConnection, PeerState, ReconnectDecision, MAX_RETRIES};
pub use transport::{AudioOutput, PeerTransport, SignalSink, TalkingNotifier};
