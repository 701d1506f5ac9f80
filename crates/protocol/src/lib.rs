//! crewtalk-protocol – Relay-Protokoll
//!
//! Dieses Crate definiert alle Nachrichten die zwischen Client und
//! Relay-Server ausgetauscht werden, das Schema der vom Relay gelieferten
//! Traversal-Konfiguration und das Frame-Format auf der TCP-Verbindung.
//! Medien laufen nie ueber das Relay, nur die Aushandlung.

pub mod error;
pub mod peer_config;
pub mod relay;
pub mod wire;

pub use error::{ProtocolError, ProtocolResult};
pub use peer_config::{IceConfig, IceServer, IceTransportPolicy, PeerConfig};
pub use relay::{ClientMessage, ServerMessage, SignalData};
pub use wire::{ClientCodec, FrameCodec, RelayCodec};
