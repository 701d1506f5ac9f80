//! # crewtalk-client
//!
//! Client-Runtime fuer das crewtalk Voice-Mesh:
//! - TOML-Konfiguration mit Standardwerten
//! - Relay-Verbindung ueber TCP mit automatischem Neuaufbau
//! - Serialisierte Event-Schleife um den `VoiceMesh`
//! - Mikrofon-Verteilung und Lautsprecher-Ausgabe
//! - Medien-Transport ueber WebRTC mit Opus
//! - Anbindung von Game-State-Provider und Overlay ueber JSON-Zeilen

pub mod config;
pub mod context;
pub mod medien;
pub mod provider;
pub mod relay;
pub mod runtime;
pub mod voice;

pub use config::ClientConfig;
pub use context::{AppContext, OverlayKanal};
pub use medien::{MedienSender, WebRtcTransport};
pub use relay::{RelayClient, RelaySender};
pub use runtime::{event_kanal, EventReceiver, EventSender, VoiceRuntime};
pub use voice::{MikrofonFreigabe, MitFreigabe};
