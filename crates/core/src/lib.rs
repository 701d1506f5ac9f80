//! crewtalk-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen crewtalk-Crates gemeinsam genutzt werden: Identifikatoren,
//! der vom Spiel gemeldete Zustand, der Einstellungs-Snapshot und die
//! Ereignisse an das Overlay.

pub mod error;
pub mod event;
pub mod game;
pub mod settings;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{CrewtalkError, Result};
pub use event::{OverlayEvent, OverlaySink, OverlayStatus};
pub use game::{GamePhase, GameState, Player, MENU_CODE};
pub use settings::Settings;
pub use types::{PeerId, PlayerId};
