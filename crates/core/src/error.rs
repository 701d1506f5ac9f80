//! Fehlertypen fuer crewtalk-core
//!
//! Betreffen nur die Eingaben von aussen: Einstellungs-Snapshots und
//! Spielzustaende des Providers. Die anderen Crates definieren eigene
//! Fehler.

use thiserror::Error;

/// Result-Alias fuer crewtalk-core
pub type Result<T> = std::result::Result<T, CrewtalkError>;

#[derive(Debug, Error)]
pub enum CrewtalkError {
    // --- Einstellungen ---
    #[error("Ungueltige Einstellung '{feld}': {grund}")]
    Einstellung { feld: &'static str, grund: String },

    // --- Spielzustand ---
    #[error("Ungueltiger Spielzustand: {0}")]
    Spielzustand(#[from] serde_json::Error),
}

impl CrewtalkError {
    pub fn einstellung(feld: &'static str, grund: impl Into<String>) -> Self {
        Self::Einstellung {
            feld,
            grund: grund.into(),
        }
    }
}
