//! Fehlertypen fuer die Audio-Schicht

use thiserror::Error;

/// Alle moeglichen Fehler der Audio-Schicht
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio-Geraet nicht gefunden: {0}")]
    GeraetNichtGefunden(String),

    #[error("Kein Standard-Eingabegeraet verfuegbar")]
    KeinStandardEingabegeraet,

    #[error("Kein Standard-Ausgabegeraet verfuegbar")]
    KeinStandardAusgabegeraet,

    #[error("Stream-Fehler: {0}")]
    StreamFehler(String),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("Opus-Codec-Fehler: {0}")]
    CodecFehler(String),
}

impl AudioError {
    /// Fehler beim Beschaffen des Mikrofons; beendet Voice fuer die Sitzung
    pub fn ist_geraetefehler(&self) -> bool {
        matches!(
            self,
            Self::GeraetNichtGefunden(_) | Self::KeinStandardEingabegeraet | Self::StreamFehler(_)
        )
    }
}

pub type AudioResult<T> = Result<T, AudioError>;
