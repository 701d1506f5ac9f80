//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Client ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use crewtalk_core::Settings;
use serde::{Deserialize, Serialize};

/// Umgebungsvariable fuer den Pfad der Konfigurationsdatei
pub const ENV_CONFIG: &str = "CREWTALK_CONFIG";
/// Standardpfad der Konfigurationsdatei
pub const STANDARD_PFAD: &str = "crewtalk.toml";

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Relay-Server
    pub relay: RelayEinstellungen,
    /// Einstellungs-Snapshot beim Start
    pub settings: Settings,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Relay-Server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayEinstellungen {
    /// Host oder IP des Relays
    pub adresse: String,
    pub port: u16,
    /// Wartezeit zwischen Verbindungsversuchen in Millisekunden
    pub wiederverbinden_ms: u64,
}

impl Default for RelayEinstellungen {
    fn default() -> Self {
        Self {
            adresse: "127.0.0.1".into(),
            port: 9736,
            wiederverbinden_ms: 2000,
        }
    }
}

impl RelayEinstellungen {
    /// `host:port` fuer den TCP-Connect
    pub fn ziel(&self) -> String {
        format!("{}:{}", self.adresse, self.port)
    }

    pub fn wartezeit(&self) -> Duration {
        Duration::from_millis(self.wiederverbinden_ms)
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config
                    .settings
                    .pruefen()
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Pfad aus `CREWTALK_CONFIG` oder `crewtalk.toml`
    pub fn pfad_aus_env() -> String {
        std::env::var(ENV_CONFIG).unwrap_or_else(|_| STANDARD_PFAD.into())
    }

    /// Relay-Adresse fuer die Overlay-Anzeige in die Einstellungen uebernehmen
    pub fn mit_relay_anzeige(mut self) -> Self {
        self.settings.server_url = self.relay.ziel();
        self
    }
}
