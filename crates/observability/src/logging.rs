//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `CT_LOG_LEVEL`: Log-Level oder Filter-Ausdruck, Standard: info
//! - `CT_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Die Umgebung hat Vorrang vor den Werten aus der Konfigurationsdatei.

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "CT_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CT_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// Schlaegt fehl wenn bereits ein globaler Subscriber installiert ist.
pub fn logging_initialisieren(level: &str, format: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_env = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| format.to_string());

    match format_env.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        _ => fmt().with_env_filter(filter).with_target(true).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Logging-Initialisierung fehlgeschlagen: {e}"))
}

/// Log-Level aus der Umgebung, Fallback "info"
pub fn log_level_aus_env() -> String {
    std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string())
}

/// Log-Format aus der Umgebung, Fallback "text"
pub fn log_format_aus_env() -> String {
    std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string())
}

pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level), "{}", level);
        }
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO"));
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON"));
    }

    // Beide Variablen in je einem Test, damit parallele Tests sich nicht stoeren
    #[test]
    fn log_level_aus_env_mit_und_ohne_variable() {
        std::env::remove_var(ENV_LOG_LEVEL);
        assert_eq!(log_level_aus_env(), "info");
        std::env::set_var(ENV_LOG_LEVEL, "debug");
        assert_eq!(log_level_aus_env(), "debug");
        std::env::remove_var(ENV_LOG_LEVEL);
    }

    #[test]
    fn log_format_aus_env_mit_und_ohne_variable() {
        std::env::remove_var(ENV_LOG_FORMAT);
        assert_eq!(log_format_aus_env(), "text");
        std::env::set_var(ENV_LOG_FORMAT, "json");
        assert_eq!(log_format_aus_env(), "json");
        std::env::remove_var(ENV_LOG_FORMAT);
    }
}
