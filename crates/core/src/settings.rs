//! Einstellungs-Snapshot
//!
//! Der Settings-Provider liefert bei jeder Aenderung einen vollstaendigen,
//! unveraenderlichen Snapshot. crewtalk liest ihn nur.

use serde::{Deserialize, Serialize};

use crate::error::{CrewtalkError, Result};

/// Erlaubte Werte fuer `overlay_position`
pub const OVERLAY_POSITIONEN: &[&str] = &["top", "bottom", "left", "right", "hidden"];

/// Benutzer-Einstellungen die das Voice-Verhalten beeinflussen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Push-to-Talk statt offenem Mikrofon
    pub push_to_talk: bool,
    /// Name des Eingabegeraets ("default" = Systemstandard)
    pub microphone: String,
    /// Name des Ausgabegeraets ("default" = Systemstandard)
    pub speaker: String,
    /// Raeumliches Audio in der Lobby
    pub spatial_audio: bool,
    /// Impostoren hoeren Geister leise waehrend der Tasks
    pub haunting: bool,
    /// Lautstaerke lebender Spieler fuer tote Zuhoerer (darf > 1 sein)
    pub live_volume_on_dead: f32,
    /// Lobby-Code im Overlay verbergen
    pub hide_lobby_code: bool,
    /// Relay-Adresse im Overlay verbergen
    pub hide_server_address: bool,
    /// Kompaktes Overlay
    pub compact_overlay: bool,
    /// Position des Overlays ("top", "bottom", "left", "right", "hidden")
    pub overlay_position: String,
    /// Adresse des Relay-Servers (nur fuer die Anzeige)
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            push_to_talk: false,
            microphone: "default".into(),
            speaker: "default".into(),
            spatial_audio: true,
            haunting: false,
            live_volume_on_dead: 1.0,
            hide_lobby_code: false,
            hide_server_address: false,
            compact_overlay: false,
            overlay_position: "top".into(),
            server_url: "127.0.0.1:9736".into(),
        }
    }
}

impl Settings {
    /// Gewaehltes Mikrofon, `None` fuer das Standardgeraet
    pub fn mikrofon_name(&self) -> Option<&str> {
        geraet_oder_standard(&self.microphone)
    }

    /// Gewaehlter Lautsprecher, `None` fuer das Standardgeraet
    pub fn lautsprecher_name(&self) -> Option<&str> {
        geraet_oder_standard(&self.speaker)
    }

    /// Prueft Wertebereiche die serde nicht abdeckt
    pub fn pruefen(&self) -> Result<()> {
        if !self.live_volume_on_dead.is_finite() || self.live_volume_on_dead < 0.0 {
            return Err(CrewtalkError::einstellung(
                "live_volume_on_dead",
                format!("muss >= 0 sein, ist {}", self.live_volume_on_dead),
            ));
        }
        if !OVERLAY_POSITIONEN.contains(&self.overlay_position.as_str()) {
            return Err(CrewtalkError::einstellung(
                "overlay_position",
                format!("unbekannt: '{}'", self.overlay_position),
            ));
        }
        Ok(())
    }
}

fn geraet_oder_standard(name: &str) -> Option<&str> {
    if name.is_empty() || name.eq_ignore_ascii_case("default") {
        None
    } else {
        Some(name)
    }
}
