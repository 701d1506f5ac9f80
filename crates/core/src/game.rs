//! Spielzustand wie ihn der Game-State-Provider meldet
//!
//! Der Provider liest den Zustand aus dem laufenden Spiel und pusht bei
//! jeder beobachteten Aenderung einen vollstaendigen `GameState`. Dieses
//! Modul definiert nur die Datenform; der Inhalt ist fuer crewtalk read-only.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::PlayerId;

/// Reservierter Lobby-Code: der Spieler befindet sich im Hauptmenue
pub const MENU_CODE: &str = "MENU";

/// Phase des Spiels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    #[default]
    Unknown,
    Menu,
    Lobby,
    Tasks,
    Discussion,
}

/// Ein Spieler innerhalb der beobachteten Lobby
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color_id: u8,
    /// Position (NaN wenn das Spiel keine Position liefert)
    #[serde(default = "nan", deserialize_with = "zahl_oder_nan")]
    pub x: f32,
    #[serde(default = "nan", deserialize_with = "zahl_oder_nan")]
    pub y: f32,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub is_impostor: bool,
    #[serde(default)]
    pub in_vent: bool,
    #[serde(default)]
    pub disconnected: bool,
}

impl Player {
    /// Lebendiger Spieler an einer Position, alle Flags aus
    pub fn neu(id: u32, x: f32, y: f32) -> Self {
        Self {
            id: PlayerId(id),
            name: String::new(),
            color_id: 0,
            x,
            y,
            is_dead: false,
            is_local: false,
            is_impostor: false,
            in_vent: false,
            disconnected: false,
        }
    }

    /// Erscheint der Spieler fuer Mitspieler als tot (tot oder getrennt)
    pub fn wirkt_tot(&self) -> bool {
        self.is_dead || self.disconnected
    }
}

fn nan() -> f32 {
    f32::NAN
}

// JSON kennt kein NaN: serde_json schreibt `null`, hier wird es zurueckgewandelt
fn zahl_oder_nan<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
}

/// `null` als leere Spielerliste
fn null_als_leer<'de, D>(deserializer: D) -> Result<Vec<Player>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Player>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Vollstaendiger Snapshot eines Provider-Pushes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default, rename = "gameState")]
    pub phase: GamePhase,
    #[serde(default)]
    pub lobby_code: String,
    #[serde(default, deserialize_with = "null_als_leer")]
    pub players: Vec<Player>,
}

impl GameState {
    /// Gibt den lokalen Spieler zurueck (falls im Snapshot vorhanden)
    pub fn lokaler_spieler(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_local)
    }

    /// Alle Spieler ausser dem lokalen
    pub fn andere_spieler(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.is_local)
    }

    /// Meldet der Provider das Hauptmenue als Lobby-Code
    pub fn ist_menu(&self) -> bool {
        self.lobby_code == MENU_CODE
    }

    /// Parst einen Snapshot des Providers (eine JSON-Zeile)
    pub fn aus_json(zeile: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(zeile)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serde_format() {
        let json = serde_json::to_string(&GamePhase::Discussion).unwrap();
        assert_eq!(json, "\"DISCUSSION\"");
        let p: GamePhase = serde_json::from_str("\"TASKS\"").unwrap();
        assert_eq!(p, GamePhase::Tasks);
    }

    #[test]
    fn fehlende_position_wird_nan() {
        let json = r#"{"id": 2, "x": null, "isDead": true}"#;
        let p: Player = serde_json::from_str(json).unwrap();
        assert!(p.x.is_nan());
        assert!(p.y.is_nan());
        assert!(p.is_dead);
        assert!(!p.is_local);
    }

    #[test]
    fn game_state_ohne_spieler() {
        let json = r#"{"gameState": "MENU", "lobbyCode": "MENU"}"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert!(state.players.is_empty());
        assert!(state.ist_menu());
        assert!(state.lokaler_spieler().is_none());
    }

    #[test]
    fn spieler_null_wird_leere_liste() {
        let json = r#"{"gameState": "LOBBY", "lobbyCode": "ABCDEF", "players": null}"#;
        let state = GameState::aus_json(json).unwrap();
        assert!(state.players.is_empty());
        assert_eq!(state.phase, GamePhase::Lobby);
    }

    #[test]
    fn lokaler_und_andere_spieler() {
        let mut ich = Player::neu(1, 0.0, 0.0);
        ich.is_local = true;
        let state = GameState {
            phase: GamePhase::Lobby,
            lobby_code: "ABCDEF".into(),
            players: vec![ich, Player::neu(2, 1.0, 1.0), Player::neu(3, 2.0, 2.0)],
        };
        assert_eq!(state.lokaler_spieler().map(|p| p.id), Some(PlayerId(1)));
        assert_eq!(state.andere_spieler().count(), 2);
    }

    #[test]
    fn wirkt_tot_auch_bei_trennung() {
        let mut p = Player::neu(5, 0.0, 0.0);
        assert!(!p.wirkt_tot());
        p.disconnected = true;
        assert!(p.wirkt_tot());
    }
}
