//! Gemeinsame Identifikationstypen fuer crewtalk
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Transport-Kennungen (Relay-Socket) und Spieler-Kennungen (im Spiel)
//! zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

/// Transport-Kennung eines entfernten Peers (vom Relay vergeben, opak)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// Erstellt eine PeerId aus einer beliebigen Zeichenkette
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die innere Zeichenkette zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer:{}", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Spieler-Kennung innerhalb einer Lobby (vom Spiel vergeben)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Gibt den inneren Wert zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn peer_id_display() {
        let id = PeerId::neu("abc");
        assert_eq!(id.to_string(), "peer:abc");
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn player_id_display() {
        assert_eq!(PlayerId(3).to_string(), "player:3");
    }

    #[test]
    fn ids_sind_transparent_serialisiert() {
        let json = serde_json::to_string(&PeerId::neu("x1")).unwrap();
        assert_eq!(json, "\"x1\"");
        let json = serde_json::to_string(&PlayerId(4)).unwrap();
        assert_eq!(json, "4");
    }

    #[test]
    fn peer_id_als_map_schluessel() {
        let mut ids = HashMap::new();
        ids.insert(PeerId::neu("sock-a"), PlayerId(1));
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"{"sock-a":1}"#);
        let zurueck: HashMap<PeerId, PlayerId> = serde_json::from_str(&json).unwrap();
        assert_eq!(zurueck, ids);
    }
}
