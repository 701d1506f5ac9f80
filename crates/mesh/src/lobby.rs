//! Lobby-Mitgliedschaft
//!
//! Zustaende `NotJoined` und `Joined(code)`. Die Zustandsmaschine
//! entscheidet nur; Senden und Abbauen uebernimmt der Aufrufer anhand der
//! zurueckgegebenen `LobbyAktion`.

use crewtalk_core::{PlayerId, MENU_CODE};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Membership {
    #[default]
    NotJoined,
    Joined(String),
}

/// Folge eines Mitgliedschafts-Aufrufs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyAktion {
    /// Menue: alle Verbindungen und die Zuordnung verwerfen
    AllesTrennen,
    /// `join` an das Relay senden
    Join { lobby_code: String, player_id: PlayerId },
    /// Bereits in dieser Lobby
    Keine,
}

#[derive(Debug, Default)]
pub struct LobbyMembership {
    zustand: Membership,
}

impl LobbyMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zustand(&self) -> &Membership {
        &self.zustand
    }

    pub fn ist_beigetreten(&self) -> bool {
        matches!(self.zustand, Membership::Joined(_))
    }

    /// Gemeldeten Lobby-Code uebernehmen
    ///
    /// Gleicher Code wie bereits beigetreten ist ein No-op; bestehende
    /// Verbindungen bleiben bei einem Codewechsel unangetastet.
    pub fn verbinden(&mut self, lobby_code: &str, player_id: PlayerId) -> LobbyAktion {
        if lobby_code == MENU_CODE {
            return self.menu();
        }

        if let Membership::Joined(code) = &self.zustand {
            if code == lobby_code {
                return LobbyAktion::Keine;
            }
        }

        info!(lobby = %lobby_code, player_id = %player_id, "Lobby beigetreten");
        self.zustand = Membership::Joined(lobby_code.to_string());
        LobbyAktion::Join {
            lobby_code: lobby_code.to_string(),
            player_id,
        }
    }

    /// Menue gemeldet; braucht keinen lokalen Spieler
    pub fn menu(&mut self) -> LobbyAktion {
        if self.zustand != Membership::NotJoined {
            info!("Lobby verlassen (Menue)");
        }
        self.zustand = Membership::NotJoined;
        LobbyAktion::AllesTrennen
    }

    /// Erzwungenes Verlassen (Phase -> Menue, Relay-Verlust)
    pub fn verlassen(&mut self) {
        self.zustand = Membership::NotJoined;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erster_beitritt_sendet_join() {
        let mut m = LobbyMembership::new();
        let aktion = m.verbinden("ABCDE", PlayerId(3));
        assert_eq!(
            aktion,
            LobbyAktion::Join {
                lobby_code: "ABCDE".into(),
                player_id: PlayerId(3)
            }
        );
        assert_eq!(m.zustand(), &Membership::Joined("ABCDE".into()));
    }

    #[test]
    fn gleicher_code_ist_idempotent() {
        let mut m = LobbyMembership::new();
        m.verbinden("ABCDE", PlayerId(3));
        assert_eq!(m.verbinden("ABCDE", PlayerId(3)), LobbyAktion::Keine);
        assert!(m.ist_beigetreten());
    }

    #[test]
    fn neuer_code_sendet_erneut_join() {
        let mut m = LobbyMembership::new();
        m.verbinden("ABCDE", PlayerId(3));
        assert!(matches!(
            m.verbinden("FGHIJ", PlayerId(3)),
            LobbyAktion::Join { .. }
        ));
        assert_eq!(m.zustand(), &Membership::Joined("FGHIJ".into()));
    }

    #[test]
    fn menu_trennt_alles() {
        let mut m = LobbyMembership::new();
        m.verbinden("ABCDE", PlayerId(3));
        assert_eq!(m.verbinden(MENU_CODE, PlayerId(3)), LobbyAktion::AllesTrennen);
        assert_eq!(m.zustand(), &Membership::NotJoined);
    }

    #[test]
    fn nach_verlassen_wieder_join() {
        let mut m = LobbyMembership::new();
        m.verbinden("ABCDE", PlayerId(3));
        m.verlassen();
        assert!(matches!(
            m.verbinden("ABCDE", PlayerId(3)),
            LobbyAktion::Join { .. }
        ));
    }
}
