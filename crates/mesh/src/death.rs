//! Todes-Sichtbarkeit
//!
//! Spieler-ID -> "wirkt tot". Wird nur an Phasengrenzen fortgeschrieben
//! und ist waehrend `Tasks` eingefroren: ein Tod mitten in der Runde wird
//! erst beim naechsten Meeting sichtbar.

use std::collections::{BTreeMap, HashMap};

use crewtalk_core::{GamePhase, Player, PlayerId};
use tracing::debug;

#[derive(Debug, Default)]
pub struct DeathVisibility {
    eintraege: HashMap<PlayerId, bool>,
}

impl DeathVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phasenwechsel anwenden; gibt zurueck ob sich etwas geaendert hat
    pub fn phase_wechsel(&mut self, neue_phase: GamePhase, players: &[Player]) -> bool {
        match neue_phase {
            GamePhase::Lobby => {
                let geaendert = !self.eintraege.is_empty();
                self.eintraege.clear();
                geaendert
            }
            GamePhase::Tasks => false,
            _ => {
                let mut geaendert = false;
                for p in players {
                    let tot = p.wirkt_tot();
                    if self.eintraege.insert(p.id, tot) != Some(tot) {
                        geaendert = true;
                    }
                }
                if geaendert {
                    debug!(phase = ?neue_phase, eintraege = self.eintraege.len(), "Todes-Sichtbarkeit fortgeschrieben");
                }
                geaendert
            }
        }
    }

    pub fn leeren(&mut self) {
        self.eintraege.clear();
    }

    /// Gilt der Spieler fuer die Anzeige als tot (unbekannt = lebendig)
    pub fn wirkt_tot(&self, player_id: PlayerId) -> bool {
        self.eintraege.get(&player_id).copied().unwrap_or(false)
    }

    pub fn eintrag(&self, player_id: PlayerId) -> Option<bool> {
        self.eintraege.get(&player_id).copied()
    }

    pub fn ist_leer(&self) -> bool {
        self.eintraege.is_empty()
    }

    /// Sortierte Kopie fuer das Overlay
    pub fn snapshot(&self) -> BTreeMap<PlayerId, bool> {
        self.eintraege.iter().map(|(k, v)| (*k, *v)).collect()
    }
}
