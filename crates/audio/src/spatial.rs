//! Raumklang-Regeln
//!
//! Reine Entscheidungsfunktion: aus Spielphase, Einstellungen, lokalem und
//! einem entfernten Spieler werden die Audio-Parameter fuer genau diesen
//! Peer berechnet. Kein Zustand, keine Abhaengigkeit von frueheren Werten.
//!
//! Die Regeln werden in fester Reihenfolge ausgewertet; die erste
//! zutreffende Regel mit Abbruch gewinnt.

use crewtalk_core::{GamePhase, Player, Settings};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Betrag auf den jede Koordinatenachse begrenzt wird (und Ersatz fuer NaN)
pub const MAX_KOORDINATE: f32 = 999.0;

/// Ab dieser Entfernung (Spieleinheiten) ist ein Peer nicht mehr hoerbar
pub const HOERWEITE: f32 = 7.0;

/// Lautstaerkefaktor wenn der lokale Spieler in einem Schacht steckt
pub const VENT_DAEMPFUNG: f32 = 0.7;

/// Lautstaerkefaktor wenn ein Impostor einen Geist belauscht
pub const GEISTER_FLUESTERN: f32 = 0.3;

// ---------------------------------------------------------------------------
// Typen
// ---------------------------------------------------------------------------

/// Tiefpass-Einstellung ("gedaempft wie durch eine Wand")
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuffleFilter {
    /// Grenzfrequenz in Hz
    pub cutoff_hz: f32,
    /// Resonanz in dB
    pub q: f32,
}

impl MuffleFilter {
    /// Aktiver Filter im Schacht
    pub const VENT: MuffleFilter = MuffleFilter {
        cutoff_hz: 400.0,
        q: 20.0,
    };

    /// Praktisch offener Filter
    pub const OFFEN: MuffleFilter = MuffleFilter {
        cutoff_hz: 20_000.0,
        q: 0.0,
    };

    pub fn ist_aktiv(&self) -> bool {
        *self == Self::VENT
    }

    fn fuer_vent(in_vent: bool) -> Self {
        if in_vent {
            Self::VENT
        } else {
            Self::OFFEN
        }
    }
}

/// Relative Position eines Peers (immer endlich, je Achse in [-999, 999])
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const URSPRUNG: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: achse_begrenzen(x),
            y: achse_begrenzen(y),
        }
    }

    /// Euklidischer Abstand zum Zuhoerer
    pub fn abstand(&self) -> f32 {
        self.x.hypot(self.y)
    }
}

fn achse_begrenzen(wert: f32) -> f32 {
    if wert.is_finite() {
        wert.clamp(-MAX_KOORDINATE, MAX_KOORDINATE)
    } else {
        MAX_KOORDINATE
    }
}

/// Ergebnis einer Auswertung fuer einen Peer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioParams {
    /// Lautstaerke; normal in [0, 1], mit `live_volume_on_dead` auch darueber
    pub gain: f32,
    pub position: Position,
    pub muffle: MuffleFilter,
    /// Hall-Anteil, 0 oder 1
    pub reverb_send: f32,
}

impl AudioParams {
    /// Stummer Peer (Ausgangszustand eines frisch gebauten Kanals)
    pub fn stumm() -> Self {
        Self {
            gain: 0.0,
            position: Position::URSPRUNG,
            muffle: MuffleFilter::OFFEN,
            reverb_send: 0.0,
        }
    }

    pub fn ist_hoerbar(&self) -> bool {
        self.gain > 0.0
    }
}

impl Default for AudioParams {
    fn default() -> Self {
        Self::stumm()
    }
}

// ---------------------------------------------------------------------------
// Auswertung
// ---------------------------------------------------------------------------

/// Berechnet die Audio-Parameter fuer `other` aus Sicht von `me`
pub fn compute_audio_params(
    phase: GamePhase,
    settings: &Settings,
    me: &Player,
    other: &Player,
) -> AudioParams {
    // 1. + 2. relative Position, in Besprechungen alle am selben Ort
    let zusammen = phase == GamePhase::Discussion
        || (phase == GamePhase::Lobby && !settings.spatial_audio);
    let position = if zusammen {
        Position::URSPRUNG
    } else {
        Position::new(other.x - me.x, other.y - me.y)
    };

    let ergebnis = |gain: f32, muffle: MuffleFilter| AudioParams {
        gain,
        position,
        muffle,
        reverb_send: 0.0,
    };

    // 3. Schacht: nur wer selbst im Schacht ist hoert mit
    if other.in_vent {
        let gain = if me.in_vent { 1.0 } else { 0.0 };
        return ergebnis(gain, MuffleFilter::fuer_vent(me.in_vent));
    }

    // 4. Geister hoeren Geister ungefiltert
    if me.is_dead && other.is_dead {
        return ergebnis(1.0, MuffleFilter::OFFEN);
    }

    // 5. Lebende hoeren keine Geister (ausser Impostor mit Haunting in Tasks)
    let darf_spuken = me.is_impostor && settings.haunting && phase == GamePhase::Tasks;
    if !me.is_dead && other.is_dead && !darf_spuken {
        return ergebnis(0.0, MuffleFilter::fuer_vent(me.in_vent));
    }

    // 6. Grundlautstaerke der Phase
    let mut gain = match phase {
        GamePhase::Lobby | GamePhase::Discussion | GamePhase::Tasks => 1.0,
        GamePhase::Unknown | GamePhase::Menu => 0.0,
    };

    // 7. Tote hoeren Lebende mit eigenem Faktor
    if me.is_dead && !other.is_dead {
        gain = settings.live_volume_on_dead;
    }

    // 8. Reichweite
    if gain > 0.0 && position.abstand() > HOERWEITE {
        gain = 0.0;
    }

    // 9. Im Schacht klingt alles gedaempft
    let muffle = MuffleFilter::fuer_vent(me.in_vent);
    if me.in_vent {
        gain *= VENT_DAEMPFUNG;
    }

    // 10. Impostor belauscht Geister leise mit Hall
    let mut reverb_send = 0.0;
    if gain > 0.0 && !me.is_dead && me.is_impostor && other.is_dead && settings.haunting {
        gain *= GEISTER_FLUESTERN;
        reverb_send = 1.0;
    }

    AudioParams {
        gain,
        position,
        muffle,
        reverb_send,
    }
}
