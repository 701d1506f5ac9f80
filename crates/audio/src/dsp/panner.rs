//! Stereo-Panner fuer die Peer-Position
//!
//! Equal-Power-Panning mit linearem Distanzmodell. Der Zuhoerer sitzt im
//! Ursprung und blickt in -z; die Quelle liegt auf (x, y, -0.5), damit auch
//! ein Peer direkt am Zuhoerer eine definierte Richtung hat.

use super::STEREO;

/// Abstand ab dem die Daempfung einsetzt
pub const REF_DISTANCE: f32 = 0.1;
/// Abstand ab dem nicht weiter gedaempft wird
pub const MAX_DISTANCE: f32 = 2.66 * 2.0;
pub const ROLLOFF_FACTOR: f32 = 1.0;
/// Feste Tiefe der Quelle vor dem Zuhoerer
pub const QUELLEN_TIEFE: f32 = -0.5;

/// Mono -> Stereo Positionierung
#[derive(Debug, Clone)]
pub struct StereoPanner {
    links: f32,
    rechts: f32,
}

impl StereoPanner {
    pub fn new() -> Self {
        let mut p = Self {
            links: 0.0,
            rechts: 0.0,
        };
        p.set_position(0.0, 0.0);
        p
    }

    /// Setzt die relative Position der Quelle
    pub fn set_position(&mut self, x: f32, y: f32) {
        let distanz = (x * x + y * y + QUELLEN_TIEFE * QUELLEN_TIEFE).sqrt();
        let daempfung = linear_distance_gain(distanz);

        // Azimut in der Horizontalebene (x/z), y ist "oben"
        let azimut = x.atan2(-QUELLEN_TIEFE).to_degrees().clamp(-90.0, 90.0);
        let pan = (azimut + 90.0) / 180.0;
        let winkel = pan * std::f32::consts::FRAC_PI_2;

        self.links = winkel.cos() * daempfung;
        self.rechts = winkel.sin() * daempfung;
    }

    /// (links, rechts) Verstaerkung
    pub fn kanal_gains(&self) -> (f32, f32) {
        (self.links, self.rechts)
    }

    /// Schreibt interleaved Stereo nach `ausgabe` (wird ueberschrieben)
    pub fn verarbeiten(&self, mono: &[f32], ausgabe: &mut Vec<f32>) {
        ausgabe.clear();
        ausgabe.reserve(mono.len() * STEREO);
        for &s in mono {
            ausgabe.push(s * self.links);
            ausgabe.push(s * self.rechts);
        }
    }
}

impl Default for StereoPanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Lineares Distanzmodell
pub fn linear_distance_gain(distanz: f32) -> f32 {
    let d = distanz.clamp(REF_DISTANCE, MAX_DISTANCE);
    1.0 - ROLLOFF_FACTOR * (d - REF_DISTANCE) / (MAX_DISTANCE - REF_DISTANCE)
}
