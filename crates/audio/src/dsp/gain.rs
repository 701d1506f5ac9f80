//! Lautstaerke-Stufe mit Glaettung (keine Klicks bei Sprungaenderungen)

use super::{AudioProcessor, STEREO};

pub struct GainStage {
    aktuell: f32,
    ziel: f32,
    /// Glaettungskoeffizient pro Frame
    smoothing: f32,
    enabled: bool,
}

impl GainStage {
    pub fn new(gain: f32) -> Self {
        Self {
            aktuell: gain,
            ziel: gain,
            smoothing: 0.995,
            enabled: true,
        }
    }

    /// Setzt die Ziel-Lautstaerke (sanfter Uebergang)
    pub fn set_gain(&mut self, gain: f32) {
        self.ziel = gain.max(0.0);
    }

    pub fn gain(&self) -> f32 {
        self.ziel
    }

    #[cfg(test)]
    fn ohne_glaettung(mut self) -> Self {
        self.smoothing = 0.0;
        self
    }
}

impl AudioProcessor for GainStage {
    fn process(&mut self, samples: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for frame in samples.chunks_exact_mut(STEREO) {
            self.aktuell = self.smoothing * self.aktuell + (1.0 - self.smoothing) * self.ziel;
            // Stumm muss wirklich stumm sein
            if self.ziel == 0.0 && self.aktuell < 1e-4 {
                self.aktuell = 0.0;
            }
            for s in frame.iter_mut() {
                *s *= self.aktuell;
            }
        }
    }

    fn reset(&mut self) {
        self.aktuell = self.ziel;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
