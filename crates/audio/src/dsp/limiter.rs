//! Spitzenbegrenzer am Ende der Peer-Kette
//!
//! Feed-forward: eine Huellkurve folgt dem Spitzenpegel (schneller Attack,
//! langsamer Release); liegt sie ueber der Schwelle, wird entsprechend
//! abgesenkt.

use super::{AudioProcessor, STEREO};

#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Schwelle (linear)
    pub threshold: f32,
    /// Attack-Koeffizient pro Frame
    pub attack: f32,
    /// Release-Koeffizient pro Frame
    pub release: f32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            threshold: 0.9,
            attack: 0.5,
            release: 0.9995,
        }
    }
}

pub struct Limiter {
    config: LimiterConfig,
    huellkurve: f32,
    enabled: bool,
}

impl Limiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            huellkurve: 0.0,
            enabled: true,
        }
    }

    /// Aktuelle Absenkung (1.0 = keine)
    pub fn reduktion(&self) -> f32 {
        if self.huellkurve > self.config.threshold {
            self.config.threshold / self.huellkurve
        } else {
            1.0
        }
    }
}

impl AudioProcessor for Limiter {
    fn process(&mut self, samples: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for frame in samples.chunks_exact_mut(STEREO) {
            let spitze = frame.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            let koeff = if spitze > self.huellkurve {
                self.config.attack
            } else {
                self.config.release
            };
            self.huellkurve = koeff * self.huellkurve + (1.0 - koeff) * spitze;

            let g = self.reduktion();
            for s in frame.iter_mut() {
                // Harte Grenze fuer Spitzen die schneller als der Attack sind
                *s = (*s * g).clamp(-1.0, 1.0);
            }
        }
    }

    fn reset(&mut self) {
        self.huellkurve = 0.0;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
