//! Biquad-Tiefpass (RBJ Audio-EQ-Cookbook)
//!
//! Die Resonanz wird wie bei Browser-Audiographen in dB angegeben:
//! `q = 0` entspricht einer Guete von 1, `q = 20` einer Guete von 10.

use super::{AudioProcessor, STEREO};

#[derive(Debug, Clone, Copy, Default)]
struct Koeffizienten {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct KanalZustand {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

/// Stereo-Tiefpass mit aenderbarer Grenzfrequenz
pub struct LowPassFilter {
    sample_rate: f32,
    cutoff_hz: f32,
    q_db: f32,
    coeffs: Koeffizienten,
    zustand: [KanalZustand; STEREO],
    enabled: bool,
}

impl LowPassFilter {
    pub fn new(sample_rate: u32, cutoff_hz: f32, q_db: f32) -> Self {
        let mut filter = Self {
            sample_rate: sample_rate as f32,
            cutoff_hz: 0.0,
            q_db: f32::NAN,
            coeffs: Koeffizienten::default(),
            zustand: [KanalZustand::default(); STEREO],
            enabled: true,
        };
        filter.set_params(cutoff_hz, q_db);
        filter
    }

    /// Neue Grenzfrequenz/Resonanz; berechnet Koeffizienten nur bei Aenderung
    pub fn set_params(&mut self, cutoff_hz: f32, q_db: f32) {
        if cutoff_hz == self.cutoff_hz && q_db == self.q_db {
            return;
        }
        self.cutoff_hz = cutoff_hz;
        self.q_db = q_db;

        let nyquist = self.sample_rate / 2.0;
        let f0 = cutoff_hz.clamp(10.0, nyquist * 0.99);
        let w0 = 2.0 * std::f32::consts::PI * f0 / self.sample_rate;
        let guete = 10f32.powf(q_db / 20.0);
        let alpha = w0.sin() / (2.0 * guete);
        let cos_w0 = w0.cos();

        let a0 = 1.0 + alpha;
        self.coeffs = Koeffizienten {
            b0: (1.0 - cos_w0) / 2.0 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        };
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }
}

impl AudioProcessor for LowPassFilter {
    fn process(&mut self, samples: &mut [f32]) {
        if !self.enabled {
            return;
        }
        let c = self.coeffs;
        for frame in samples.chunks_exact_mut(STEREO) {
            for (s, z) in frame.iter_mut().zip(self.zustand.iter_mut()) {
                let x0 = *s;
                let y0 = c.b0 * x0 + c.b1 * z.x1 + c.b2 * z.x2 - c.a1 * z.y1 - c.a2 * z.y2;
                z.x2 = z.x1;
                z.x1 = x0;
                z.y2 = z.y1;
                z.y1 = y0;
                *s = y0;
            }
        }
    }

    fn reset(&mut self) {
        self.zustand = [KanalZustand::default(); STEREO];
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
