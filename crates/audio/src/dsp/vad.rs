//! Sprach-Erkennung (VAD)
//!
//! Energie-basierte Erkennung kombiniert mit Zero-Crossing-Rate. Wird an
//! zwei Stellen genutzt: am lokalen Mikrofon ("ich spreche") und hinter
//! dem Limiter jedes Peer-Graphen ("Peer ist hoerbar am Sprechen").
//! Arbeitet auf beliebig interleavten Samples, die Analyse ist kanalblind.

use super::AudioProcessor;

/// Konfiguration fuer die VAD
#[derive(Debug, Clone)]
pub struct VadConfig {
    /// Energie-Schwellenwert (RMS, 0.0..1.0)
    pub energy_threshold: f32,
    /// Zero-Crossing-Rate oberhalb der ein Frame als Rauschen gilt
    pub zcr_threshold: f32,
    /// Frames die nach letzter Aktivitaet noch als aktiv gelten
    pub hangover_frames: u32,
    /// Glaettungsfaktor fuer Energie (0.0 = keine Glaettung)
    pub smoothing: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 0.01,
            zcr_threshold: 0.3,
            hangover_frames: 8,
            smoothing: 0.8,
        }
    }
}

/// Voice Activity Detector mit Flankenerkennung
pub struct Vad {
    config: VadConfig,
    smoothed_energy: f32,
    hangover_counter: u32,
    voice_active: bool,
    enabled: bool,
}

impl Vad {
    pub fn new(config: VadConfig) -> Self {
        Self {
            config,
            smoothed_energy: 0.0,
            hangover_counter: 0,
            voice_active: false,
            enabled: true,
        }
    }

    pub fn is_voice_active(&self) -> bool {
        self.voice_active
    }

    /// Analysiert einen Frame und gibt zurueck ob Sprache aktiv ist.
    /// Veraendert die Samples nicht.
    pub fn detect(&mut self, samples: &[f32]) -> bool {
        if !self.enabled || samples.is_empty() {
            self.voice_active = false;
            self.hangover_counter = 0;
            return false;
        }

        let energy = rms_energy(samples);
        self.smoothed_energy =
            self.config.smoothing * self.smoothed_energy + (1.0 - self.config.smoothing) * energy;

        let energy_active = self.smoothed_energy > self.config.energy_threshold;
        let zcr_plausible = zero_crossing_rate(samples) < self.config.zcr_threshold;

        if energy_active && zcr_plausible {
            self.hangover_counter = self.config.hangover_frames;
            self.voice_active = true;
        } else if self.hangover_counter > 0 {
            self.hangover_counter -= 1;
            self.voice_active = true;
        } else {
            self.voice_active = false;
        }

        self.voice_active
    }

    /// Wie `detect`, liefert aber nur bei einem Zustandswechsel `Some`
    pub fn detect_change(&mut self, samples: &[f32]) -> Option<bool> {
        let vorher = self.voice_active;
        let jetzt = self.detect(samples);
        (vorher != jetzt).then_some(jetzt)
    }

    pub fn smoothed_energy(&self) -> f32 {
        self.smoothed_energy
    }
}

impl AudioProcessor for Vad {
    /// Rein analytisch, Samples bleiben unveraendert
    fn process(&mut self, samples: &mut [f32]) {
        self.detect(samples);
    }

    fn reset(&mut self) {
        self.smoothed_energy = 0.0;
        self.hangover_counter = 0;
        self.voice_active = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// RMS-Energie eines Frames
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Normalisierte Zero-Crossing-Rate
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}
