//! DSP-Bausteine fuer den Peer-Audiograph
//!
//! Alle Bausteine nach dem Panner arbeiten auf interleaved Stereo-Samples
//! und implementieren das `AudioProcessor` Trait.

pub mod biquad;
pub mod gain;
pub mod limiter;
pub mod panner;
pub mod reverb;
pub mod vad;

/// Gemeinsames Trait fuer alle Audio-Prozessoren
///
/// Alle DSP-Bausteine verarbeiten Samples in-place und sind
/// Send + Sync fuer den Audio-Thread.
pub trait AudioProcessor: Send + Sync {
    /// Verarbeitet einen Puffer von Samples in-place
    fn process(&mut self, samples: &mut [f32]);

    /// Setzt den internen Zustand zurueck (z.B. Filter-Historie)
    fn reset(&mut self);

    /// Gibt zurueck ob der Prozessor aktiv ist
    fn is_enabled(&self) -> bool;

    /// Aktiviert oder deaktiviert den Prozessor
    fn set_enabled(&mut self, enabled: bool);
}

/// Kanalanzahl hinter dem Panner
pub const STEREO: usize = 2;
