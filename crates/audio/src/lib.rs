//! crewtalk-audio – Audio-Schicht
//!
//! - Raumklang-Regeln (`spatial`): reine Funktion Spielzustand -> Parameter
//! - Peer-Audiograph: Panner, Tiefpass, Gain, Hall, Limiter, VAD-Abgriff
//! - Mischer und Lautsprecher-Ausgabe via cpal
//! - Mikrofon-Capture mit festen Vorgaben, Sende-Freigabe (PTT/Mute/Deafen)
//! - Opus-Codec fuer den Sendepfad der Peers

pub mod capture;
pub mod codec;
pub mod device;
pub mod dsp;
pub mod error;
pub mod gate;
pub mod graph;
pub mod mixer;
pub mod playback;
pub mod spatial;

// Bequeme Re-Exporte der wichtigsten Typen
pub use capture::{mikrofon_oeffnen, CaptureConfig, CaptureConsumer, CaptureStream, LocalVoice};
pub use codec::{OpusDecoder, OpusEncoder, OPUS_FRAME_SAMPLES, OPUS_SAMPLE_RATE};
pub use device::{load_cpal_input_device, load_cpal_output_device};
pub use dsp::AudioProcessor;
pub use error::{AudioError, AudioResult};
pub use gate::TransmitGate;
pub use graph::{AudioChannelHandle, PeerAudioGraph, PeerGraphConfig, TalkingCallback};
pub use mixer::{PeerMixer, SharedMixer};
pub use playback::{open_playback_stream, PlaybackConfig, PlaybackStream};
pub use spatial::{compute_audio_params, AudioParams, MuffleFilter, Position};
