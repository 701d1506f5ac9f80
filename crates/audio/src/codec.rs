//! Opus Encoder/Decoder fuer den Sendepfad der Peers
//!
//! Kodiert die freigegebenen 20-ms-Mikrofon-Frames und dekodiert
//! entfernte Pakete zu Mono fuer den Mischer. Abtastrate ist immer
//! 48 kHz, wie beim Capture.

use audiopus::{
    coder::{Decoder, Encoder},
    Application, Bitrate, Channels, SampleRate,
};
use tracing::debug;

use crate::error::{AudioError, AudioResult};

/// Abtastrate des Opus-Pfads in Hz
pub const OPUS_SAMPLE_RATE: u32 = 48_000;

/// Samples pro Kanal in einem 20-ms-Frame
pub const OPUS_FRAME_SAMPLES: usize = OPUS_SAMPLE_RATE as usize / 50;

/// Groesstes Opus-Paket (120 ms bei 48 kHz)
const MAX_DECODE_SAMPLES: usize = OPUS_SAMPLE_RATE as usize / 1000 * 120;

/// Sprach-Bitrate
const BITRATE_BPS: i32 = 32_000;

fn kanaele(channels: u16) -> AudioResult<Channels> {
    match channels {
        1 => Ok(Channels::Mono),
        2 => Ok(Channels::Stereo),
        n => Err(AudioError::Konfiguration(format!(
            "Opus unterstuetzt nur 1 oder 2 Kanaele, nicht {n}"
        ))),
    }
}

/// Opus-Encoder: kodiert f32-PCM (interleaved) zu Opus-Bytes
pub struct OpusEncoder {
    encoder: Encoder,
    frame_size: usize,
}

impl OpusEncoder {
    /// Encoder fuer Sprache mit `channels` Kanaelen (1 oder 2)
    pub fn new(channels: u16) -> AudioResult<Self> {
        let mut encoder = Encoder::new(SampleRate::Hz48000, kanaele(channels)?, Application::Voip)
            .map_err(|e| AudioError::CodecFehler(e.to_string()))?;

        encoder
            .set_bitrate(Bitrate::BitsPerSecond(BITRATE_BPS))
            .map_err(|e| AudioError::CodecFehler(e.to_string()))?;
        encoder
            .set_inband_fec(true)
            .map_err(|e| AudioError::CodecFehler(e.to_string()))?;

        let frame_size = OPUS_FRAME_SAMPLES * channels as usize;
        debug!(channels, frame_size, "OpusEncoder erstellt");
        Ok(Self {
            encoder,
            frame_size,
        })
    }

    /// Kodiert einen PCM-Frame; die Eingabe muss exakt `frame_size()` lang sein
    pub fn encode(&mut self, pcm: &[f32]) -> AudioResult<Vec<u8>> {
        if pcm.len() != self.frame_size {
            return Err(AudioError::Konfiguration(format!(
                "PCM-Frame muss {} Samples lang sein, war {}",
                self.frame_size,
                pcm.len()
            )));
        }

        // 4000 Bytes reichen fuer jedes Opus-Paket
        let mut output = vec![0u8; 4000];
        let written = self
            .encoder
            .encode_float(pcm, &mut output)
            .map_err(|e| AudioError::CodecFehler(e.to_string()))?;
        output.truncate(written);
        Ok(output)
    }

    /// Erwartete Frame-Groesse in Samples (alle Kanaele)
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
}

/// Opus-Decoder: dekodiert entfernte Pakete zu Mono
///
/// Stereo-Pakete werden von libopus selbst heruntergemischt.
pub struct OpusDecoder {
    decoder: Decoder,
}

impl OpusDecoder {
    pub fn new() -> AudioResult<Self> {
        let decoder = Decoder::new(SampleRate::Hz48000, Channels::Mono)
            .map_err(|e| AudioError::CodecFehler(e.to_string()))?;
        Ok(Self { decoder })
    }

    /// Dekodiert ein Paket zu Mono-PCM
    pub fn decode(&mut self, opus_data: &[u8]) -> AudioResult<Vec<f32>> {
        let mut output = vec![0.0f32; MAX_DECODE_SAMPLES];
        let decoded = self
            .decoder
            .decode_float(Some(opus_data), &mut output, false)
            .map_err(|e| AudioError::CodecFehler(e.to_string()))?;
        output.truncate(decoded);
        Ok(output)
    }
}
