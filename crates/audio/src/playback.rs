//! Lautsprecher-Ausgabe via cpal
//!
//! Oeffnet einen cpal OutputStream, dessen Callback bei jedem Block den
//! geteilten `PeerMixer` abfragt. Ausgabe ist immer Stereo.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tracing::{debug, error};

use crate::dsp::STEREO;
use crate::error::{AudioError, AudioResult};
use crate::mixer::SharedMixer;

/// Konfiguration fuer die Ausgabe
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Abtastrate in Hz
    pub sample_rate: u32,
    /// Gewuenschtes Geraet (None = Standard)
    pub device: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            device: None,
        }
    }
}

impl PlaybackConfig {
    /// Ausgabe gemaess Lautsprecher-Einstellung
    pub fn fuer_settings(settings: &crewtalk_core::Settings) -> Self {
        Self {
            device: settings.lautsprecher_name().map(str::to_string),
            ..Self::default()
        }
    }
}

/// Haelt den cpal-Stream am Leben; Drop stoppt die Ausgabe
pub struct PlaybackStream {
    _stream: Stream,
    config: PlaybackConfig,
}

impl PlaybackStream {
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }
}

/// Oeffnet die Ausgabe auf dem gegebenen Geraet und verbindet sie mit dem Mischer
pub fn open_playback_stream(
    device: &Device,
    config: PlaybackConfig,
    mixer: SharedMixer,
) -> AudioResult<PlaybackStream> {
    let stream_config = StreamConfig {
        channels: STEREO as u16,
        sample_rate: config.sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err| error!("Playback-Fehler: {}", err);

    let supported = device
        .supported_output_configs()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?
        .find(|c| {
            c.min_sample_rate() <= config.sample_rate
                && c.max_sample_rate() >= config.sample_rate
                && c.channels() >= STEREO as u16
        });

    let sample_format = supported
        .map(|c| c.sample_format())
        .unwrap_or(SampleFormat::F32);

    let stream = match sample_format {
        SampleFormat::F32 => device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    mixer.lock().mischen(data);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        SampleFormat::I16 => {
            let mut float_buf = Vec::new();
            device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [i16], _| {
                        float_buf.resize(data.len(), 0.0);
                        mixer.lock().mischen(&mut float_buf);
                        for (out, s) in data.iter_mut().zip(float_buf.iter()) {
                            *out = (*s * i16::MAX as f32)
                                .clamp(i16::MIN as f32, i16::MAX as f32)
                                as i16;
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| AudioError::StreamFehler(e.to_string()))?
        }
        _ => {
            return Err(AudioError::StreamFehler(format!(
                "Nicht unterstuetztes Sample-Format: {:?}",
                sample_format
            )))
        }
    };

    stream
        .play()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    debug!(sample_rate = config.sample_rate, "Playback-Stream geoeffnet");

    Ok(PlaybackStream {
        _stream: stream,
        config,
    })
}
