//! Mikrofon-Capture via cpal
//!
//! Oeffnet einen cpal InputStream und schreibt Samples in einen
//! lock-free Ring-Buffer. Der Stream ist die einzige Mikrofonquelle; er
//! wird lesend an den Sendepfad aller Peers und an die lokale VAD verteilt.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crewtalk_core::Settings;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, error, info, warn};

use crate::device::load_cpal_input_device;
use crate::dsp::vad::{Vad, VadConfig};
use crate::dsp::AudioProcessor;
use crate::error::{AudioError, AudioResult};

/// Feste Aufnahme-Vorgaben fuer Sprache im Mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Abtastrate in Hz
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// 2 mit Raumklang, sonst 1
    pub channels: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    /// Geraetename (None = Systemstandard)
    pub device: Option<String>,
    /// Ring-Buffer Kapazitaet in Samples
    pub buffer_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            bits_per_sample: 16,
            channels: 2,
            echo_cancellation: false,
            noise_suppression: false,
            auto_gain_control: false,
            device: None,
            buffer_size: 48000 * 2,
        }
    }
}

impl CaptureConfig {
    /// Vorgaben gemaess Einstellungen
    pub fn fuer_settings(settings: &Settings) -> Self {
        Self {
            channels: if settings.spatial_audio { 2 } else { 1 },
            device: settings.mikrofon_name().map(str::to_string),
            ..Self::default()
        }
    }

    /// Samples pro 20-ms-Frame (alle Kanaele)
    pub fn frame_samples(&self) -> usize {
        self.sample_rate as usize / 50 * self.channels as usize
    }
}

/// Produziert Samples aus dem Mikrofon-Callback
pub type CaptureProducer = HeapProd<f32>;
/// Konsumiert Samples fuer die Verteilung
pub type CaptureConsumer = HeapCons<f32>;

/// Audio-Capture-Stream
///
/// Haelt den cpal-Stream am Leben. Wird der CaptureStream gedroppt,
/// stoppt die Aufnahme automatisch.
pub struct CaptureStream {
    _stream: Stream,
    config: CaptureConfig,
}

impl CaptureStream {
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

/// Oeffnet das Mikrofon gemaess Einstellungen
///
/// Ein Fehler hier beendet die Voice-Funktion fuer die Sitzung; es gibt
/// keinen automatischen Neuversuch.
pub fn mikrofon_oeffnen(settings: &Settings) -> AudioResult<(CaptureStream, CaptureConsumer)> {
    let config = CaptureConfig::fuer_settings(settings);
    let device = load_cpal_input_device(config.device.as_deref())?;
    let ergebnis = open_capture_stream(&device, config);
    match &ergebnis {
        Ok((stream, _)) => info!(
            channels = stream.config().channels,
            device = stream.config().device.as_deref().unwrap_or("default"),
            "Mikrofon geoeffnet"
        ),
        Err(e) => error!(fehler = %e, "Mikrofon konnte nicht geoeffnet werden"),
    }
    ergebnis
}

/// Oeffnet einen Capture-Stream auf dem gegebenen Geraet.
///
/// Gibt den Stream und den Ring-Buffer Consumer zurueck.
/// Der Producer laeuft im cpal-Callback-Thread.
pub fn open_capture_stream(
    device: &Device,
    config: CaptureConfig,
) -> AudioResult<(CaptureStream, CaptureConsumer)> {
    let stream_config = StreamConfig {
        channels: config.channels,
        sample_rate: config.sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let rb = HeapRb::<f32>::new(config.buffer_size);
    let (mut producer, consumer) = rb.split();

    let err_fn = |err| error!("Capture-Fehler: {}", err);

    // 16 Bit bevorzugen, sonst was das Geraet anbietet
    let passende: Vec<_> = device
        .supported_input_configs()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?
        .filter(|c| {
            c.min_sample_rate() <= config.sample_rate
                && c.max_sample_rate() >= config.sample_rate
                && c.channels() >= config.channels
        })
        .collect();
    let sample_format = passende
        .iter()
        .find(|c| c.sample_format() == SampleFormat::I16)
        .or_else(|| passende.first())
        .map(|c| c.sample_format())
        .unwrap_or(SampleFormat::F32);

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    let floats: Vec<f32> =
                        data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                    let written = producer.push_slice(&floats);
                    if written < floats.len() {
                        warn!("Capture Ring-Buffer voll");
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        SampleFormat::F32 => device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    let written = producer.push_slice(data);
                    if written < data.len() {
                        warn!(
                            "Capture Ring-Buffer voll, {} Samples verworfen",
                            data.len() - written
                        );
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
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

    debug!(
        "Capture-Stream geoeffnet: {}Hz {}ch",
        config.sample_rate, config.channels
    );

    Ok((
        CaptureStream {
            _stream: stream,
            config,
        },
        consumer,
    ))
}

// ---------------------------------------------------------------------------
// Lokale Verteilung
// ---------------------------------------------------------------------------

/// Zieht Mikrofon-Frames aus dem Ring-Buffer, verteilt sie an den
/// Sendepfad und erkennt ob der lokale Spieler spricht
pub struct LocalVoice {
    consumer: CaptureConsumer,
    vad: Vad,
    frame: Vec<f32>,
}

impl LocalVoice {
    pub fn new(consumer: CaptureConsumer, config: &CaptureConfig, vad: VadConfig) -> Self {
        Self {
            consumer,
            vad: Vad::new(vad),
            frame: vec![0.0; config.frame_samples()],
        }
    }

    /// Verarbeitet alle vollstaendigen Frames.
    ///
    /// Ist das Mikrofon nicht freigegeben, wird nichts gesendet und der
    /// lokale Spieler gilt als still. Liefert den Sprechzustand falls er
    /// sich geaendert hat.
    pub fn verarbeiten(
        &mut self,
        transmitting: bool,
        mut senden: impl FnMut(&[f32]),
    ) -> Option<bool> {
        let mut aenderung = None;
        while self.consumer.occupied_len() >= self.frame.len() {
            self.consumer.pop_slice(&mut self.frame);
            let vorher = self.vad.is_voice_active();
            let jetzt = if transmitting {
                senden(&self.frame);
                self.vad.detect(&self.frame)
            } else {
                self.vad.reset();
                false
            };
            if jetzt != vorher {
                aenderung = Some(jetzt);
            }
        }
        aenderung
    }
}
