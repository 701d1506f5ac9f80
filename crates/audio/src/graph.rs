//! Peer-Audiograph
//!
//! Pro Peer mit stehender Audio-Verbindung wird eine feste Kette gebaut:
//!
//! ```text
//! Quelle (mono) -> Panner -> Tiefpass -> Gain -> [Hall] -> Limiter -> Ausgabe
//!                                                            |
//!                                                           VAD
//! ```
//!
//! Die Kette besitzt keinen Spielzustand. Die Parameter kommen ueber einen
//! geteilten `AudioChannelHandle`, den die Raumklang-Regeln in-place
//! aktualisieren; der Graph liest ihn einmal pro Block.

use std::sync::Arc;

use crewtalk_core::PeerId;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::dsp::biquad::LowPassFilter;
use crate::dsp::gain::GainStage;
use crate::dsp::limiter::{Limiter, LimiterConfig};
use crate::dsp::panner::StereoPanner;
use crate::dsp::reverb::Reverb;
use crate::dsp::vad::{Vad, VadConfig};
use crate::dsp::AudioProcessor;
use crate::spatial::{AudioParams, MuffleFilter};

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct KanalZustand {
    params: AudioParams,
    connected: bool,
}

/// Veraenderbare Parameter eines Peer-Kanals
///
/// Klonbar; alle Klone zeigen auf denselben Zustand. Der Kontroll-Thread
/// schreibt, der Audio-Thread liest.
#[derive(Debug, Clone)]
pub struct AudioChannelHandle {
    peer_id: PeerId,
    inner: Arc<Mutex<KanalZustand>>,
}

impl AudioChannelHandle {
    /// Neuer, stummer und noch nicht verbundener Kanal
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            inner: Arc::new(Mutex::new(KanalZustand {
                params: AudioParams::stumm(),
                connected: false,
            })),
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Uebernimmt frisch berechnete Parameter (ersetzt, akkumuliert nie)
    pub fn setzen(&self, params: AudioParams) {
        self.inner.lock().params = params;
    }

    pub fn params(&self) -> AudioParams {
        self.inner.lock().params
    }

    pub fn gain(&self) -> f32 {
        self.inner.lock().params.gain
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.lock().connected = connected;
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Meldet "Peer spricht hoerbar" (nur bei Wechsel)
pub type TalkingCallback = Box<dyn FnMut(bool) + Send>;

/// Bau-Parameter fuer einen Peer-Graphen
#[derive(Debug, Clone)]
pub struct PeerGraphConfig {
    pub sample_rate: u32,
    /// Hall-Zweig nur wenn Haunting aktiv ist
    pub haunting: bool,
    pub vad: VadConfig,
}

impl Default for PeerGraphConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            haunting: false,
            vad: VadConfig::default(),
        }
    }
}

/// Verarbeitungskette eines Peers
pub struct PeerAudioGraph {
    handle: AudioChannelHandle,
    panner: StereoPanner,
    filter: LowPassFilter,
    gain: GainStage,
    reverb: Option<Reverb>,
    limiter: Limiter,
    vad: Vad,
    spricht: bool,
    on_talking: Option<TalkingCallback>,
    stereo: Vec<f32>,
}

impl PeerAudioGraph {
    /// Baut die Kette und markiert den Kanal als verbunden
    pub fn bauen(handle: AudioChannelHandle, config: &PeerGraphConfig) -> Self {
        let offen = MuffleFilter::OFFEN;
        let reverb = config.haunting.then(|| Reverb::new(config.sample_rate));
        debug!(
            peer = %handle.peer_id(),
            reverb = reverb.is_some(),
            "Peer-Audiograph gebaut"
        );
        handle.set_connected(true);

        Self {
            handle,
            panner: StereoPanner::new(),
            filter: LowPassFilter::new(config.sample_rate, offen.cutoff_hz, offen.q),
            gain: GainStage::new(0.0),
            reverb,
            limiter: Limiter::new(LimiterConfig::default()),
            vad: Vad::new(config.vad.clone()),
            spricht: false,
            on_talking: None,
            stereo: Vec::new(),
        }
    }

    /// Registriert den Empfaenger fuer Sprech-Wechsel
    pub fn mit_talking_callback(mut self, callback: TalkingCallback) -> Self {
        self.on_talking = Some(callback);
        self
    }

    pub fn handle(&self) -> &AudioChannelHandle {
        &self.handle
    }

    pub fn peer_id(&self) -> &PeerId {
        self.handle.peer_id()
    }

    pub fn hat_reverb(&self) -> bool {
        self.reverb.is_some()
    }

    /// Reihenfolge der Knoten (fuer Diagnose)
    pub fn knoten(&self) -> Vec<&'static str> {
        let mut k = vec!["quelle", "panner", "tiefpass", "gain"];
        if self.reverb.is_some() {
            k.push("hall");
        }
        k.extend(["limiter", "ausgabe"]);
        k
    }

    pub fn spricht(&self) -> bool {
        self.spricht
    }

    /// Verarbeitet einen Mono-Block und gibt interleaved Stereo zurueck
    pub fn verarbeiten(&mut self, mono: &[f32]) -> &[f32] {
        let params = self.handle.params();

        self.panner.set_position(params.position.x, params.position.y);
        self.panner.verarbeiten(mono, &mut self.stereo);

        self.filter.set_params(params.muffle.cutoff_hz, params.muffle.q);
        self.filter.process(&mut self.stereo);

        self.gain.set_gain(params.gain);
        self.gain.process(&mut self.stereo);

        if let Some(reverb) = self.reverb.as_mut() {
            reverb.set_send(params.reverb_send);
            reverb.process(&mut self.stereo);
        }

        self.limiter.process(&mut self.stereo);

        // Abgriff hinter dem Limiter; stumme Peers sprechen nie hoerbar
        let aktiv = self.vad.detect(&self.stereo);
        self.talking_setzen(aktiv && params.ist_hoerbar());

        &self.stereo
    }

    fn talking_setzen(&mut self, spricht: bool) {
        if spricht == self.spricht {
            return;
        }
        self.spricht = spricht;
        trace!(peer = %self.handle.peer_id(), spricht, "Sprechzustand geaendert");
        if let Some(cb) = self.on_talking.as_mut() {
            cb(spricht);
        }
    }

    /// Loest den Graphen: Zustand verwerfen, Kanal als getrennt markieren
    pub fn trennen(&mut self) {
        self.talking_setzen(false);
        self.filter.reset();
        self.gain.reset();
        if let Some(reverb) = self.reverb.as_mut() {
            reverb.reset();
        }
        self.limiter.reset();
        self.vad.reset();
        self.stereo.clear();
        self.handle.set_connected(false);
        debug!(peer = %self.handle.peer_id(), "Peer-Audiograph geloest");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Position;
    use std::sync::mpsc;

    fn sprache(frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 200.0 * i as f32 / 48000.0).sin())
            .collect()
    }

    fn hoerbar() -> AudioParams {
        AudioParams {
            gain: 1.0,
            position: Position::URSPRUNG,
            muffle: MuffleFilter::OFFEN,
            reverb_send: 0.0,
        }
    }

    fn schnelle_vad() -> PeerGraphConfig {
        PeerGraphConfig {
            vad: VadConfig {
                smoothing: 0.0,
                hangover_frames: 0,
                ..VadConfig::default()
            },
            ..PeerGraphConfig::default()
        }
    }

    #[test]
    fn bauen_markiert_verbunden() {
        let handle = AudioChannelHandle::new(PeerId::neu("a"));
        assert!(!handle.is_connected());
        let _graph = PeerAudioGraph::bauen(handle.clone(), &PeerGraphConfig::default());
        assert!(handle.is_connected());
    }

    #[test]
    fn knotenreihenfolge_ohne_hall() {
        let graph = PeerAudioGraph::bauen(
            AudioChannelHandle::new(PeerId::neu("a")),
            &PeerGraphConfig::default(),
        );
        assert_eq!(
            graph.knoten(),
            vec!["quelle", "panner", "tiefpass", "gain", "limiter", "ausgabe"]
        );
        assert!(!graph.hat_reverb());
    }

    #[test]
    fn hall_nur_mit_haunting() {
        let config = PeerGraphConfig {
            haunting: true,
            ..PeerGraphConfig::default()
        };
        let graph = PeerAudioGraph::bauen(AudioChannelHandle::new(PeerId::neu("a")), &config);
        assert!(graph.hat_reverb());
        assert_eq!(graph.knoten()[4], "hall");
    }

    #[test]
    fn stummer_kanal_gibt_stille() {
        let handle = AudioChannelHandle::new(PeerId::neu("a"));
        let mut graph = PeerAudioGraph::bauen(handle, &PeerGraphConfig::default());
        let out = graph.verarbeiten(&sprache(960));
        assert_eq!(out.len(), 1920);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn talking_nur_wenn_hoerbar() {
        let handle = AudioChannelHandle::new(PeerId::neu("a"));
        let (tx, rx) = mpsc::channel();
        let mut graph = PeerAudioGraph::bauen(handle.clone(), &schnelle_vad())
            .mit_talking_callback(Box::new(move |s| {
                let _ = tx.send(s);
            }));

        // Gain 0: trotz Sprache kein "spricht"
        graph.verarbeiten(&sprache(960));
        assert!(!graph.spricht());

        handle.setzen(hoerbar());
        for _ in 0..20 {
            graph.verarbeiten(&sprache(960));
        }
        assert!(graph.spricht());
        assert_eq!(rx.try_recv(), Ok(true));

        handle.setzen(AudioParams::stumm());
        graph.verarbeiten(&sprache(960));
        assert!(!graph.spricht());
        assert_eq!(rx.try_recv(), Ok(false));
    }

    #[test]
    fn trennen_setzt_verbunden_zurueck() {
        let handle = AudioChannelHandle::new(PeerId::neu("a"));
        let mut graph = PeerAudioGraph::bauen(handle.clone(), &schnelle_vad());
        handle.setzen(hoerbar());
        for _ in 0..20 {
            graph.verarbeiten(&sprache(960));
        }
        graph.trennen();
        assert!(!handle.is_connected());
        assert!(!graph.spricht());
    }

    #[test]
    fn handle_ersetzt_parameter() {
        let handle = AudioChannelHandle::new(PeerId::neu("a"));
        handle.setzen(hoerbar());
        handle.setzen(AudioParams {
            gain: 0.3,
            ..hoerbar()
        });
        assert_eq!(handle.gain(), 0.3);
    }
}
