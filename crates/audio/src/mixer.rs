//! Mischer fuer alle Peer-Graphen
//!
//! Der Medien-Transport speist dekodierte Mono-Samples je Peer ein
//! (`einspeisen`), der Ausgabe-Callback holt gemischte Stereo-Frames ab
//! (`mischen`). Jeder Peer hat einen eigenen Ring-Buffer als Jitter-Puffer.

use std::collections::HashMap;
use std::sync::Arc;

use crewtalk_core::PeerId;
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::HeapRb;
use tracing::{debug, trace};

use crate::dsp::STEREO;
use crate::graph::PeerAudioGraph;

/// Jitter-Puffer je Peer (200 ms bei 48 kHz)
pub const EINGANG_KAPAZITAET: usize = 48_000 / 5;

struct MixerKanal {
    graph: PeerAudioGraph,
    eingang: HeapRb<f32>,
}

/// Summiert alle Peers und begrenzt weich
pub struct PeerMixer {
    kanaele: HashMap<PeerId, MixerKanal>,
    mono: Vec<f32>,
}

/// Zwischen Kontroll- und Audio-Thread geteilter Mischer
pub type SharedMixer = Arc<Mutex<PeerMixer>>;

impl PeerMixer {
    pub fn new() -> Self {
        Self {
            kanaele: HashMap::new(),
            mono: Vec::new(),
        }
    }

    pub fn geteilt() -> SharedMixer {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Haengt einen Peer-Graphen ein; ein vorhandener wird vorher geloest
    pub fn anschliessen(&mut self, graph: PeerAudioGraph) {
        let peer_id = graph.peer_id().clone();
        self.trennen(&peer_id);
        debug!(peer = %peer_id, "Peer in Mischer eingehaengt");
        self.kanaele.insert(
            peer_id,
            MixerKanal {
                graph,
                eingang: HeapRb::new(EINGANG_KAPAZITAET),
            },
        );
    }

    /// Entfernt und loest den Graphen eines Peers
    pub fn trennen(&mut self, peer_id: &PeerId) -> bool {
        match self.kanaele.remove(peer_id) {
            Some(mut kanal) => {
                kanal.graph.trennen();
                true
            }
            None => false,
        }
    }

    pub fn ist_angeschlossen(&self, peer_id: &PeerId) -> bool {
        self.kanaele.contains_key(peer_id)
    }

    pub fn anzahl(&self) -> usize {
        self.kanaele.len()
    }

    /// Nimmt Samples eines Peers entgegen; liefert die Anzahl uebernommener
    pub fn einspeisen(&mut self, peer_id: &PeerId, mono: &[f32]) -> usize {
        let Some(kanal) = self.kanaele.get_mut(peer_id) else {
            trace!(peer = %peer_id, "Samples fuer unbekannten Peer verworfen");
            return 0;
        };
        let geschrieben = kanal.eingang.push_slice(mono);
        if geschrieben < mono.len() {
            trace!(
                peer = %peer_id,
                verworfen = mono.len() - geschrieben,
                "Jitter-Puffer voll"
            );
        }
        geschrieben
    }

    /// Fuellt `ausgabe` (interleaved Stereo) mit der Summe aller Peers
    pub fn mischen(&mut self, ausgabe: &mut [f32]) {
        ausgabe.fill(0.0);
        let frames = ausgabe.len() / STEREO;

        for kanal in self.kanaele.values_mut() {
            if kanal.eingang.is_empty() {
                continue;
            }
            self.mono.clear();
            self.mono.resize(frames, 0.0);
            // Fehlende Samples bleiben Stille
            kanal.eingang.pop_slice(&mut self.mono);

            let stereo = kanal.graph.verarbeiten(&self.mono);
            for (out, s) in ausgabe.iter_mut().zip(stereo.iter()) {
                *out += s;
            }
        }

        // Viele gleichzeitige Sprecher duerfen nicht clippen
        for s in ausgabe.iter_mut() {
            *s = soft_clip(*s);
        }
    }
}

impl Default for PeerMixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanfter Clipper (tanh-basiert)
fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AudioChannelHandle, PeerGraphConfig};
    use crate::spatial::{AudioParams, MuffleFilter, Position};

    fn graph(peer: &str, gain: f32) -> (PeerAudioGraph, AudioChannelHandle) {
        let handle = AudioChannelHandle::new(PeerId::neu(peer));
        handle.setzen(AudioParams {
            gain,
            position: Position::URSPRUNG,
            muffle: MuffleFilter::OFFEN,
            reverb_send: 0.0,
        });
        (
            PeerAudioGraph::bauen(handle.clone(), &PeerGraphConfig::default()),
            handle,
        )
    }

    #[test]
    fn anschliessen_und_trennen() {
        let mut mixer = PeerMixer::new();
        let (g, handle) = graph("a", 1.0);
        mixer.anschliessen(g);
        assert!(mixer.ist_angeschlossen(&PeerId::neu("a")));
        assert!(mixer.trennen(&PeerId::neu("a")));
        assert!(!handle.is_connected());
        assert_eq!(mixer.anzahl(), 0);
        assert!(!mixer.trennen(&PeerId::neu("a")));
    }

    #[test]
    fn erneutes_anschliessen_ersetzt() {
        let mut mixer = PeerMixer::new();
        let (g1, h1) = graph("a", 1.0);
        let (g2, h2) = graph("a", 1.0);
        mixer.anschliessen(g1);
        mixer.anschliessen(g2);
        assert_eq!(mixer.anzahl(), 1);
        assert!(!h1.is_connected());
        assert!(h2.is_connected());
    }

    #[test]
    fn einspeisen_unbekannter_peer() {
        let mut mixer = PeerMixer::new();
        assert_eq!(mixer.einspeisen(&PeerId::neu("x"), &[0.1; 10]), 0);
    }

    #[test]
    fn mischen_summiert_peers() {
        let mut mixer = PeerMixer::new();
        mixer.anschliessen(graph("a", 1.0).0);
        mixer.anschliessen(graph("b", 1.0).0);
        mixer.einspeisen(&PeerId::neu("a"), &[0.2; 480]);
        mixer.einspeisen(&PeerId::neu("b"), &[0.2; 480]);

        let mut out = vec![0.0f32; 960];
        mixer.mischen(&mut out);
        assert!(out.iter().skip(2).all(|s| *s > 0.0));
        assert!(out.iter().all(|s| *s <= 1.0));
    }

    #[test]
    fn ohne_eingang_stille() {
        let mut mixer = PeerMixer::new();
        mixer.anschliessen(graph("a", 1.0).0);
        let mut out = vec![0.5f32; 960];
        mixer.mischen(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn soft_clip_begrenzt() {
        assert!(soft_clip(100.0) <= 1.0);
        assert!(soft_clip(-100.0) >= -1.0);
        assert!(soft_clip(0.0).abs() < f32::EPSILON);
    }
}
