//! Prometheus-kompatible Metriken des Voice-Mesh
//!
//! Registrierte Metriken:
//! - `crewtalk_peers_active` – Gauge: Peer-Verbindungen (jeder Zustand)
//! - `crewtalk_audio_channels` – Gauge: Peers mit stehendem Audiograph
//! - `crewtalk_peer_reconnects_total` – Counter: automatische Neuverbindungen
//! - `crewtalk_peer_errors_total` – Counter: Peer-Fehler je Fehlercode (`code`)
//! - `crewtalk_lobby_joins_total` – Counter: gesendete Lobby-Joins

use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Metriken eines Clients; Klone teilen dieselbe Registry
#[derive(Clone)]
pub struct MeshMetrics {
    pub registry: Arc<Registry>,

    pub peers_active: IntGauge,
    pub audio_channels: IntGauge,
    pub peer_reconnects_total: IntCounter,
    pub peer_errors_total: IntCounterVec,
    pub lobby_joins_total: IntCounter,
}

impl MeshMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let peers_active = IntGauge::with_opts(Opts::new(
            "crewtalk_peers_active",
            "Anzahl bestehender Peer-Verbindungen",
        ))?;
        registry.register(Box::new(peers_active.clone()))?;

        let audio_channels = IntGauge::with_opts(Opts::new(
            "crewtalk_audio_channels",
            "Anzahl Peers mit aktivem Audiograph",
        ))?;
        registry.register(Box::new(audio_channels.clone()))?;

        let peer_reconnects_total = IntCounter::with_opts(Opts::new(
            "crewtalk_peer_reconnects_total",
            "Automatische Neuverbindungen nach voruebergehenden Fehlern",
        ))?;
        registry.register(Box::new(peer_reconnects_total.clone()))?;

        let peer_errors_total = IntCounterVec::new(
            Opts::new("crewtalk_peer_errors_total", "Peer-Fehler nach Fehlercode"),
            &["code"],
        )?;
        registry.register(Box::new(peer_errors_total.clone()))?;

        let lobby_joins_total = IntCounter::with_opts(Opts::new(
            "crewtalk_lobby_joins_total",
            "Gesendete Lobby-Joins",
        ))?;
        registry.register(Box::new(lobby_joins_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            peers_active,
            audio_channels,
            peer_reconnects_total,
            peer_errors_total,
            lobby_joins_total,
        })
    }

    /// Zaehlt einen Peer-Fehler
    pub fn peer_fehler(&self, code: &str) {
        self.peer_errors_total.with_label_values(&[code]).inc();
    }

    /// Setzt beide Gauges auf den aktuellen Stand
    pub fn bestand_setzen(&self, peers: usize, kanaele: usize) {
        self.peers_active.set(peers as i64);
        self.audio_channels.set(kanaele as i64);
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = MeshMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn zwei_instanzen_unabhaengig() {
        let a = MeshMetrics::neu().unwrap();
        let b = MeshMetrics::neu().unwrap();
        a.lobby_joins_total.inc();
        assert_eq!(a.lobby_joins_total.get(), 1);
        assert_eq!(b.lobby_joins_total.get(), 0);
    }

    #[test]
    fn fehler_nach_code() {
        let m = MeshMetrics::neu().unwrap();
        m.peer_fehler("ERR_DATA_CHANNEL");
        m.peer_fehler("ERR_DATA_CHANNEL");
        m.peer_fehler("ERR_SIGNALING");
        assert_eq!(
            m.peer_errors_total
                .with_label_values(&["ERR_DATA_CHANNEL"])
                .get(),
            2
        );
    }

    #[test]
    fn render_enthaelt_namen() {
        let m = MeshMetrics::neu().unwrap();
        m.bestand_setzen(3, 2);
        m.peer_reconnects_total.inc();
        let text = m.render().unwrap();
        assert!(text.contains("crewtalk_peers_active 3"));
        assert!(text.contains("crewtalk_audio_channels 2"));
        assert!(text.contains("crewtalk_peer_reconnects_total 1"));
    }
}
