//! Anwendungskontext
//!
//! Wird beim Start einmal gebaut und explizit an die Komponenten gereicht,
//! die das Overlay erreichen oder Metriken fortschreiben muessen.

use crewtalk_core::{OverlayEvent, OverlaySink, Settings};
use crewtalk_observability::MeshMetrics;
use tokio::sync::mpsc;
use tracing::trace;

use crate::config::ClientConfig;

/// Overlay-Sink ueber einen tokio-Kanal zum Renderer
#[derive(Debug, Clone)]
pub struct OverlayKanal {
    tx: mpsc::UnboundedSender<OverlayEvent>,
}

impl OverlayKanal {
    pub fn neu() -> (Self, mpsc::UnboundedReceiver<OverlayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OverlaySink for OverlayKanal {
    fn senden(&mut self, event: OverlayEvent) {
        if self.tx.send(event).is_err() {
            trace!("Overlay geschlossen, Ereignis verworfen");
        }
    }
}

/// Gemeinsamer Kontext einer Client-Sitzung
#[derive(Clone)]
pub struct AppContext {
    pub overlay: OverlayKanal,
    pub metrics: MeshMetrics,
    pub settings: Settings,
}

impl AppContext {
    /// Baut den Kontext; der Empfaenger gehoert dem Overlay-Renderer
    pub fn neu(config: &ClientConfig) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<OverlayEvent>)> {
        let (overlay, rx) = OverlayKanal::neu();
        let metrics = MeshMetrics::neu()?;
        Ok((
            Self {
                overlay,
                metrics,
                settings: config.settings.clone(),
            },
            rx,
        ))
    }
}
