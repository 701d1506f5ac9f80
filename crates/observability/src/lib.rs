//! # crewtalk-observability
//!
//! Observability-Crate fuer crewtalk:
//! - Structured Logging via tracing-subscriber (Text oder JSON)
//! - Prometheus-Metriken des Voice-Mesh (nur Textexport, kein HTTP-Endpunkt)

pub mod logging;
pub mod metrics;

pub use logging::logging_initialisieren;
pub use metrics::MeshMetrics;
