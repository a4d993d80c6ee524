//! # Telemetry
//!
//! Logging and metrics for the indexer binary: a `tracing-subscriber`
//! filter driven by `LOG_LEVEL`, and a Prometheus registry covering the
//! producer and consumer's operational counters. No distributed tracing or
//! log shipping — this system runs as two long-lived processes behind a
//! broker and a database, not a service mesh, so a local metrics scrape and
//! stdout logs cover it.

mod error;
mod logging;
mod metrics;

pub use error::TelemetryError;
pub use logging::init_logging;
pub use metrics::Metrics;
