//! Prometheus metrics registry. Every counter/gauge/histogram the producer
//! and consumer crates touch lives on [`Metrics`], a process-wide singleton
//! built once via [`Metrics::global`] and exposed as Prometheus text format
//! by `indexer-cli`'s `broker metrics` command.

use crate::TelemetryError;
use prometheus::{Counter, CounterVec, Encoder, Gauge, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub struct Metrics {
    pub registry: Registry,
    pub blocks_indexed_total: Counter,
    pub events_published_total: CounterVec,
    pub reorgs_detected_total: Counter,
    pub events_consumed_total: CounterVec,
    pub rpc_retries_total: Counter,
    pub chain_lag_blocks: Gauge,
    pub batch_index_duration_seconds: HistogramVec,
}

impl Metrics {
    fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let blocks_indexed_total = Counter::new(
            "indexer_blocks_indexed_total",
            "Total blocks whose logs have been fetched and published",
        )
        .map_err(prometheus_err)?;

        let events_published_total = CounterVec::new(
            Opts::new("indexer_events_published_total", "Events published to the bus"),
            &["event_type"],
        )
        .map_err(prometheus_err)?;

        let reorgs_detected_total = Counter::new(
            "indexer_reorgs_detected_total",
            "Chain reorganizations detected by the producer",
        )
        .map_err(prometheus_err)?;

        let events_consumed_total = CounterVec::new(
            Opts::new("indexer_events_consumed_total", "Consumed messages by terminal outcome"),
            &["outcome"], // ack | nack_requeue | reject_dlq
        )
        .map_err(prometheus_err)?;

        let rpc_retries_total = Counter::new(
            "indexer_rpc_retries_total",
            "Transient JSON-RPC call retries",
        )
        .map_err(prometheus_err)?;

        let chain_lag_blocks = Gauge::new(
            "indexer_chain_lag_blocks",
            "Blocks between the confirmed chain tip and the producer's cursor",
        )
        .map_err(prometheus_err)?;

        let batch_index_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "indexer_batch_index_duration_seconds",
                "Time spent fetching, decoding and publishing one block batch",
            ),
            &["chain_id"],
        )
        .map_err(prometheus_err)?;

        registry.register(Box::new(blocks_indexed_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(events_published_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(reorgs_detected_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(events_consumed_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(rpc_retries_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(chain_lag_blocks.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(batch_index_duration_seconds.clone())).map_err(prometheus_err)?;

        Ok(Self {
            registry,
            blocks_indexed_total,
            events_published_total,
            reorgs_detected_total,
            events_consumed_total,
            rpc_retries_total,
            chain_lag_blocks,
            batch_index_duration_seconds,
        })
    }

    /// Builds the registry on first call; every later call returns the same
    /// instance. Panics if registration fails — that only happens on a
    /// duplicate metric name, a programming error caught long before
    /// production.
    pub fn global() -> &'static Metrics {
        static METRICS: OnceLock<Metrics> = OnceLock::new();
        METRICS.get_or_init(|| Metrics::new().expect("metric registration is infallible at this name set"))
    }

    pub fn encode(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer).map_err(prometheus_err)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

fn prometheus_err(e: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsInit(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_is_idempotent_and_encodes() {
        let a = Metrics::global();
        let b = Metrics::global();
        assert!(std::ptr::eq(a, b));

        a.blocks_indexed_total.inc();
        a.events_published_total.with_label_values(&["DonationReceived"]).inc();
        let text = a.encode().unwrap();
        assert!(text.contains("indexer_blocks_indexed_total"));
    }
}
