use crate::dispatch::{process_message, Verdict};
use crate::{ConsumerError, ConsumerResult};
use indexer_bus::Consumer;
use indexer_store::StateStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Drives one consumer handle to exhaustion (or cancellation): pull a
/// delivery, parse it, dispatch it against the store, then ack/nack/reject
/// per the failure policy. One worker owns exactly one bus channel and is
/// driven on its own task — workers share no state beyond `store`, which is
/// itself a connection-pooled adapter safe to clone across tasks.
pub async fn run_worker(
    name: &str,
    mut consumer: Box<dyn Consumer>,
    store: Arc<dyn StateStore>,
    max_retries: u32,
    shutdown: CancellationToken,
) -> ConsumerResult<()> {
    info!(worker = name, "consumer worker started");
    loop {
        let delivery = tokio::select! {
            delivery = consumer.next_delivery() => delivery?,
            _ = shutdown.cancelled() => {
                info!(worker = name, "shutdown requested, stopping worker");
                return Ok(());
            }
        };

        let retry_count = delivery.retry_count;
        let message = match &delivery.message {
            Ok(message) => message.clone(),
            Err(parse_error) => {
                warn!(worker = name, error = %parse_error, "unparseable delivery, routing to DLQ");
                delivery.reject_to_dlq().await?;
                continue;
            }
        };

        let verdict = process_message(&store, &message).await;
        let events_consumed_total = &indexer_telemetry::Metrics::global().events_consumed_total;
        match verdict {
            Verdict::Ack => {
                events_consumed_total.with_label_values(&["ack"]).inc();
                delivery.ack().await?
            }
            Verdict::RejectToDlq => {
                events_consumed_total.with_label_values(&["reject_dlq"]).inc();
                delivery.reject_to_dlq().await?
            }
            Verdict::NackRequeue => {
                if retry_count + 1 >= max_retries {
                    warn!(worker = name, retry_count, max_retries, "max retries exceeded, routing to DLQ");
                    events_consumed_total.with_label_values(&["reject_dlq"]).inc();
                    delivery.reject_to_dlq().await?;
                } else {
                    events_consumed_total.with_label_values(&["nack_requeue"]).inc();
                    delivery.nack_requeue().await?;
                }
            }
            Verdict::Fatal(reason) => {
                error!(worker = name, error = %reason, "fatal misconfiguration, halting worker pool");
                events_consumed_total.with_label_values(&["fatal"]).inc();
                delivery.nack_requeue().await?;
                shutdown.cancel();
                return Err(ConsumerError::Fatal(reason));
            }
        }
    }
}

/// Spawns `worker_count` tasks, one per element of `consumers`, returning
/// their join handles so the caller (the CLI's `consumer run` command) can
/// await them all at shutdown.
pub fn spawn_workers(
    consumers: Vec<(String, Box<dyn Consumer>)>,
    store: Arc<dyn StateStore>,
    max_retries: u32,
    shutdown: CancellationToken,
) -> Vec<tokio::task::JoinHandle<ConsumerResult<()>>> {
    consumers
        .into_iter()
        .map(|(name, consumer)| {
            let store = store.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let result = run_worker(&name, consumer, store, max_retries, shutdown).await;
                if let Err(err) = &result {
                    error!(worker = name, error = %err, "worker exited with error");
                }
                result
            })
        })
        .collect()
}
