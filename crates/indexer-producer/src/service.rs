use crate::reorg::compute_rollback_range;
use crate::{ProducerError, ProducerResult};
use chrono::Utc;
use indexer_bus::{routing::RoutingKey, MessageBus};
use indexer_chain::ChainClient;
use indexer_config::ChainConfig;
use indexer_store::StateStore;
use indexer_types::{EventEnvelope, EventEnvelopeWithMeta, Message, RollbackEnvelope, RollbackEnvelopeWithMeta};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct SyncStatus {
    pub last_block: u64,
    pub tip: u64,
    pub lag: u64,
}

pub struct ProducerService {
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn StateStore>,
    bus: Arc<dyn MessageBus>,
    config: ChainConfig,
    reconciliation_interval: Duration,
}

impl ProducerService {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn StateStore>,
        bus: Arc<dyn MessageBus>,
        config: ChainConfig,
        reconciliation_interval: Duration,
    ) -> Self {
        Self {
            chain,
            store,
            bus,
            config,
            reconciliation_interval,
        }
    }

    /// The single-threaded cooperative polling loop. Runs until
    /// `shutdown` is cancelled; the in-flight batch either completes and
    /// advances the cursor or is abandoned before any publish.
    pub async fn run(&self, shutdown: CancellationToken) -> ProducerResult<()> {
        self.ensure_chain_registered().await?;
        let mut last_reconciliation = tokio::time::Instant::now();

        loop {
            if shutdown.is_cancelled() {
                info!("shutdown requested, stopping producer loop");
                return Ok(());
            }

            if let Err(err) = self.poll_once().await {
                error!(error = %err, "poll iteration failed");
                if matches!(err, ProducerError::UnrecoverableReorg { .. }) {
                    return Err(err);
                }
            }

            if last_reconciliation.elapsed() >= self.reconciliation_interval {
                if let Err(err) = self.publish_reconciliation_tick().await {
                    warn!(error = %err, "failed to publish reconciliation tick");
                }
                last_reconciliation = tokio::time::Instant::now();
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.cancelled() => {
                    info!("shutdown requested during sleep");
                    return Ok(());
                }
            }
        }
    }

    async fn ensure_chain_registered(&self) -> ProducerResult<()> {
        let mut uow = self.store.begin().await?;
        uow.ensure_chain_exists(self.config.chain_id, "default").await?;
        uow.commit().await?;
        Ok(())
    }

    /// One iteration: reorg check, then index up to the confirmed tip.
    pub async fn poll_once(&self) -> ProducerResult<()> {
        self.check_and_handle_reorg().await?;

        let cursor = self.current_cursor().await?;
        let target = self.chain.latest_confirmed_block().await?;
        if target <= cursor.last_block {
            return Ok(());
        }

        let from = cursor.last_block + 1;
        self.index_range(from, target).await
    }

    /// Indexes `[from, to]` in `block_batch_size` chunks, publishing every
    /// decoded event before advancing the cursor for that chunk.
    pub async fn index_range(&self, from: u64, to: u64) -> ProducerResult<()> {
        let mut cursor = from;
        while cursor <= to {
            let batch_end = (cursor + self.config.block_batch_size - 1).min(to);
            self.index_batch(cursor, batch_end).await?;
            cursor = batch_end + 1;
        }
        Ok(())
    }

    async fn index_batch(&self, from: u64, to: u64) -> ProducerResult<()> {
        let started = std::time::Instant::now();
        // Unfiltered by address: scan the whole range for all four known
        // topic0 hashes at once, so a CampaignCreated and a donation into
        // that same campaign in the same batch are both seen together.
        let logs = self.chain.get_logs(None, from, to, None).await?;

        let mut decoded = Vec::new();
        for log in &logs {
            match indexer_codec::decode_log(log)? {
                Some(event) => decoded.push((log, event)),
                None => continue,
            }
        }
        decoded.sort_by_key(|(log, _)| (log.block_number, log.log_index));

        for (log, decoded_event) in &decoded {
            let timestamp = self.chain.block_timestamp(log.block_number).await?;
            let envelope = EventEnvelope {
                event_type: decoded_event.kind.as_str().to_string(),
                chain_id: self.config.chain_id,
                block_number: log.block_number,
                block_hash: hex32(&log.block_hash),
                tx_hash: hex32(&log.tx_hash),
                log_index: log.log_index,
                address: log.address.to_string(),
                timestamp,
                event_data: decoded_event.args.clone(),
            };
            let message = Message::Event(EventEnvelopeWithMeta {
                published_at: Utc::now(),
                event: envelope,
            });
            let routing_key = decoded_event.kind.routing_key();
            self.bus.publish(routing_key, &message).await?;
            indexer_telemetry::Metrics::global()
                .events_published_total
                .with_label_values(&[decoded_event.kind.as_str()])
                .inc();
        }

        let end_hash = self.chain.block_hash(to).await?;
        let mut uow = self.store.begin().await?;
        uow.advance_cursor(self.config.chain_id, to, &hex32(&end_hash)).await?;
        uow.commit().await?;
        let metrics = indexer_telemetry::Metrics::global();
        metrics.blocks_indexed_total.inc_by((to - from + 1) as f64);
        metrics
            .batch_index_duration_seconds
            .with_label_values(&[&self.config.chain_id.to_string()])
            .observe(started.elapsed().as_secs_f64());
        Ok(())
    }

    async fn current_cursor(&self) -> ProducerResult<indexer_types::SyncState> {
        let mut uow = self.store.begin().await?;
        let state = uow
            .get_sync_state(self.config.chain_id)
            .await?
            .unwrap_or_else(|| indexer_types::SyncState::genesis(self.config.chain_id));
        uow.commit().await?;
        Ok(state)
    }

    /// Checked only when the cursor sits exactly at the chain's current
    /// tip: if the hash we stored for that height no longer matches what
    /// the chain reports, a reorg happened.
    async fn check_and_handle_reorg(&self) -> ProducerResult<()> {
        let cursor = self.current_cursor().await?;
        let Some(stored_hash) = &cursor.last_block_hash else {
            return Ok(());
        };
        if cursor.last_block == 0 {
            return Ok(());
        }

        let current_hash = self.chain.block_hash(cursor.last_block).await?;
        if hex32(&current_hash) == *stored_hash {
            return Ok(());
        }

        warn!(block = cursor.last_block, "reorg detected");
        indexer_telemetry::Metrics::global().reorgs_detected_total.inc();
        if self.config.reorg_rollback_blocks == 0 {
            // A zero-width window can never make forward progress after a
            // rewind — this chain can't be recovered automatically.
            return Err(ProducerError::UnrecoverableReorg {
                window: self.config.reorg_rollback_blocks,
            });
        }
        let (from, to) = compute_rollback_range(cursor.last_block, self.config.reorg_rollback_blocks);

        let rollback = Message::Rollback(RollbackEnvelopeWithMeta {
            published_at: Utc::now(),
            rollback: RollbackEnvelope {
                chain_id: self.config.chain_id,
                from_block: from,
                to_block: to,
                reason: "reorg detected".to_string(),
            },
        });
        self.bus.publish(RoutingKey::Rollback.as_str(), &rollback).await?;

        let rewind_to = from.saturating_sub(1);
        let rewind_hash = if rewind_to == 0 {
            String::new()
        } else {
            hex32(&self.chain.block_hash(rewind_to).await?)
        };
        let mut uow = self.store.begin().await?;
        uow.rewind_cursor(self.config.chain_id, rewind_to, &rewind_hash).await?;
        uow.commit().await?;
        Ok(())
    }

    async fn publish_reconciliation_tick(&self) -> ProducerResult<()> {
        let message = Message::Reconciliation(indexer_types::ReconciliationEnvelopeWithMeta {
            published_at: Utc::now(),
            reconciliation: indexer_types::ReconciliationEnvelope {
                chain_id: self.config.chain_id,
                reconciliation_type: "mark_expired_campaigns".to_string(),
            },
        });
        self.bus.publish(RoutingKey::Reconciliation.as_str(), &message).await?;
        Ok(())
    }

    pub async fn backfill(&self, from: u64, to: u64) -> ProducerResult<()> {
        self.ensure_chain_registered().await?;
        info!(from, to, "starting backfill");
        self.index_range(from, to).await
    }

    pub async fn status(&self) -> ProducerResult<SyncStatus> {
        let cursor = self.current_cursor().await?;
        let tip = self.chain.latest_confirmed_block().await?;
        let lag = tip.saturating_sub(cursor.last_block);
        indexer_telemetry::Metrics::global().chain_lag_blocks.set(lag as f64);
        Ok(SyncStatus {
            last_block: cursor.last_block,
            tip,
            lag,
        })
    }
}

fn hex32(bytes: &[u8; 32]) -> String {
    let mut s = String::from("0x");
    for byte in bytes {
        s.push_str(&format!("{byte:02x}"));
    }
    s
}
