//! # Chain Client
//!
//! The `ChainClient` port abstracts Ethereum-style JSON-RPC access: the
//! confirmed tip, a block's hash, its timestamp, and topic-filtered logs
//! over a block range. The `JsonRpcChainClient` adapter implements it over
//! `reqwest`, retrying transient transport errors with exponential backoff
//! while letting application errors (bad range, malformed response)
//! surface immediately.

mod error;
mod retry;
mod rpc;

pub use error::ChainError;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use indexer_types::{Address, Log};
use std::time::Duration;
use tracing::{debug, warn};

pub type ChainResult<T> = Result<T, ChainError>;

/// Driving port for chain access. Every method is transport-agnostic; the
/// `JsonRpcChainClient` is the only adapter shipped, but producer code
/// depends only on this trait so a future WebSocket or local-node adapter
/// can be swapped in without touching the polling loop.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The chain tip minus the configured confirmation depth, floored at 0.
    async fn latest_confirmed_block(&self) -> ChainResult<u64>;

    /// The canonical hash of block `number`.
    async fn block_hash(&self, number: u64) -> ChainResult<[u8; 32]>;

    /// The block's Unix timestamp, used to stamp decoded events since logs
    /// themselves carry no wall-clock time.
    async fn block_timestamp(&self, number: u64) -> ChainResult<i64>;

    /// Logs in `[from, to]` inclusive, optionally restricted to a single
    /// address; topic0 filtering happens server-side when `topic0` is set.
    async fn get_logs(
        &self,
        address: Option<Address>,
        from: u64,
        to: u64,
        topic0: Option<[u8; 32]>,
    ) -> ChainResult<Vec<Log>>;
}

/// JSON-RPC adapter over `reqwest`, speaking `eth_blockNumber`,
/// `eth_getBlockByNumber`, and `eth_getLogs`.
pub struct JsonRpcChainClient {
    http: reqwest::Client,
    url: String,
    confirmations: u64,
    retry: RetryPolicy,
}

impl JsonRpcChainClient {
    pub fn new(url: String, confirmations: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            confirmations,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn call_with_retry<T, F, Fut>(&self, method: &str, f: F) -> ChainResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ChainResult<T>>,
    {
        let mut delay = self.retry.base_delay;
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    attempt += 1;
                    indexer_telemetry::Metrics::global().rpc_retries_total.inc();
                    warn!(
                        method,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient RPC error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.retry.max_delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn latest_confirmed_block(&self) -> ChainResult<u64> {
        let tip = self
            .call_with_retry("eth_blockNumber", || rpc::block_number(&self.http, &self.url))
            .await?;
        Ok(tip.saturating_sub(self.confirmations))
    }

    async fn block_hash(&self, number: u64) -> ChainResult<[u8; 32]> {
        let header = self
            .call_with_retry("eth_getBlockByNumber", || {
                rpc::block_by_number(&self.http, &self.url, number)
            })
            .await?;
        debug!(number, hash = %hex::encode(header.hash), "fetched block hash");
        Ok(header.hash)
    }

    async fn block_timestamp(&self, number: u64) -> ChainResult<i64> {
        let header = self
            .call_with_retry("eth_getBlockByNumber", || {
                rpc::block_by_number(&self.http, &self.url, number)
            })
            .await?;
        Ok(header.timestamp)
    }

    async fn get_logs(
        &self,
        address: Option<Address>,
        from: u64,
        to: u64,
        topic0: Option<[u8; 32]>,
    ) -> ChainResult<Vec<Log>> {
        if from > to {
            return Err(ChainError::InvalidRange { from, to });
        }
        self.call_with_retry("eth_getLogs", || {
            rpc::get_logs(&self.http, &self.url, address, from, to, topic0)
        })
        .await
    }
}

mod hex {
    pub fn encode(bytes: [u8; 32]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_depth_never_underflows() {
        let client = JsonRpcChainClient::new("http://localhost:8545".to_string(), 100);
        assert_eq!(client.confirmations, 100);
    }

    #[test]
    fn retry_policy_default_is_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.max_attempts <= 10);
        assert!(policy.max_delay <= Duration::from_secs(60));
    }
}
