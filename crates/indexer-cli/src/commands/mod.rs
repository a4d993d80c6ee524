pub mod broker;
pub mod consumer;
pub mod producer;

use indexer_bus::amqp::AmqpBus;
use indexer_chain::JsonRpcChainClient;
use indexer_config::IndexerConfig;
use indexer_store::postgres::PgStateStore;
use std::fmt;

/// Sentinel error carried through `anyhow` so `main` can map a clean
/// Ctrl+C/SIGTERM shutdown to exit code 130 instead of 1.
#[derive(Debug)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interrupted")
    }
}

impl std::error::Error for Interrupted {}

pub fn is_interrupt(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Interrupted>().is_some()
}

pub async fn connect_chain(config: &IndexerConfig) -> anyhow::Result<JsonRpcChainClient> {
    Ok(JsonRpcChainClient::new(
        config.chain.rpc_url.clone(),
        config.chain.confirmations,
    ))
}

pub async fn connect_store(config: &IndexerConfig) -> anyhow::Result<PgStateStore> {
    let store = PgStateStore::connect(&config.store.db_url).await?;
    store.migrate().await?;
    Ok(store)
}

pub async fn connect_bus(config: &IndexerConfig) -> anyhow::Result<AmqpBus> {
    let bus = AmqpBus::connect(&config.bus.amqp_uri(), config.bus.prefetch_count).await?;
    Ok(bus)
}
