use crate::cli::{BackfillArgs, ProducerCommand};
use crate::commands::{connect_bus, connect_chain, connect_store, Interrupted};
use indexer_bus::MessageBus;
use indexer_chain::ChainClient;
use indexer_config::IndexerConfig;
use indexer_producer::ProducerService;
use indexer_store::StateStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(cmd: ProducerCommand, config: &IndexerConfig) -> anyhow::Result<()> {
    match cmd {
        ProducerCommand::Run => run_loop(config).await,
        ProducerCommand::Backfill(args) => backfill(config, args).await,
        ProducerCommand::Status => status(config).await,
    }
}

async fn build_service(config: &IndexerConfig) -> anyhow::Result<ProducerService> {
    let chain: Arc<dyn ChainClient> = Arc::new(connect_chain(config).await?);
    let store: Arc<dyn StateStore> = Arc::new(connect_store(config).await?);
    let bus: Arc<dyn MessageBus> = Arc::new(connect_bus(config).await?);
    Ok(ProducerService::new(
        chain,
        store,
        bus,
        config.chain.clone(),
        config.reconciliation.interval,
    ))
}

async fn run_loop(config: &IndexerConfig) -> anyhow::Result<()> {
    let service = build_service(config).await?;
    let shutdown = CancellationToken::new();

    let run = service.run(shutdown.clone());
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            shutdown.cancel();
            run.await?;
            Err(Interrupted.into())
        }
    }
}

async fn backfill(config: &IndexerConfig, args: BackfillArgs) -> anyhow::Result<()> {
    let service = build_service(config).await?;
    service.backfill(args.from, args.to).await?;
    Ok(())
}

async fn status(config: &IndexerConfig) -> anyhow::Result<()> {
    let service = build_service(config).await?;
    let status = service.status().await?;
    println!(
        "last_block={} tip={} lag={}",
        status.last_block, status.tip, status.lag
    );
    Ok(())
}
