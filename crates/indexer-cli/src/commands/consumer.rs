use crate::cli::{ConsumerCommand, ConsumerRunArgs};
use crate::commands::{connect_bus, connect_store, Interrupted};
use indexer_bus::topology::WORK_QUEUES;
use indexer_bus::Consumer;
use indexer_config::IndexerConfig;
use indexer_store::StateStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(cmd: ConsumerCommand, config: &IndexerConfig) -> anyhow::Result<()> {
    match cmd {
        ConsumerCommand::Run(args) => run_pool(config, args).await,
        ConsumerCommand::Status => status(config).await,
    }
}

async fn run_pool(config: &IndexerConfig, args: ConsumerRunArgs) -> anyhow::Result<()> {
    let bus = connect_bus(config).await?;
    bus.declare_topology().await?;
    let store: Arc<dyn StateStore> = Arc::new(connect_store(config).await?);

    let worker_count = args.workers.unwrap_or(config.workers.consumer_workers);
    let mut consumers: Vec<(String, Box<dyn Consumer>)> = Vec::with_capacity(worker_count);
    for i in 0..worker_count {
        let queue = WORK_QUEUES[i % WORK_QUEUES.len()];
        let tag = format!("worker-{i}");
        let consumer = bus.consumer(queue, &tag).await?;
        consumers.push((tag, Box::new(consumer)));
    }

    let shutdown = CancellationToken::new();
    let handles = indexer_consumer::spawn_workers(consumers, store, config.workers.max_retries, shutdown.clone());

    tokio::select! {
        result = futures_join(handles) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            shutdown.cancel();
            return Err(Interrupted.into());
        }
    }
    Ok(())
}

/// Awaits every worker, surfacing the first fatal error (a worker halted
/// the pool on an operator-seed condition like an unregistered chain) so
/// the process exits non-zero instead of hanging around with a drained
/// worker set.
async fn futures_join(handles: Vec<tokio::task::JoinHandle<indexer_consumer::ConsumerResult<()>>>) -> anyhow::Result<()> {
    let mut first_err = None;
    for handle in handles {
        if let Ok(Err(err)) = handle.await {
            if first_err.is_none() {
                first_err = Some(err);
            }
        }
    }
    match first_err {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

async fn status(config: &IndexerConfig) -> anyhow::Result<()> {
    let bus = connect_bus(config).await?;
    for queue in WORK_QUEUES {
        let status = bus.queue_status(queue).await?;
        println!(
            "{:<28} messages={:<8} consumers={}",
            status.name, status.message_count, status.consumer_count
        );
    }
    Ok(())
}
