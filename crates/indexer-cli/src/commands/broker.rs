use crate::cli::{BrokerCommand, PurgeArgs};
use crate::commands::connect_bus;
use indexer_bus::topology::{DLQ, WORK_QUEUES};
use indexer_config::IndexerConfig;

pub async fn run(cmd: BrokerCommand, config: &IndexerConfig) -> anyhow::Result<()> {
    match cmd {
        BrokerCommand::Setup => setup(config).await,
        BrokerCommand::Status => status(config).await,
        BrokerCommand::Purge(args) => purge(config, args).await,
        BrokerCommand::Metrics => metrics().await,
    }
}

async fn setup(config: &IndexerConfig) -> anyhow::Result<()> {
    let bus = connect_bus(config).await?;
    bus.declare_topology().await?;
    println!("topology declared");
    Ok(())
}

async fn status(config: &IndexerConfig) -> anyhow::Result<()> {
    let bus = connect_bus(config).await?;
    for queue in WORK_QUEUES.iter().copied().chain(std::iter::once(DLQ)) {
        let status = bus.queue_status(queue).await?;
        println!(
            "{:<28} messages={:<8} consumers={}",
            status.name, status.message_count, status.consumer_count
        );
    }
    Ok(())
}

async fn purge(config: &IndexerConfig, args: PurgeArgs) -> anyhow::Result<()> {
    let bus = connect_bus(config).await?;
    let purged = bus.purge_queue(&args.queue).await?;
    println!("purged {purged} messages from {}", args.queue);
    Ok(())
}

async fn metrics() -> anyhow::Result<()> {
    print!("{}", indexer_telemetry::Metrics::global().encode()?);
    Ok(())
}
