use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "indexer")]
#[command(about = "Blockchain event indexer for the crowdfunding platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Polls the chain and publishes decoded events to the bus.
    #[command(subcommand)]
    Producer(ProducerCommand),
    /// Consumes published events and projects them into the state store.
    #[command(subcommand)]
    Consumer(ConsumerCommand),
    /// Declares, inspects, or clears the message bus topology.
    #[command(subcommand)]
    Broker(BrokerCommand),
}

#[derive(Subcommand, Debug)]
pub enum ProducerCommand {
    /// Runs the cooperative polling loop until interrupted.
    Run,
    /// Indexes a fixed historical range through the same pipeline.
    Backfill(BackfillArgs),
    /// Prints the current cursor, chain tip, and lag.
    Status,
}

#[derive(Args, Debug)]
pub struct BackfillArgs {
    #[arg(long)]
    pub from: u64,
    #[arg(long)]
    pub to: u64,
}

#[derive(Subcommand, Debug)]
pub enum ConsumerCommand {
    /// Runs the worker pool until interrupted.
    Run(ConsumerRunArgs),
    /// Prints queue depths and consumer counts.
    Status,
}

#[derive(Args, Debug)]
pub struct ConsumerRunArgs {
    /// Overrides CONSUMER_WORKERS for this invocation.
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum BrokerCommand {
    /// Declares the exchange, DLX, DLQ, and work queues. Safe to re-run.
    Setup,
    /// Prints depths and consumer counts for every queue, including the DLQ.
    Status,
    /// Purges one queue's messages.
    Purge(PurgeArgs),
    /// Prints the process-wide metrics registry in Prometheus text format.
    Metrics,
}

#[derive(Args, Debug)]
pub struct PurgeArgs {
    #[arg(long)]
    pub queue: String,
}
