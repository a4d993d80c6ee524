//! `indexer`: the single binary wrapping the producer loop, the consumer
//! worker pool, and broker administration behind one `clap` CLI, matching
//! the rest of this workspace's one-binary-per-deployable convention.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command};
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match indexer_config::IndexerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(1);
        }
    };
    if let Err(err) = config.validate() {
        eprintln!("configuration error: {err}");
        return ExitCode::from(1);
    }
    if let Err(err) = indexer_telemetry::init_logging(&config.log_level) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::from(1);
    }

    let result = match cli.command {
        Command::Producer(cmd) => commands::producer::run(cmd, &config).await,
        Command::Consumer(cmd) => commands::consumer::run(cmd, &config).await,
        Command::Broker(cmd) => commands::broker::run(cmd, &config).await,
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(err) if commands::is_interrupt(&err) => ExitCode::from(130),
        Err(err) => {
            error!(error = %err, "fatal error");
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
