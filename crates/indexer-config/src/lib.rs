//! # Indexer Configuration
//!
//! Unified, environment-driven configuration for the producer, consumer,
//! and broker commands. Every field has the same default as the reference
//! implementation; `FACTORY_ADDRESS` and `DB_URL` are the only values that
//! must be supplied.

use std::env::VarError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Complete indexer configuration, composed of per-concern sub-structs.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub chain: ChainConfig,
    pub store: StoreConfig,
    pub bus: BusConfig,
    pub workers: WorkerConfig,
    pub reconciliation: ReconciliationConfig,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub factory_address: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub confirmations: u64,
    pub block_batch_size: u64,
    pub poll_interval: Duration,
    pub reorg_rollback_blocks: u64,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_url: String,
}

#[derive(Debug, Clone)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
    pub exchange: String,
    pub prefetch_count: u16,
}

impl BusConfig {
    pub fn amqp_uri(&self) -> String {
        let vhost = if self.vhost == "/" {
            String::new()
        } else {
            self.vhost.clone()
        };
        format!(
            "amqp://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, vhost
        )
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub consumer_workers: usize,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    pub interval: Duration,
}

impl IndexerConfig {
    /// Loads configuration from the process environment, applying the same
    /// defaults the reference implementation uses for everything except
    /// `FACTORY_ADDRESS` and `DB_URL`, which are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let factory_address = require_env("FACTORY_ADDRESS")?;
        let db_url = require_env("DB_URL")?;

        Ok(Self {
            chain: ChainConfig {
                factory_address,
                rpc_url: env_or("RPC_URL", "http://127.0.0.1:8545"),
                chain_id: parse_env("CHAIN_ID", 31337)?,
                confirmations: parse_env("CONFIRMATIONS", 1)?,
                block_batch_size: parse_env("BLOCK_BATCH_SIZE", 2000)?,
                poll_interval: Duration::from_secs(parse_env("POLL_INTERVAL_SECONDS", 15)?),
                reorg_rollback_blocks: parse_env("REORG_ROLLBACK_BLOCKS", 50)?,
            },
            store: StoreConfig { db_url },
            bus: BusConfig {
                host: env_or("RABBITMQ_HOST", "localhost"),
                port: parse_env("RABBITMQ_PORT", 5672)?,
                user: env_or("RABBITMQ_USER", "guest"),
                password: env_or("RABBITMQ_PASSWORD", "guest"),
                vhost: env_or("RABBITMQ_VHOST", "/"),
                exchange: env_or("RABBITMQ_EXCHANGE", "blockchain_events"),
                prefetch_count: parse_env("RABBITMQ_PREFETCH_COUNT", 10)?,
            },
            workers: WorkerConfig {
                consumer_workers: parse_env("CONSUMER_WORKERS", 4)?,
                max_retries: parse_env("MAX_RETRIES", 3)?,
            },
            reconciliation: ReconciliationConfig {
                interval: Duration::from_secs(parse_env(
                    "RECONCILIATION_INTERVAL_SECONDS",
                    300,
                )?),
            },
            log_level: env_or("LOG_LEVEL", "info"),
        })
    }

    /// Rejects configuration values that would be nonsensical at runtime.
    /// Unlike missing-required-variable errors (caught in `from_env`),
    /// these are logically-invalid combinations of otherwise-valid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.block_batch_size == 0 {
            return Err(ConfigError::Invalid {
                name: "BLOCK_BATCH_SIZE",
                value: "0".to_string(),
            });
        }
        if self.workers.consumer_workers == 0 {
            return Err(ConfigError::Invalid {
                name: "CONSUMER_WORKERS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

fn parse_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(v) => v.parse().map_err(|_| ConfigError::Invalid { name, value: v }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::Invalid {
            name,
            value: "<non-utf8>".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_optional_env() {
        for var in [
            "RPC_URL",
            "CHAIN_ID",
            "CONFIRMATIONS",
            "BLOCK_BATCH_SIZE",
            "POLL_INTERVAL_SECONDS",
            "REORG_ROLLBACK_BLOCKS",
            "RABBITMQ_HOST",
            "RABBITMQ_PORT",
            "CONSUMER_WORKERS",
            "MAX_RETRIES",
            "RECONCILIATION_INTERVAL_SECONDS",
            "LOG_LEVEL",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn defaults_match_reference_implementation() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_optional_env();
        std::env::set_var("FACTORY_ADDRESS", "0x5FbDB2315678afecb367f032d93F642f64180aa3");
        std::env::set_var("DB_URL", "postgres://localhost/indexer");

        let config = IndexerConfig::from_env().unwrap();
        assert_eq!(config.chain.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.chain.confirmations, 1);
        assert_eq!(config.chain.block_batch_size, 2000);
        assert_eq!(config.workers.consumer_workers, 4);
        assert_eq!(config.bus.exchange, "blockchain_events");
    }

    #[test]
    fn missing_factory_address_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("FACTORY_ADDRESS");
        std::env::set_var("DB_URL", "postgres://localhost/indexer");
        assert!(matches!(
            IndexerConfig::from_env(),
            Err(ConfigError::Missing("FACTORY_ADDRESS"))
        ));
    }

    #[test]
    fn zero_batch_size_fails_validation() {
        let mut config_chain = ChainConfig {
            factory_address: "0xabc".to_string(),
            rpc_url: "http://localhost".to_string(),
            chain_id: 1,
            confirmations: 1,
            block_batch_size: 0,
            poll_interval: Duration::from_secs(1),
            reorg_rollback_blocks: 50,
        };
        config_chain.block_batch_size = 0;
        let config = IndexerConfig {
            chain: config_chain,
            store: StoreConfig {
                db_url: "postgres://localhost".to_string(),
            },
            bus: BusConfig {
                host: "localhost".to_string(),
                port: 5672,
                user: "guest".to_string(),
                password: "guest".to_string(),
                vhost: "/".to_string(),
                exchange: "blockchain_events".to_string(),
                prefetch_count: 10,
            },
            workers: WorkerConfig {
                consumer_workers: 4,
                max_retries: 3,
            },
            reconciliation: ReconciliationConfig {
                interval: Duration::from_secs(300),
            },
            log_level: "info".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
