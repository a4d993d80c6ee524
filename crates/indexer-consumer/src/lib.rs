//! # Consumer Worker Pool
//!
//! Parallel workers that pull from the message bus and drive
//! `indexer-core`'s state-derivation rules, one transactional unit of work
//! per message. [`dispatch`] holds the pure message-to-verdict mapping;
//! [`worker`] drives a single consumer handle end to end and spawns the
//! pool.

mod error;
pub mod dispatch;
pub mod worker;

pub use error::{ConsumerError, ConsumerResult};
pub use worker::{run_worker, spawn_workers};
