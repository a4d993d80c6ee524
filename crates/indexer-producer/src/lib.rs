//! # Producer
//!
//! Tails a chain, detects reorgs, decodes logs into events, and publishes
//! them in `(block_number, log_index)` order before advancing the sync
//! cursor. A single-threaded cooperative loop per chain process — see
//! [`service::ProducerService::run`].

mod error;
mod reorg;
mod service;

pub use error::ProducerError;
pub use reorg::{compute_rollback_range, ReorgOutcome};
pub use service::{ProducerService, SyncStatus};

pub type ProducerResult<T> = Result<T, ProducerError>;
