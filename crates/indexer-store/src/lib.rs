//! # State Store
//!
//! The `StateStore` port is the single abstraction every other crate in
//! the consumer tier depends on. It hands out a `UnitOfWork` per message:
//! a transactional boundary that commits atomically on success and rolls
//! back on any error, matching the "one transaction per consumed message"
//! rule the consumer worker (and the rollback/reconciliation handlers)
//! rely on for correctness.
//!
//! Two adapters are provided: [`postgres::PgStateStore`] for production,
//! and [`memory::InMemoryStateStore`] for the core crate's unit tests and
//! the workspace's scenario tests, so state-derivation logic is fully
//! testable without a live database.

pub mod memory;
pub mod postgres;

mod error;
mod port;

pub use error::StoreError;
pub use port::{InsertOutcome, StateStore, UnitOfWork};

pub type StoreResult<T> = Result<T, StoreError>;
