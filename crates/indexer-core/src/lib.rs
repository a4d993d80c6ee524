//! # State Derivation Rules
//!
//! The pure domain logic that turns bus messages into `StateStore`
//! mutations: the per-event state updater, the rollback handler, and the
//! reconciliation sweep. Every function here takes a `&mut dyn UnitOfWork`
//! and nothing else — no bus, no chain client — so it can be driven
//! directly by unit tests against [`indexer_store::memory::InMemoryStateStore`]
//! as well as by the real consumer worker.

mod error;
mod reconciliation;
mod rollback;
mod state_updater;

pub use error::{CoreError, CoreResult};
pub use reconciliation::run_reconciliation;
pub use rollback::handle_rollback;
pub use state_updater::{apply_event, ApplyOutcome};
