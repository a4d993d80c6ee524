//! End-to-end scenario suite for the crowdfunding indexer.
//!
//! Each scenario in [`scenarios`] drives literal event/rollback/reconciliation
//! messages through [`indexer_consumer::dispatch::process_message`] against
//! [`indexer_store::memory::InMemoryStateStore`] and
//! [`indexer_bus::memory::InMemoryBus`] — the same pure in-memory fakes
//! `indexer-core`'s own unit tests use, so these run without a live
//! Postgres or RabbitMQ.

pub mod fixtures;

#[cfg(test)]
mod scenarios;
