mod invariants;
mod lifecycle;
mod ordering;
mod pipeline;
mod reconciliation;
mod reorg;

use indexer_store::{memory::InMemoryStateStore, StateStore};
use std::sync::Arc;

use crate::fixtures::CHAIN_ID;

/// A store with the one chain row every scenario operates against already
/// present, matching what the producer's startup sequence guarantees
/// before any message is ever published.
async fn bootstrap_store() -> Arc<dyn StateStore> {
    let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    let mut uow = store.begin().await.unwrap();
    uow.ensure_chain_exists(CHAIN_ID, "local").await.unwrap();
    uow.commit().await.unwrap();
    store
}
