use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error(transparent)]
    Bus(#[from] indexer_bus::BusError),

    #[error(transparent)]
    Store(#[from] indexer_store::StoreError),

    #[error(transparent)]
    Core(#[from] indexer_core::CoreError),

    #[error("fatal: {0}")]
    Fatal(String),
}

pub type ConsumerResult<T> = Result<T, ConsumerError>;
