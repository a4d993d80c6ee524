use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("chain reorganized deeper than the rollback window ({window} blocks) — manual resync required")]
    UnrecoverableReorg { window: u64 },

    #[error(transparent)]
    Chain(#[from] indexer_chain::ChainError),

    #[error(transparent)]
    Store(#[from] indexer_store::StoreError),

    #[error(transparent)]
    Bus(#[from] indexer_bus::BusError),

    #[error(transparent)]
    Codec(#[from] indexer_codec::CodecError),
}
