use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported reconciliation type: {0}")]
    UnsupportedReconciliationType(String),

    #[error("malformed event argument: {0}")]
    MalformedArgs(String),

    #[error(transparent)]
    Store(#[from] indexer_store::StoreError),
}

pub type CoreResult<T> = Result<T, CoreError>;
