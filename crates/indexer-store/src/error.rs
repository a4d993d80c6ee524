use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("chain {0} is not registered — seed the chains table before indexing")]
    UnknownChain(u64),

    #[error("campaign {0} does not exist yet")]
    UnknownCampaign(String),

    #[error("transient store error: {0}")]
    Transient(String),

    #[error("value out of representable range: {0}")]
    OutOfRange(String),

    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the consumer worker should nack-with-requeue (transient) or
    /// treat this as a fatal misconfiguration requiring operator action.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_) | StoreError::UnknownCampaign(_))
            || matches!(self, StoreError::Sql(e) if matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)))
    }
}
