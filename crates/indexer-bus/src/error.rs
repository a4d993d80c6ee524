use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("broker connection error: {0}")]
    Connection(String),

    #[error("publish was not confirmed by the broker")]
    PublishNotConfirmed,

    #[error("queue {0} closed unexpectedly")]
    QueueClosed(String),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Lapin(#[from] lapin::Error),
}
