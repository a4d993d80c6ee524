use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain unavailable: {0}")]
    Transport(String),

    #[error("RPC returned an error response: {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed RPC response: {0}")]
    MalformedResponse(String),

    #[error("invalid block range: from {from} > to {to}")]
    InvalidRange { from: u64, to: u64 },
}

impl ChainError {
    /// Transport-level failures are retried; a well-formed RPC error
    /// response or an invalid range passed by the caller is not — the
    /// former is the remote node telling us something is wrong with the
    /// request, the latter is a caller bug.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Transport(_))
    }
}
