use thiserror::Error;

/// Top-level error type for the NeonChat server.
///
/// A missing target or partner is a silent no-op, never an error.
#[derive(Debug, Error)]
pub enum NeonChatError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NeonChatError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
