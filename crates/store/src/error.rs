use thiserror::Error;

/// Storage operation error.
///
/// `Conflict` is the optimistic-concurrency signal: the project row moved
/// between read and write. Callers (the Ledger Engine) reload and retry it.
/// Everything else is an infrastructure failure, retryable by the caller but
/// never retried internally.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(msg: impl std::fmt::Display) -> Self {
        Self::Backend(msg.to_string())
    }
}
