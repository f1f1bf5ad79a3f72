//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::retry::Retryable;
use crate::domain::types::CounterKey;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl Retryable for RepoError {
    fn is_retryable(&self) -> bool {
        matches!(self, RepoError::Persistence(_) | RepoError::Timeout)
    }
}

/// Key → integer view counters.
///
/// `increment` must be a single atomic statement on the store side: create the
/// row at 1 when it is absent, otherwise add one, and return the new value.
#[async_trait]
pub trait ViewCountersRepo: Send + Sync {
    /// Current count, `None` when the row was never created.
    async fn read_count(&self, key: &CounterKey) -> Result<Option<i64>, RepoError>;

    async fn increment(&self, key: &CounterKey) -> Result<i64, RepoError>;

    /// Cheap round-trip proving the store is reachable.
    async fn health_check(&self) -> Result<(), RepoError>;
}
