use std::sync::Arc;

use tracing::debug;

use crate::application::{
    repos::{RepoError, ViewCountersRepo},
    retry::RetryPolicy,
};
use crate::domain::types::CounterKey;

const SOURCE: &str = "application::views::ViewCounterService";

/// Where the visitor stands in the counting window for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// No tracking cookie: counts once and opens the window.
    FirstInWindow,
    /// Cookie present: read only.
    Repeat,
}

impl Visit {
    pub fn from_cookie_present(present: bool) -> Self {
        if present { Visit::Repeat } else { Visit::FirstInWindow }
    }
}

#[derive(Clone)]
pub struct ViewCounterService {
    repo: Arc<dyn ViewCountersRepo>,
    read_retry: RetryPolicy,
}

impl ViewCounterService {
    pub fn new(repo: Arc<dyn ViewCountersRepo>, read_retry: RetryPolicy) -> Self {
        Self { repo, read_retry }
    }

    /// Current count; a key that was never incremented reads as zero.
    pub async fn current(&self, key: &CounterKey) -> Result<i64, RepoError> {
        let count = self
            .read_retry
            .run("views.read", || self.repo.read_count(key))
            .await?;
        Ok(count.unwrap_or(0))
    }

    /// Applies one visit. Increments run exactly once; a failed increment is
    /// reported rather than retried so it cannot double count.
    pub async fn record(&self, key: &CounterKey, visit: Visit) -> Result<i64, RepoError> {
        match visit {
            Visit::Repeat => self.current(key).await,
            Visit::FirstInWindow => {
                let count = self.repo.increment(key).await?;
                metrics::counter!("folio_views_increment_total", "scope" => key.scope())
                    .increment(1);
                debug!(target = SOURCE, key = %key, count, "view counted");
                Ok(count)
            }
        }
    }

    pub async fn health_check(&self) -> Result<(), RepoError> {
        self.repo.health_check().await
    }
}
