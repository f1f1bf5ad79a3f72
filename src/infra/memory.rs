//! Process-local view counters, used when no database is configured.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    application::repos::{RepoError, ViewCountersRepo},
    domain::types::CounterKey,
};

#[derive(Debug, Clone, Default)]
pub struct MemoryViewCounters {
    counters: Arc<DashMap<String, i64>>,
}

impl MemoryViewCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a counter, replacing any existing value.
    pub fn set(&self, key: &CounterKey, count: i64) {
        self.counters.insert(key.storage_key(), count);
    }
}

#[async_trait]
impl ViewCountersRepo for MemoryViewCounters {
    async fn read_count(&self, key: &CounterKey) -> Result<Option<i64>, RepoError> {
        Ok(self
            .counters
            .get(&key.storage_key())
            .map(|count| *count.value()))
    }

    async fn increment(&self, key: &CounterKey) -> Result<i64, RepoError> {
        // The entry guard holds the shard lock, so read and write are one step.
        let mut entry = self.counters.entry(key.storage_key()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_rows_read_as_none() {
        let store = MemoryViewCounters::new();
        let key = CounterKey::post("fresh").expect("key");
        assert_eq!(store.read_count(&key).await.expect("read"), None);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = MemoryViewCounters::new();
        let key = CounterKey::post("busy").expect("key");
        store.set(&key, 10);

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move { store.increment(&key).await })
            })
            .collect();
        for task in tasks {
            task.await.expect("join").expect("increment");
        }

        assert_eq!(store.read_count(&key).await.expect("read"), Some(42));
    }
}
