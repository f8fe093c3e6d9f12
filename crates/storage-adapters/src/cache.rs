use async_trait::async_trait;
use dashmap::DashMap;
use domains::{Cache, Result};
use serde_json::Value;
use tracing::trace;

/// Unbounded key/value cache. Entries live until removed.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Value>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            trace!(key, "cache entry removed");
        }
    }
}
