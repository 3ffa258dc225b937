//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::Arc;

use assistant_core::{KeyValueStore, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// HashMap-backed [`KeyValueStore`] for tests and embedded use. Nothing
/// survives the process.
#[derive(Default)]
pub struct InMemoryStateStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_forgets_values() {
        let store = InMemoryStateStore::new();

        store.set("edms_user_id", "u-1").await.unwrap();
        assert_eq!(store.get("edms_user_id").await.as_deref(), Some("u-1"));

        store.remove("edms_user_id").await.unwrap();
        assert_eq!(store.get("edms_user_id").await, None);
    }
}
