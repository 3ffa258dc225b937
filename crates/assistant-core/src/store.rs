//! Persistent client state.
//!
//! Identity fields (user id, service token, thread id) survive client
//! restarts so a reload resumes the same conversation. The storage mechanism
//! is injected behind a small key-value interface, enabling test doubles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// An abstract key-value store for persisted client state.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value for `key`, or `None` when unset.
    async fn get(&self, key: &str) -> Option<String>;

    /// Sets `key` to `value`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Typed facade over the key-value store for the three identity fields.
///
/// Keys match the entries earlier client revisions persisted, so existing
/// state remains readable after an upgrade.
#[derive(Clone)]
pub struct ClientState {
    store: Arc<dyn KeyValueStore>,
}

impl ClientState {
    pub const USER_ID_KEY: &'static str = "edms_user_id";
    pub const SERVICE_TOKEN_KEY: &'static str = "edms_service_token";
    pub const THREAD_ID_KEY: &'static str = "edms_thread_id";

    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn user_id(&self) -> Option<String> {
        self.store.get(Self::USER_ID_KEY).await
    }

    pub async fn set_user_id(&self, user_id: &str) -> Result<()> {
        self.store.set(Self::USER_ID_KEY, user_id).await
    }

    pub async fn service_token(&self) -> Option<String> {
        self.store.get(Self::SERVICE_TOKEN_KEY).await
    }

    pub async fn set_service_token(&self, token: &str) -> Result<()> {
        self.store.set(Self::SERVICE_TOKEN_KEY, token).await
    }

    pub async fn thread_id(&self) -> Option<String> {
        self.store.get(Self::THREAD_ID_KEY).await
    }

    /// Sets or clears the persisted thread id.
    pub async fn set_thread_id(&self, thread_id: Option<&str>) -> Result<()> {
        match thread_id {
            Some(id) => self.store.set(Self::THREAD_ID_KEY, id).await,
            None => self.store.remove(Self::THREAD_ID_KEY).await,
        }
    }

    /// Removes identity fields and the thread id (logout).
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(Self::USER_ID_KEY).await?;
        self.store.remove(Self::SERVICE_TOKEN_KEY).await?;
        self.store.remove(Self::THREAD_ID_KEY).await?;
        Ok(())
    }
}
