//! Key-value store for trigger cursor state.
//!
//! Every trigger sees its own keyspace: the lifecycle hands each trigger a
//! [`ScopedStore`] that prefixes keys with the flow and trigger. Access is
//! read-then-write, so at most one poll per (flow, trigger) may run at a
//! time. The external scheduler guarantees that.

use crate::error::StoreError;
use async_trait::async_trait;
use piecework_core::FlowId;
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persistent key-value storage available to triggers.
#[async_trait]
pub trait TriggerStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, Report<StoreError>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: JsonValue) -> Result<(), Report<StoreError>>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), Report<StoreError>>;
}

/// In-memory store backed by a `HashMap` protected by `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, JsonValue>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TriggerStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, Report<StoreError>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: JsonValue) -> Result<(), Report<StoreError>> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Report<StoreError>> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// A view of a shared store limited to one (flow, trigger) pair.
#[derive(Clone)]
pub struct ScopedStore {
    inner: Arc<dyn TriggerStore>,
    prefix: String,
}

impl ScopedStore {
    /// Scopes `inner` to the trigger `trigger_name` of `flow_id`.
    pub fn new(inner: Arc<dyn TriggerStore>, flow_id: FlowId, trigger_name: &str) -> Self {
        Self {
            inner,
            prefix: format!("{flow_id}/{trigger_name}/"),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl std::fmt::Debug for ScopedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TriggerStore for ScopedStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, Report<StoreError>> {
        self.inner.get(&self.scoped(key)).await
    }

    async fn put(&self, key: &str, value: JsonValue) -> Result<(), Report<StoreError>> {
        self.inner.put(&self.scoped(key), value).await
    }

    async fn delete(&self, key: &str) -> Result<(), Report<StoreError>> {
        self.inner.delete(&self.scoped(key)).await
    }
}
