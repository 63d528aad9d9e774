//! Shared helpers for storage integration tests: in-memory backends and
//! failure-injecting stores.

#![allow(dead_code)]

use oxivo_client_core::{KeyValueStore, LocalStore};
use serde_json::Value;
use std::sync::Arc;

pub fn mem() -> Arc<LocalStore> {
    Arc::new(LocalStore::in_memory().expect("in-memory store"))
}

/// Store where every operation fails with a network-shaped error.
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<Value>, String> {
        Err("connection refused (simulated)".to_string())
    }

    fn set(&self, _key: &str, _value: &Value) -> Result<(), String> {
        Err("connection refused (simulated)".to_string())
    }

    fn remove(&self, _key: &str) -> Result<(), String> {
        Err("connection refused (simulated)".to_string())
    }

    fn clear(&self) -> Result<(), String> {
        Err("connection refused (simulated)".to_string())
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        Err("connection refused (simulated)".to_string())
    }

    fn get_by_prefix(&self, _prefix: &str) -> Result<Vec<(String, Value)>, String> {
        Err("connection refused (simulated)".to_string())
    }

    fn is_healthy(&self) -> bool {
        false
    }
}

/// Delegates to an inner store but rejects writes of keys containing the
/// configured fragment. For exercising per-key migration failures.
pub struct SelectiveFailStore {
    inner: Arc<LocalStore>,
    reject_fragment: String,
}

impl SelectiveFailStore {
    pub fn new(reject_fragment: &str) -> Self {
        Self {
            inner: mem(),
            reject_fragment: reject_fragment.to_string(),
        }
    }

    pub fn inner(&self) -> &LocalStore {
        &self.inner
    }
}

impl KeyValueStore for SelectiveFailStore {
    fn get(&self, key: &str) -> Result<Option<Value>, String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), String> {
        if key.contains(&self.reject_fragment) {
            return Err(format!("write rejected for key {}", key));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.inner.remove(key)
    }

    fn clear(&self) -> Result<(), String> {
        self.inner.clear()
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        self.inner.keys()
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, String> {
        self.inner.get_by_prefix(prefix)
    }

    fn is_healthy(&self) -> bool {
        self.inner.is_healthy()
    }
}
