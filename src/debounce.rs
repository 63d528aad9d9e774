//! Per-key write coalescing for best-effort mirror writes: rapid successive
//! writes of the same key within the window collapse to the last value.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

struct Pending {
    value: Value,
}

pub struct WriteDebouncer {
    window: Duration,
    pending: Mutex<HashMap<String, Pending>>,
}

impl WriteDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a pending write. Returns true when the key was not already
    /// pending, i.e. the caller should schedule a flush for it; later writes
    /// within the window only replace the pending value.
    pub fn submit(&self, key: &str, value: Value) -> bool {
        let mut pending = match self.pending.lock() {
            Ok(p) => p,
            Err(_) => return false,
        };
        let fresh = !pending.contains_key(key);
        pending.insert(key.to_string(), Pending { value });
        fresh
    }

    /// Take the coalesced value for a key, if still pending.
    pub fn take(&self, key: &str) -> Option<Value> {
        self.pending
            .lock()
            .ok()
            .and_then(|mut p| p.remove(key))
            .map(|p| p.value)
    }

    /// Drain everything that is pending, regardless of the window.
    pub fn drain(&self) -> Vec<(String, Value)> {
        match self.pending.lock() {
            Ok(mut p) => p.drain().map(|(k, v)| (k, v.value)).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}
