//! Composite store routing operations to the local and remote backends per
//! the configured strategy, with single-fallback on primary failure and
//! best-effort debounced background mirroring.

use crate::debounce::WriteDebouncer;
use crate::store::{KeyValueStore, Strategy};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DEFAULT_MIRROR_WINDOW: Duration = Duration::from_millis(500);

#[derive(Clone, Copy)]
enum MirrorTarget {
    Local,
    Remote,
}

pub struct HybridStore {
    local: Arc<dyn KeyValueStore>,
    remote: Arc<dyn KeyValueStore>,
    strategy: Mutex<Strategy>,
    mirror_to_local: Arc<WriteDebouncer>,
    mirror_to_remote: Arc<WriteDebouncer>,
}

impl HybridStore {
    pub fn new(
        local: Arc<dyn KeyValueStore>,
        remote: Arc<dyn KeyValueStore>,
        strategy: Strategy,
    ) -> Self {
        Self::with_mirror_window(local, remote, strategy, DEFAULT_MIRROR_WINDOW)
    }

    /// Construct with an explicit mirror-coalescing window (tests use a long
    /// window plus `flush_mirrors` for determinism).
    pub fn with_mirror_window(
        local: Arc<dyn KeyValueStore>,
        remote: Arc<dyn KeyValueStore>,
        strategy: Strategy,
        window: Duration,
    ) -> Self {
        Self {
            local,
            remote,
            strategy: Mutex::new(strategy),
            mirror_to_local: Arc::new(WriteDebouncer::new(window)),
            mirror_to_remote: Arc::new(WriteDebouncer::new(window)),
        }
    }

    pub fn strategy(&self) -> Strategy {
        *self.strategy.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Switch the active strategy at runtime. Last write wins.
    pub fn set_strategy(&self, strategy: Strategy) {
        let mut guard = self.strategy.lock().unwrap_or_else(|p| p.into_inner());
        if *guard != strategy {
            log::debug!("hybrid_store: strategy {} -> {}", guard, strategy);
        }
        *guard = strategy;
    }

    pub fn local(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.local)
    }

    pub fn remote(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.remote)
    }

    /// Synchronously write out every pending mirror. Returns how many writes
    /// were flushed.
    pub fn flush_mirrors(&self) -> usize {
        let mut flushed = 0;
        for (key, value) in self.mirror_to_remote.drain() {
            flushed += 1;
            if let Err(e) = self.remote.set(&key, &value) {
                log::warn!("hybrid_store: remote mirror flush of {} failed: {}", key, e);
            }
        }
        for (key, value) in self.mirror_to_local.drain() {
            flushed += 1;
            if let Err(e) = self.local.set(&key, &value) {
                log::warn!("hybrid_store: local mirror flush of {} failed: {}", key, e);
            }
        }
        flushed
    }

    fn mirror_parts(&self, target: MirrorTarget) -> (&Arc<WriteDebouncer>, &Arc<dyn KeyValueStore>, &'static str) {
        match target {
            MirrorTarget::Local => (&self.mirror_to_local, &self.local, "local"),
            MirrorTarget::Remote => (&self.mirror_to_remote, &self.remote, "remote"),
        }
    }

    /// Queue a best-effort background write to the non-primary store. Rapid
    /// writes of the same key within the window coalesce to the last value;
    /// failures are logged and dropped.
    fn schedule_mirror(&self, target: MirrorTarget, key: &str, value: Value) {
        let (debouncer, store, label) = self.mirror_parts(target);
        if !debouncer.submit(key, value) {
            return;
        }
        let debouncer = Arc::clone(debouncer);
        let store = Arc::clone(store);
        let key = key.to_string();
        let window = debouncer.window();
        std::thread::spawn(move || {
            std::thread::sleep(window);
            if let Some(v) = debouncer.take(&key) {
                if let Err(e) = store.set(&key, &v) {
                    log::warn!(
                        "hybrid_store: background {} mirror of {} failed: {}",
                        label,
                        key,
                        e
                    );
                }
            }
        });
    }

    /// Best-effort background removal on the non-primary store.
    fn schedule_mirror_remove(&self, target: MirrorTarget, key: &str) {
        let (debouncer, store, label) = self.mirror_parts(target);
        // A pending mirror write must not resurrect a removed key.
        let _ = debouncer.take(key);
        let store = Arc::clone(store);
        let key = key.to_string();
        std::thread::spawn(move || {
            if let Err(e) = store.remove(&key) {
                log::warn!(
                    "hybrid_store: background {} removal of {} failed: {}",
                    label,
                    key,
                    e
                );
            }
        });
    }

    fn get_local_first(&self, key: &str) -> Result<Option<Value>, String> {
        match self.local.get(key) {
            Ok(Some(v)) => Ok(Some(v)),
            Ok(None) => match self.remote.get(key) {
                Ok(Some(v)) => {
                    if let Err(e) = self.local.set(key, &v) {
                        log::warn!("hybrid_store: caching {} locally failed: {}", key, e);
                    }
                    Ok(Some(v))
                }
                Ok(None) => Ok(None),
                Err(e) => {
                    log::warn!("hybrid_store: remote fall-through get of {} failed: {}", key, e);
                    Ok(None)
                }
            },
            Err(e) => {
                log::warn!("hybrid_store: local get of {} failed, trying remote: {}", key, e);
                self.remote
                    .get(key)
                    .map_err(|e2| format!("local: {}; remote fallback: {}", e, e2))
            }
        }
    }

    fn get_remote_first(&self, key: &str) -> Result<Option<Value>, String> {
        match self.remote.get(key) {
            Ok(Some(v)) => {
                if let Err(e) = self.local.set(key, &v) {
                    log::warn!("hybrid_store: caching {} locally failed: {}", key, e);
                }
                Ok(Some(v))
            }
            Ok(None) => self.local.get(key),
            Err(e) => {
                log::warn!("hybrid_store: remote get of {} failed, trying local: {}", key, e);
                self.local
                    .get(key)
                    .map_err(|e2| format!("remote: {}; local fallback: {}", e, e2))
            }
        }
    }

    fn set_with_fallback(
        &self,
        key: &str,
        value: &Value,
        primary: &Arc<dyn KeyValueStore>,
        secondary: &Arc<dyn KeyValueStore>,
        mirror: MirrorTarget,
        primary_label: &str,
    ) -> Result<(), String> {
        match primary.set(key, value) {
            Ok(()) => {
                self.schedule_mirror(mirror, key, value.clone());
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "hybrid_store: {} set of {} failed, trying fallback: {}",
                    primary_label,
                    key,
                    e
                );
                secondary
                    .set(key, value)
                    .map_err(|e2| format!("{}: {}; fallback: {}", primary_label, e, e2))
            }
        }
    }
}

impl KeyValueStore for HybridStore {
    fn get(&self, key: &str) -> Result<Option<Value>, String> {
        match self.strategy() {
            Strategy::LocalOnly => self.local.get(key),
            Strategy::RemoteOnly => self.remote.get(key),
            Strategy::LocalFirst => self.get_local_first(key),
            Strategy::RemoteFirst => self.get_remote_first(key),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), String> {
        match self.strategy() {
            Strategy::LocalOnly => self.local.set(key, value),
            Strategy::RemoteOnly => self.remote.set(key, value),
            Strategy::LocalFirst => self.set_with_fallback(
                key,
                value,
                &self.local,
                &self.remote,
                MirrorTarget::Remote,
                "local",
            ),
            Strategy::RemoteFirst => self.set_with_fallback(
                key,
                value,
                &self.remote,
                &self.local,
                MirrorTarget::Local,
                "remote",
            ),
        }
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        match self.strategy() {
            Strategy::LocalOnly => self.local.remove(key),
            Strategy::RemoteOnly => self.remote.remove(key),
            Strategy::LocalFirst => {
                self.local.remove(key)?;
                self.schedule_mirror_remove(MirrorTarget::Remote, key);
                Ok(())
            }
            Strategy::RemoteFirst => {
                self.remote.remove(key)?;
                self.schedule_mirror_remove(MirrorTarget::Local, key);
                Ok(())
            }
        }
    }

    fn clear(&self) -> Result<(), String> {
        // Pending mirrors must not re-create cleared keys.
        let _ = self.mirror_to_local.drain();
        let _ = self.mirror_to_remote.drain();
        match self.strategy() {
            Strategy::LocalOnly => self.local.clear(),
            Strategy::RemoteOnly => self.remote.clear(),
            Strategy::LocalFirst => {
                self.local.clear()?;
                if let Err(e) = self.remote.clear() {
                    log::warn!("hybrid_store: best-effort remote clear failed: {}", e);
                }
                Ok(())
            }
            Strategy::RemoteFirst => {
                self.remote.clear()?;
                if let Err(e) = self.local.clear() {
                    log::warn!("hybrid_store: best-effort local clear failed: {}", e);
                }
                Ok(())
            }
        }
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        match self.strategy() {
            Strategy::LocalOnly => self.local.keys(),
            Strategy::RemoteOnly => self.remote.keys(),
            Strategy::LocalFirst => self.local.keys().or_else(|e| {
                log::warn!("hybrid_store: local keys failed, trying remote: {}", e);
                self.remote.keys()
            }),
            Strategy::RemoteFirst => self.remote.keys().or_else(|e| {
                log::warn!("hybrid_store: remote keys failed, trying local: {}", e);
                self.local.keys()
            }),
        }
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, String> {
        match self.strategy() {
            Strategy::LocalOnly => self.local.get_by_prefix(prefix),
            Strategy::RemoteOnly => self.remote.get_by_prefix(prefix),
            Strategy::LocalFirst => self.local.get_by_prefix(prefix).or_else(|e| {
                log::warn!("hybrid_store: local prefix scan failed, trying remote: {}", e);
                self.remote.get_by_prefix(prefix)
            }),
            Strategy::RemoteFirst => self.remote.get_by_prefix(prefix).or_else(|e| {
                log::warn!("hybrid_store: remote prefix scan failed, trying local: {}", e);
                self.local.get_by_prefix(prefix)
            }),
        }
    }

    /// Partial availability counts as healthy.
    fn is_healthy(&self) -> bool {
        self.local.is_healthy() || self.remote.is_healthy()
    }
}
