//! SQLite-backed key-value store: the local/cache side of the storage layer.
//! Owns its connection; construct one per context and pass it around.

use crate::store::KeyValueStore;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;

/// Keys matching these prefixes are considered low-value cached data and are
/// the first to go when the store runs out of capacity.
const CLEANUP_PREFIXES: &[&str] = &["cache:", "tmp:"];

pub struct LocalStore {
    conn: Mutex<Connection>,
    /// Soft byte budget over stored keys+values. `None` means unbounded.
    capacity_bytes: Option<usize>,
}

impl LocalStore {
    /// Open (or create) the store under `dir`.
    pub fn open(dir: &Path) -> Result<Self, String> {
        std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
        let db_path = dir.join("oxivo.db");
        log::debug!("local_store::open db={:?}", db_path);
        let conn = Connection::open(&db_path).map_err(|e| e.to_string())?;
        Self::from_connection(conn)
    }

    /// Open with a soft byte budget emulating browser-storage quota.
    pub fn open_with_capacity(dir: &Path, capacity_bytes: usize) -> Result<Self, String> {
        let mut store = Self::open(dir)?;
        store.capacity_bytes = Some(capacity_bytes);
        Ok(store)
    }

    /// In-memory store, for tests and throwaway contexts.
    pub fn in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory().map_err(|e| e.to_string())?;
        Self::from_connection(conn)
    }

    pub fn in_memory_with_capacity(capacity_bytes: usize) -> Result<Self, String> {
        let mut store = Self::in_memory()?;
        store.capacity_bytes = Some(capacity_bytes);
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self, String> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| e.to_string())?;
        Ok(Self {
            conn: Mutex::new(conn),
            capacity_bytes: None,
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| "local store lock poisoned".to_string())?;
        f(&conn).map_err(|e| e.to_string())
    }

    /// Bytes stored across all entries except `excluding`.
    fn used_bytes_excluding(&self, excluding: &str) -> Result<usize, String> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COALESCE(SUM(LENGTH(key) + LENGTH(value)), 0) FROM kv WHERE key != ?1",
                params![excluding],
                |row| row.get(0),
            )?;
            Ok(total as usize)
        })
    }

    /// Drop low-value cached entries; returns how many were removed.
    pub fn cleanup_cache_entries(&self) -> Result<usize, String> {
        self.with_conn(|conn| {
            let mut removed = 0;
            for prefix in CLEANUP_PREFIXES {
                removed += conn.execute(
                    "DELETE FROM kv WHERE key LIKE ?1 || '%'",
                    params![prefix],
                )?;
            }
            Ok(removed)
        })
    }

    fn put(&self, key: &str, text: &str) -> Result<(), String> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, text, updated_at],
            )?;
            Ok(())
        })
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<Value>, String> {
        let text = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
            let mut rows = stmt.query(params![key])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(row.get::<_, String>(0)?));
            }
            Ok(None)
        })?;
        match text {
            Some(t) => {
                let value = serde_json::from_str(&t).map_err(|e| e.to_string())?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), String> {
        let text = serde_json::to_string(value).map_err(|e| e.to_string())?;
        if let Some(cap) = self.capacity_bytes {
            let incoming = key.len() + text.len();
            if self.used_bytes_excluding(key)? + incoming > cap {
                // Quota pressure: evict cached entries and retry once.
                let removed = self.cleanup_cache_entries()?;
                log::warn!(
                    "local_store: capacity pressure on key={}, evicted {} cached entries",
                    key,
                    removed
                );
                if self.used_bytes_excluding(key)? + incoming > cap {
                    return Err(format!(
                        "local store full: {} bytes for key {} exceeds {} byte budget",
                        incoming, key, cap
                    ));
                }
            }
        }
        self.put(key, &text)
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(())
        })
    }

    fn clear(&self) -> Result<(), String> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv", [])?;
            Ok(())
        })
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, String> {
        let pairs = self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT key, value FROM kv WHERE key LIKE ?1 || '%' ORDER BY key")?;
            let rows = stmt.query_map(params![prefix], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })?;
        let mut out = Vec::with_capacity(pairs.len());
        for (key, text) in pairs {
            let value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
            out.push((key, value));
        }
        Ok(out)
    }

    fn is_healthy(&self) -> bool {
        self.with_conn(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_round_trips() {
        let store = LocalStore::in_memory().expect("in_memory");
        let value = json!({"id": "c1", "name": "Acme", "active": true});
        store.set("customers", &value).expect("set");
        let got = store.get("customers").expect("get");
        assert_eq!(got, Some(value));
    }

    #[test]
    fn get_missing_key_is_none() {
        let store = LocalStore::in_memory().expect("in_memory");
        assert_eq!(store.get("nothing").expect("get"), None);
    }

    #[test]
    fn overwrite_keeps_last_value() {
        let store = LocalStore::in_memory().expect("in_memory");
        store.set("k", &json!(1)).expect("set");
        store.set("k", &json!(2)).expect("set");
        assert_eq!(store.get("k").expect("get"), Some(json!(2)));
    }

    #[test]
    fn remove_and_clear() {
        let store = LocalStore::in_memory().expect("in_memory");
        store.set("a", &json!(1)).expect("set");
        store.set("b", &json!(2)).expect("set");
        store.remove("a").expect("remove");
        assert_eq!(store.get("a").expect("get"), None);
        store.clear().expect("clear");
        assert!(store.keys().expect("keys").is_empty());
    }

    #[test]
    fn keys_and_prefix_listing() {
        let store = LocalStore::in_memory().expect("in_memory");
        store.set("customers", &json!([])).expect("set");
        store.set("cache:report", &json!({})).expect("set");
        store.set("cache:search", &json!({})).expect("set");
        assert_eq!(store.keys().expect("keys").len(), 3);
        let cached = store.get_by_prefix("cache:").expect("prefix");
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].0, "cache:report");
    }

    #[test]
    fn capacity_pressure_evicts_cache_then_retries() {
        let store = LocalStore::in_memory_with_capacity(256).expect("in_memory");
        store
            .set("cache:big", &json!("x".repeat(150)))
            .expect("set cache");
        // Without eviction this write would blow the 256-byte budget.
        store
            .set("customers", &json!("y".repeat(150)))
            .expect("set after eviction");
        assert_eq!(store.get("cache:big").expect("get"), None);
        assert!(store.get("customers").expect("get").is_some());
    }

    #[test]
    fn capacity_exhausted_surfaces_error() {
        let store = LocalStore::in_memory_with_capacity(64).expect("in_memory");
        let err = store
            .set("customers", &json!("z".repeat(500)))
            .expect_err("should exceed budget");
        assert!(err.contains("local store full"), "unexpected error: {}", err);
    }

    #[test]
    fn is_healthy_for_open_store() {
        let store = LocalStore::in_memory().expect("in_memory");
        assert!(store.is_healthy());
    }
}
