//! Versioned JSON snapshot of every entity collection, for backup/export and
//! restore.

use crate::repo::COLLECTION_KEYS;
use crate::store::{self, KeyValueStore, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackupDocument {
    pub version: u32,
    pub exported_at: String,
    /// Collection key -> un-enveloped collection data. Absent collections are
    /// omitted.
    pub collections: BTreeMap<String, Value>,
}

/// Snapshot all known collections from a store.
pub fn export_snapshot(store: &dyn KeyValueStore) -> Result<BackupDocument, String> {
    let mut collections = BTreeMap::new();
    for key in COLLECTION_KEYS {
        if let Some(value) = store.get(key)? {
            collections.insert(key.to_string(), store::unwrap_envelope(value));
        }
    }
    Ok(BackupDocument {
        version: SCHEMA_VERSION,
        exported_at: chrono::Utc::now().to_rfc3339(),
        collections,
    })
}

/// Write a snapshot back into a store. Returns the number of collections
/// restored. Unknown collection keys in the document are restored as-is;
/// collections already present in the store are overwritten.
pub fn restore_snapshot(store: &dyn KeyValueStore, doc: &BackupDocument) -> Result<usize, String> {
    let mut restored = 0;
    for (key, data) in &doc.collections {
        store.set(key, &store::wrap(data.clone()))?;
        restored += 1;
    }
    log::info!("backup: restored {} collections", restored);
    Ok(restored)
}
