//! One-shot bulk copy of the entity collections between two stores, for
//! moving data from the local store to the remote backend or back.

use crate::repo::COLLECTION_KEYS;
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MigrationReport {
    /// True only when no per-key error occurred, regardless of how many keys
    /// were copied.
    pub success: bool,
    pub migrated: usize,
    pub errors: Vec<String>,
}

/// Copy `keys` from `source` to `target`, continuing past per-key failures.
/// Keys absent from the source are skipped, not errors.
pub fn migrate_keys(
    source: &dyn KeyValueStore,
    target: &dyn KeyValueStore,
    keys: &[&str],
) -> MigrationReport {
    let mut report = MigrationReport::default();
    for key in keys {
        match source.get(key) {
            Ok(Some(value)) => match target.set(key, &value) {
                Ok(()) => report.migrated += 1,
                Err(e) => report.errors.push(format!("{}: write failed: {}", key, e)),
            },
            Ok(None) => {
                log::debug!("migration: {} not present in source, skipping", key);
            }
            Err(e) => report.errors.push(format!("{}: read failed: {}", key, e)),
        }
    }
    report.success = report.errors.is_empty();
    log::info!(
        "migration: {} keys copied, {} errors",
        report.migrated,
        report.errors.len()
    );
    report
}

/// Copy the fixed entity-collection set between stores.
pub fn migrate_collections(
    source: &dyn KeyValueStore,
    target: &dyn KeyValueStore,
) -> MigrationReport {
    migrate_keys(source, target, COLLECTION_KEYS)
}
