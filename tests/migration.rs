//! Bulk migration of the entity collections between stores.

mod common;

use common::{mem, FailingStore, SelectiveFailStore};
use oxivo_client_core::migration::{migrate_collections, migrate_keys};
use oxivo_client_core::KeyValueStore;
use serde_json::json;

#[test]
fn three_populated_keys_migrate_cleanly() {
    let source = mem();
    let target = mem();
    source.set("customers", &json!([{"id": "c1"}])).expect("seed");
    source.set("bankPFRecords", &json!([{"id": "b1"}])).expect("seed");
    source.set("payterProducts", &json!([{"id": "p1"}])).expect("seed");

    let report = migrate_collections(&*source, &*target);
    assert!(report.success);
    assert_eq!(report.migrated, 3);
    assert!(report.errors.is_empty());
    assert_eq!(
        target.get("bankPFRecords").expect("get"),
        Some(json!([{"id": "b1"}]))
    );
}

#[test]
fn absent_collections_are_skipped_not_errors() {
    let source = mem();
    let target = mem();
    let report = migrate_collections(&*source, &*target);
    assert!(report.success);
    assert_eq!(report.migrated, 0);
    assert!(report.errors.is_empty());
}

#[test]
fn per_key_failures_are_collected_and_migration_continues() {
    let source = mem();
    source.set("customers", &json!([1])).expect("seed");
    source.set("bankPFRecords", &json!([2])).expect("seed");
    source.set("payterProducts", &json!([3])).expect("seed");
    let target = SelectiveFailStore::new("bankPF");

    let report = migrate_collections(&*source, &target);
    assert!(!report.success);
    assert_eq!(report.migrated, 2, "remaining keys still copied");
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("bankPFRecords"));
    assert_eq!(target.get("payterProducts").expect("get"), Some(json!([3])));
}

#[test]
fn unreachable_target_fails_every_populated_key() {
    let source = mem();
    source.set("customers", &json!([1])).expect("seed");
    source.set("hakedisRecords", &json!([2])).expect("seed");

    let report = migrate_collections(&*source, &FailingStore);
    assert!(!report.success);
    assert_eq!(report.migrated, 0);
    assert_eq!(report.errors.len(), 2);
}

#[test]
fn unreachable_source_reports_read_failures() {
    let target = mem();
    let report = migrate_keys(&FailingStore, &*target, &["customers"]);
    assert!(!report.success);
    assert_eq!(report.migrated, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("read failed"));
}

#[test]
fn reverse_direction_syncs_remote_into_local() {
    let remote = mem();
    let local = mem();
    remote.set("tabelaRecords", &json!([{"id": "t1"}])).expect("seed");

    let report = migrate_collections(&*remote, &*local);
    assert!(report.success);
    assert_eq!(report.migrated, 1);
    assert_eq!(
        local.get("tabelaRecords").expect("get"),
        Some(json!([{"id": "t1"}]))
    );
}
