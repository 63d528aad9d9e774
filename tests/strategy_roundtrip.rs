//! Hybrid-store strategy semantics: round-trips, fall-through reads, caching,
//! fallbacks and background mirroring.
//!
//! Tests pin a long mirror window and flush explicitly so background behavior
//! is deterministic.

mod common;

use common::{mem, FailingStore};
use oxivo_client_core::{HybridStore, KeyValueStore, LocalStore, Strategy};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const WINDOW: Duration = Duration::from_secs(30);

fn hybrid(local: Arc<LocalStore>, remote: Arc<LocalStore>, strategy: Strategy) -> HybridStore {
    HybridStore::with_mirror_window(local, remote, strategy, WINDOW)
}

#[test]
fn local_only_round_trip_leaves_remote_untouched() {
    let local = mem();
    let remote = mem();
    let store = hybrid(local.clone(), remote.clone(), Strategy::LocalOnly);
    let value = json!({"customers": [{"id": "c1"}]});
    store.set("customers", &value).expect("set");
    assert_eq!(store.get("customers").expect("get"), Some(value.clone()));
    assert_eq!(local.get("customers").expect("get"), Some(value));
    assert_eq!(remote.get("customers").expect("get"), None);
}

#[test]
fn remote_only_round_trip_leaves_local_untouched() {
    let local = mem();
    let remote = mem();
    let store = hybrid(local.clone(), remote.clone(), Strategy::RemoteOnly);
    let value = json!([1, 2, 3]);
    store.set("payterProducts", &value).expect("set");
    assert_eq!(store.get("payterProducts").expect("get"), Some(value.clone()));
    assert_eq!(remote.get("payterProducts").expect("get"), Some(value));
    assert_eq!(local.get("payterProducts").expect("get"), None);
}

#[test]
fn local_first_set_writes_local_sync_and_mirrors_remote_on_flush() {
    let local = mem();
    let remote = mem();
    let store = hybrid(local.clone(), remote.clone(), Strategy::LocalFirst);
    let value = json!({"name": "Acme"});
    store.set("customers", &value).expect("set");
    assert_eq!(local.get("customers").expect("get"), Some(value.clone()));
    assert_eq!(remote.get("customers").expect("get"), None);

    let flushed = store.flush_mirrors();
    assert_eq!(flushed, 1);
    assert_eq!(remote.get("customers").expect("get"), Some(value));
}

#[test]
fn local_first_mirror_coalesces_rapid_writes_to_last_value() {
    let local = mem();
    let remote = mem();
    let store = hybrid(local.clone(), remote.clone(), Strategy::LocalFirst);
    store.set("customers", &json!(1)).expect("set");
    store.set("customers", &json!(2)).expect("set");
    store.set("customers", &json!(3)).expect("set");

    let flushed = store.flush_mirrors();
    assert_eq!(flushed, 1, "rapid writes of one key coalesce to one mirror");
    assert_eq!(remote.get("customers").expect("get"), Some(json!(3)));
}

#[test]
fn local_first_get_falls_through_to_remote_and_caches() {
    let local = mem();
    let remote = mem();
    let value = json!({"only": "remote"});
    remote.set("tabelaRecords", &value).expect("seed remote");

    let store = hybrid(local.clone(), remote.clone(), Strategy::LocalFirst);
    assert_eq!(store.get("tabelaRecords").expect("get"), Some(value.clone()));

    // Remote copy goes away; the cached local copy must still serve reads.
    remote.remove("tabelaRecords").expect("remove remote");
    assert_eq!(store.get("tabelaRecords").expect("get"), Some(value));
}

#[test]
fn remote_first_get_prefers_remote_and_caches_locally() {
    let local = mem();
    let remote = mem();
    remote.set("customers", &json!("remote copy")).expect("seed");
    local.set("customers", &json!("stale local copy")).expect("seed");

    let store = hybrid(local.clone(), remote.clone(), Strategy::RemoteFirst);
    assert_eq!(store.get("customers").expect("get"), Some(json!("remote copy")));
    assert_eq!(local.get("customers").expect("get"), Some(json!("remote copy")));
}

#[test]
fn remote_first_set_writes_remote_sync_and_caches_local_on_flush() {
    let local = mem();
    let remote = mem();
    let store = hybrid(local.clone(), remote.clone(), Strategy::RemoteFirst);
    let value = json!({"id": "h1"});
    store.set("hakedisRecords", &value).expect("set");
    assert_eq!(remote.get("hakedisRecords").expect("get"), Some(value.clone()));
    assert_eq!(local.get("hakedisRecords").expect("get"), None);

    store.flush_mirrors();
    assert_eq!(local.get("hakedisRecords").expect("get"), Some(value));
}

#[test]
fn local_first_set_falls_back_to_remote_when_local_fails() {
    let remote = mem();
    let store = HybridStore::with_mirror_window(
        Arc::new(FailingStore),
        remote.clone(),
        Strategy::LocalFirst,
        WINDOW,
    );
    let value = json!({"rescued": true});
    store.set("customers", &value).expect("fallback set");
    assert_eq!(remote.get("customers").expect("get"), Some(value));
}

#[test]
fn remote_first_get_falls_back_to_local_when_remote_fails() {
    let local = mem();
    local.set("customers", &json!("offline copy")).expect("seed");
    let store = HybridStore::with_mirror_window(
        local,
        Arc::new(FailingStore),
        Strategy::RemoteFirst,
        WINDOW,
    );
    assert_eq!(store.get("customers").expect("get"), Some(json!("offline copy")));
}

#[test]
fn both_backends_failing_surfaces_combined_error() {
    let store = HybridStore::with_mirror_window(
        Arc::new(FailingStore),
        Arc::new(FailingStore),
        Strategy::LocalFirst,
        WINDOW,
    );
    let err = store.get("customers").expect_err("both sides down");
    assert!(err.contains("fallback"), "unexpected error: {}", err);
}

#[test]
fn remove_drops_pending_mirror_for_the_key() {
    let local = mem();
    let remote = mem();
    let store = hybrid(local.clone(), remote.clone(), Strategy::LocalFirst);
    store.set("customers", &json!("short lived")).expect("set");
    store.remove("customers").expect("remove");

    assert_eq!(store.flush_mirrors(), 0, "pending mirror was discarded");
    assert_eq!(local.get("customers").expect("get"), None);
    assert_eq!(remote.get("customers").expect("get"), None);
}

#[test]
fn keys_and_prefix_follow_the_primary_side() {
    let local = mem();
    let remote = mem();
    local.set("cache:a", &json!(1)).expect("seed");
    local.set("customers", &json!(2)).expect("seed");
    remote.set("remoteOnlyKey", &json!(3)).expect("seed");

    let store = hybrid(local, remote, Strategy::LocalFirst);
    let keys = store.keys().expect("keys");
    assert_eq!(keys, vec!["cache:a".to_string(), "customers".to_string()]);
    let cached = store.get_by_prefix("cache:").expect("prefix");
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].0, "cache:a");
}

#[test]
fn health_is_lenient_partial_availability_counts() {
    let healthy_local = hybrid(mem(), mem(), Strategy::LocalFirst);
    assert!(healthy_local.is_healthy());

    let half = HybridStore::with_mirror_window(
        mem(),
        Arc::new(FailingStore),
        Strategy::LocalFirst,
        WINDOW,
    );
    assert!(half.is_healthy(), "one healthy backend is enough");

    let none = HybridStore::with_mirror_window(
        Arc::new(FailingStore),
        Arc::new(FailingStore),
        Strategy::LocalFirst,
        WINDOW,
    );
    assert!(!none.is_healthy());
}

#[test]
fn strategy_switch_applies_to_subsequent_operations() {
    let local = mem();
    let remote = mem();
    let store = hybrid(local.clone(), remote.clone(), Strategy::LocalOnly);
    store.set("customers", &json!("local era")).expect("set");

    store.set_strategy(Strategy::RemoteOnly);
    store.set("customers", &json!("remote era")).expect("set");

    assert_eq!(local.get("customers").expect("get"), Some(json!("local era")));
    assert_eq!(remote.get("customers").expect("get"), Some(json!("remote era")));
}
