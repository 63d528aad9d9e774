//! Client core for the Oxivo reseller application: entity collections,
//! commission ("hakediş") calculation, and a storage layer that mirrors
//! reads/writes between a local SQLite store and a remote JSON API under a
//! configurable strategy.

use std::path::Path;
use std::sync::Arc;

mod backoff;
pub mod backup;
pub mod calc;
pub mod config;
pub mod debounce;
pub mod hybrid_store;
pub mod ids;
pub mod local_store;
pub mod migration;
pub mod models;
pub mod remote_store;
pub mod repo;
pub mod store;

pub use backup::BackupDocument;
pub use calc::{calculate, CalcConfig, CommissionBreakdown, LineBreakdown, SideTotals};
pub use config::{CoreConfig, RemoteConfig};
pub use hybrid_store::HybridStore;
pub use local_store::LocalStore;
pub use migration::MigrationReport;
pub use models::{
    BankPf, Customer, ManualAdjustments, PeriodRecord, Product, RecordStatus, RevenueModel,
    TariffLine, TenorRate, Tenor, VolumeEntry,
};
pub use remote_store::RemoteStore;
pub use repo::Repo;
pub use store::{KeyValueStore, Strategy};

/// Owns the configured stores and business constants. Construct one per
/// application and pass it around; there is no module-level mutable state.
pub struct CoreContext {
    store: HybridStore,
    calc: CalcConfig,
}

impl CoreContext {
    pub fn new(config: CoreConfig) -> Result<Self, String> {
        let dir = Path::new(&config.storage_dir);
        let local = match config.local_capacity_bytes {
            Some(cap) => LocalStore::open_with_capacity(dir, cap)?,
            None => LocalStore::open(dir)?,
        };
        let remote = RemoteStore::new(config.remote);
        Ok(Self::with_stores(
            Arc::new(local),
            Arc::new(remote),
            config.strategy,
            config.calc,
        ))
    }

    pub fn from_env() -> Result<Self, String> {
        Self::new(CoreConfig::from_env())
    }

    /// Wire a context from pre-built stores; tests use this to substitute
    /// backends.
    pub fn with_stores(
        local: Arc<dyn KeyValueStore>,
        remote: Arc<dyn KeyValueStore>,
        strategy: Strategy,
        calc: CalcConfig,
    ) -> Self {
        Self {
            store: HybridStore::new(local, remote, strategy),
            calc,
        }
    }

    pub fn store(&self) -> &HybridStore {
        &self.store
    }

    pub fn repo(&self) -> Repo<'_> {
        Repo::new(&self.store)
    }

    pub fn calc_config(&self) -> &CalcConfig {
        &self.calc
    }

    pub fn strategy(&self) -> Strategy {
        self.store.strategy()
    }

    pub fn set_strategy(&self, strategy: Strategy) {
        self.store.set_strategy(strategy);
    }

    pub fn is_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    /// Commission breakdown for a stored period record, using the context's
    /// business constants.
    pub fn breakdown(&self, record_id: &str) -> Result<CommissionBreakdown, String> {
        self.repo().breakdown(record_id, &self.calc)
    }

    /// Bulk-copy the entity collections from the local store to the remote.
    pub fn migrate_to_remote(&self) -> MigrationReport {
        migration::migrate_collections(&*self.store.local(), &*self.store.remote())
    }

    /// Bulk-copy the entity collections from the remote store to the local.
    pub fn sync_to_local(&self) -> MigrationReport {
        migration::migrate_collections(&*self.store.remote(), &*self.store.local())
    }

    pub fn export_backup(&self) -> Result<BackupDocument, String> {
        backup::export_snapshot(&self.store)
    }

    pub fn restore_backup(&self, doc: &BackupDocument) -> Result<usize, String> {
        backup::restore_snapshot(&self.store, doc)
    }
}
