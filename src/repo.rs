//! Typed CRUD over the entity collections: validate ids, stamp timestamps,
//! write through the configured store, soft-delete via the active flag.

use crate::calc::{self, CalcConfig, CommissionBreakdown};
use crate::ids::{BankPfId, CustomerId, PeriodRecordId, ProductId, TariffLineId};
use crate::models::{BankPf, Customer, PeriodRecord, Product, RecordStatus, TariffLine};
use crate::store::{self, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

pub const CUSTOMERS_KEY: &str = "customers";
pub const BANK_PF_KEY: &str = "bankPFRecords";
pub const PRODUCTS_KEY: &str = "payterProducts";
pub const TARIFF_LINES_KEY: &str = "tabelaRecords";
pub const PERIOD_RECORDS_KEY: &str = "hakedisRecords";

/// The fixed collection set known to migration and backup.
pub const COLLECTION_KEYS: &[&str] = &[
    CUSTOMERS_KEY,
    BANK_PF_KEY,
    PRODUCTS_KEY,
    TARIFF_LINES_KEY,
    PERIOD_RECORDS_KEY,
];

pub struct Repo<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> Repo<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, String> {
        match self.store.get(key)? {
            Some(value) => {
                let data = store::unwrap_envelope(value);
                serde_json::from_value(data).map_err(|e| format!("{}: {}", key, e))
            }
            None => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), String> {
        let data = serde_json::to_value(items).map_err(|e| e.to_string())?;
        self.store.set(key, &store::wrap(data))
    }

    fn upsert_in<T, F>(&self, key: &str, item: T, id_of: F) -> Result<(), String>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&T) -> &str,
    {
        let mut items: Vec<T> = self.load(key)?;
        match items.iter().position(|x| id_of(x) == id_of(&item)) {
            Some(pos) => items[pos] = item,
            None => items.push(item),
        }
        self.save(key, &items)
    }

    // --- Customers ---

    pub fn customers(&self) -> Result<Vec<Customer>, String> {
        self.load(CUSTOMERS_KEY)
    }

    pub fn upsert_customer(&self, mut customer: Customer) -> Result<Customer, String> {
        prepare_entity(&mut customer.id, &mut customer.created_at, &mut customer.updated_at)?;
        CustomerId::parse(&customer.id)?;
        self.upsert_in(CUSTOMERS_KEY, customer.clone(), |c| c.id.as_str())?;
        Ok(customer)
    }

    /// Soft delete: flips the active flag, never removes the row.
    pub fn deactivate_customer(&self, id: &str) -> Result<(), String> {
        CustomerId::parse(id)?;
        let mut customers = self.customers()?;
        let customer = customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| format!("Customer not found: {}", id))?;
        customer.active = false;
        customer.updated_at = now();
        self.save(CUSTOMERS_KEY, &customers)
    }

    /// Case-insensitive substring search over name, tax number and email.
    pub fn search_customers(&self, query: &str) -> Result<Vec<Customer>, String> {
        let q = query.to_lowercase();
        Ok(self
            .customers()?
            .into_iter()
            .filter(|c| {
                c.active
                    && (c.name.to_lowercase().contains(&q)
                        || c.tax_number.as_deref().is_some_and(|t| t.to_lowercase().contains(&q))
                        || c.email.as_deref().is_some_and(|e| e.to_lowercase().contains(&q)))
            })
            .collect())
    }

    // --- Bank / PF entities ---

    pub fn bank_pfs(&self) -> Result<Vec<BankPf>, String> {
        self.load(BANK_PF_KEY)
    }

    pub fn upsert_bank_pf(&self, mut bank: BankPf) -> Result<BankPf, String> {
        prepare_entity(&mut bank.id, &mut bank.created_at, &mut bank.updated_at)?;
        BankPfId::parse(&bank.id)?;
        self.upsert_in(BANK_PF_KEY, bank.clone(), |b| b.id.as_str())?;
        Ok(bank)
    }

    pub fn deactivate_bank_pf(&self, id: &str) -> Result<(), String> {
        BankPfId::parse(id)?;
        let mut banks = self.bank_pfs()?;
        let bank = banks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| format!("Bank/PF not found: {}", id))?;
        bank.active = false;
        bank.updated_at = now();
        self.save(BANK_PF_KEY, &banks)
    }

    // --- Products ---

    pub fn products(&self) -> Result<Vec<Product>, String> {
        self.load(PRODUCTS_KEY)
    }

    pub fn upsert_product(&self, mut product: Product) -> Result<Product, String> {
        prepare_entity(&mut product.id, &mut product.created_at, &mut product.updated_at)?;
        ProductId::parse(&product.id)?;
        self.upsert_in(PRODUCTS_KEY, product.clone(), |p| p.id.as_str())?;
        Ok(product)
    }

    pub fn deactivate_product(&self, id: &str) -> Result<(), String> {
        ProductId::parse(id)?;
        let mut products = self.products()?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| format!("Product not found: {}", id))?;
        product.active = false;
        product.updated_at = now();
        self.save(PRODUCTS_KEY, &products)
    }

    // --- Tariff lines ---

    pub fn tariff_lines(&self) -> Result<Vec<TariffLine>, String> {
        self.load(TARIFF_LINES_KEY)
    }

    pub fn tariff_lines_for_bank(&self, bank_pf_id: &str) -> Result<Vec<TariffLine>, String> {
        Ok(self
            .tariff_lines()?
            .into_iter()
            .filter(|l| l.bank_pf_id == bank_pf_id && l.active)
            .collect())
    }

    pub fn upsert_tariff_line(&self, mut line: TariffLine) -> Result<TariffLine, String> {
        if line.id.is_empty() {
            line.id = Uuid::new_v4().to_string();
        }
        TariffLineId::parse(&line.id)?;
        self.upsert_in(TARIFF_LINES_KEY, line.clone(), |l| l.id.as_str())?;
        Ok(line)
    }

    pub fn deactivate_tariff_line(&self, id: &str) -> Result<(), String> {
        TariffLineId::parse(id)?;
        let mut lines = self.tariff_lines()?;
        let line = lines
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| format!("Tariff line not found: {}", id))?;
        line.active = false;
        self.save(TARIFF_LINES_KEY, &lines)
    }

    // --- Period records ---

    pub fn period_records(&self) -> Result<Vec<PeriodRecord>, String> {
        self.load(PERIOD_RECORDS_KEY)
    }

    pub fn period_record(&self, id: &str) -> Result<Option<PeriodRecord>, String> {
        PeriodRecordId::parse(id)?;
        Ok(self.period_records()?.into_iter().find(|r| r.id == id))
    }

    /// Create or update a period record. A record whose stored copy is
    /// finalized is read-mostly: mutation is rejected (soft delete stays
    /// possible via `deactivate_period_record`).
    pub fn upsert_period_record(&self, mut record: PeriodRecord) -> Result<PeriodRecord, String> {
        prepare_entity(&mut record.id, &mut record.created_at, &mut record.updated_at)?;
        PeriodRecordId::parse(&record.id)?;
        let records = self.period_records()?;
        if let Some(existing) = records.iter().find(|r| r.id == record.id) {
            if existing.status == RecordStatus::Finalized {
                return Err(format!(
                    "Period record {} is finalized and cannot be modified",
                    record.id
                ));
            }
        }
        self.upsert_in(PERIOD_RECORDS_KEY, record.clone(), |r| r.id.as_str())?;
        Ok(record)
    }

    pub fn finalize_period_record(&self, id: &str) -> Result<(), String> {
        PeriodRecordId::parse(id)?;
        let mut records = self.period_records()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| format!("Period record not found: {}", id))?;
        record.status = RecordStatus::Finalized;
        record.updated_at = now();
        self.save(PERIOD_RECORDS_KEY, &records)
    }

    pub fn deactivate_period_record(&self, id: &str) -> Result<(), String> {
        PeriodRecordId::parse(id)?;
        let mut records = self.period_records()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| format!("Period record not found: {}", id))?;
        record.active = false;
        record.updated_at = now();
        self.save(PERIOD_RECORDS_KEY, &records)
    }

    /// Commission breakdown for a stored period record against the stored
    /// tariff lines.
    pub fn breakdown(&self, record_id: &str, config: &CalcConfig) -> Result<CommissionBreakdown, String> {
        let record = self
            .period_record(record_id)?
            .ok_or_else(|| format!("Period record not found: {}", record_id))?;
        let lines = self.tariff_lines()?;
        Ok(calc::calculate(&record, &lines, config))
    }
}

/// Fill in id and timestamps for a new or updated entity.
fn prepare_entity(id: &mut String, created_at: &mut String, updated_at: &mut String) -> Result<(), String> {
    if id.is_empty() {
        *id = Uuid::new_v4().to_string();
    }
    let ts = now();
    if created_at.is_empty() {
        *created_at = ts.clone();
    }
    *updated_at = ts;
    Ok(())
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
