//! Data models for customers, bank/PF entities, products, tariff lines and
//! period records. Wire format uses strings for IDs and dates (JSON
//! compatibility with the persisted collections).

use serde::{Deserialize, Serialize};

/// Settlement maturity bucket ("vade"). Determines which commission rate of a
/// tariff line applies to a transaction volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tenor {
    #[serde(rename = "D+1")]
    D1,
    #[serde(rename = "D+7")]
    D7,
    #[serde(rename = "D+14")]
    D14,
    #[serde(rename = "D+31")]
    D31,
}

impl Tenor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tenor::D1 => "D+1",
            Tenor::D7 => "D+7",
            Tenor::D14 => "D+14",
            Tenor::D31 => "D+31",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "D+1" | "D1" => Some(Tenor::D1),
            "D+7" | "D7" => Some(Tenor::D7),
            "D+14" | "D14" => Some(Tenor::D14),
            "D+31" | "D31" => Some(Tenor::D31),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tenor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a tariff line turns volume into earnings: `FixedCommission` carries a
/// percentage of volume, `RevenueShare` carries a flat per-unit value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueModel {
    RevenueShare,
    FixedCommission,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Finalized,
}

/// Per-tenor commission rate of a tariff line. `rate` is a percentage for
/// `FixedCommission` lines and a flat per-unit value for `RevenueShare` lines.
/// The two share percents are independent inputs and need not sum to 100.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TenorRate {
    pub tenor: Tenor,
    pub rate: f64,
    pub reseller_percent: f64,
    pub platform_percent: f64,
}

/// Tariff line ("tabela"): a commission rule owned by a bank/PF entity.
/// Read-only input to the commission calculator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TariffLine {
    pub id: String,
    pub bank_pf_id: String,
    pub product_type: String,
    pub card_type: String,
    #[serde(default)]
    pub international: bool,
    pub revenue_model: RevenueModel,
    pub rates: Vec<TenorRate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl TariffLine {
    /// Rate entry for a tenor, if the line defines one.
    pub fn rate_for(&self, tenor: Tenor) -> Option<&TenorRate> {
        self.rates.iter().find(|r| r.tenor == tenor)
    }
}

/// One transaction-volume figure of a period record, keyed by tariff line and
/// tenor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VolumeEntry {
    pub tariff_line_id: String,
    pub tenor: Tenor,
    pub volume: f64,
}

/// Manual adjustments entered per side: extra volume (priced at the configured
/// default rate) plus currency amounts added/subtracted before VAT.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ManualAdjustments {
    #[serde(default)]
    pub extra_volume: f64,
    #[serde(default)]
    pub extra_revenue: f64,
    #[serde(default)]
    pub extra_deduction: f64,
}

/// Period earnings-reconciliation record ("hakediş"). Mutable while `Draft`,
/// read-mostly once `Finalized`; soft-deleted via `active`, never hard-deleted
/// by normal flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PeriodRecord {
    pub id: String,
    pub customer_id: String,
    pub commission_group: String,
    /// Billing period, `YYYY-MM`.
    pub period: String,
    pub tenor: Tenor,
    #[serde(default)]
    pub volumes: Vec<VolumeEntry>,
    #[serde(default)]
    pub reseller_manual: ManualAdjustments,
    #[serde(default)]
    pub platform_manual: ManualAdjustments,
    pub status: RecordStatus,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub tax_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Bank / payment-facilitator entity. Owns its tariff lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BankPf {
    pub id: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn default_active() -> bool {
    true
}
