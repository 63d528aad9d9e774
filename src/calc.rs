//! Commission calculator: breakdown of a period record's earnings between the
//! reseller (PF) side and the platform (OXIVO) side.
//!
//! Pure functions of the period record plus its referenced tariff lines; no
//! I/O and no hidden state. Missing tariff lines or missing tenor rates
//! contribute zero instead of raising an error. Monetary math is plain f64.

use crate::models::{PeriodRecord, RevenueModel, TariffLine, Tenor};
use serde::{Deserialize, Serialize};

/// Business constants applied by the calculator. The defaults reproduce the
/// documented behavior: manual extra volume priced at 1%, flat 20% VAT.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CalcConfig {
    /// Fraction applied to manual extra-volume entries.
    pub manual_volume_rate: f64,
    /// Fraction added on top of each side's gross.
    pub vat_rate: f64,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            manual_volume_rate: 0.01,
            vat_rate: 0.20,
        }
    }
}

/// One computed row of the breakdown. Amounts are zero when the referenced
/// tariff line or its rate for the tenor is missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LineBreakdown {
    pub tariff_line_id: String,
    pub tenor: Tenor,
    pub volume: f64,
    pub earnings: f64,
    pub reseller_amount: f64,
    pub platform_amount: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SideTotals {
    pub gross: f64,
    pub vat: f64,
    pub net: f64,
}

/// Full breakdown for a period record. Derived data: recomputed on demand,
/// never the source of truth.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommissionBreakdown {
    pub lines: Vec<LineBreakdown>,
    pub reseller: SideTotals,
    pub platform: SideTotals,
    pub grand_total: f64,
}

/// Compute the commission breakdown for a period record against its tariff
/// lines. Zero-volume entries produce no row.
pub fn calculate(
    record: &PeriodRecord,
    tariff_lines: &[TariffLine],
    config: &CalcConfig,
) -> CommissionBreakdown {
    let mut lines = Vec::new();
    let mut reseller_gross = 0.0_f64;
    let mut platform_gross = 0.0_f64;

    for entry in &record.volumes {
        if entry.volume == 0.0 {
            continue;
        }
        let rate_entry = tariff_lines
            .iter()
            .find(|l| l.id == entry.tariff_line_id)
            .and_then(|l| l.rate_for(entry.tenor).map(|r| (l.revenue_model, r)));
        let (earnings, reseller_amount, platform_amount) = match rate_entry {
            Some((model, rate)) => {
                // FixedCommission rates are percentages; normalize to a fraction.
                let unit = match model {
                    RevenueModel::FixedCommission => rate.rate / 100.0,
                    RevenueModel::RevenueShare => rate.rate,
                };
                let earnings = entry.volume * unit;
                (
                    earnings,
                    earnings * rate.reseller_percent / 100.0,
                    earnings * rate.platform_percent / 100.0,
                )
            }
            None => (0.0, 0.0, 0.0),
        };
        reseller_gross += reseller_amount;
        platform_gross += platform_amount;
        lines.push(LineBreakdown {
            tariff_line_id: entry.tariff_line_id.clone(),
            tenor: entry.tenor,
            volume: entry.volume,
            earnings,
            reseller_amount,
            platform_amount,
        });
    }

    reseller_gross += record.reseller_manual.extra_volume * config.manual_volume_rate;
    reseller_gross += record.reseller_manual.extra_revenue;
    reseller_gross -= record.reseller_manual.extra_deduction;

    platform_gross += record.platform_manual.extra_volume * config.manual_volume_rate;
    platform_gross += record.platform_manual.extra_revenue;
    platform_gross -= record.platform_manual.extra_deduction;

    let reseller = side_totals(reseller_gross, config.vat_rate);
    let platform = side_totals(platform_gross, config.vat_rate);
    let grand_total = reseller.net + platform.net;

    CommissionBreakdown {
        lines,
        reseller,
        platform,
        grand_total,
    }
}

fn side_totals(gross: f64, vat_rate: f64) -> SideTotals {
    let vat = gross * vat_rate;
    SideTotals {
        gross,
        vat,
        net: gross + vat,
    }
}
