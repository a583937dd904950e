use serde::{Deserialize, Serialize};

use crate::calendar::FiscalAnchor;
use crate::decimal::{Money, Rate};
use crate::errors::{BillingError, Result};

/// per-building financial configuration as stored; rate and lead days may be
/// unset until a manager completes setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSettings {
    /// service charge per area unit per quarter
    pub rate_per_area_unit: Option<Money>,
    /// how many days before the quarter start demands fall due
    pub due_lead_days: Option<u32>,
    pub fiscal_year_anchor: FiscalAnchor,
    /// share of collections earmarked for the reserve fund
    pub reserve_fund_percentage: Option<Rate>,
}

impl FinancialSettings {
    pub fn new(anchor: FiscalAnchor) -> Self {
        Self {
            rate_per_area_unit: None,
            due_lead_days: None,
            fiscal_year_anchor: anchor,
            reserve_fund_percentage: None,
        }
    }

    /// validate into an immutable billing snapshot; billing cannot be issued
    /// unless the rate is positive and lead days are set
    pub fn validate_for_billing(&self) -> Result<BillingSettings> {
        self.fiscal_year_anchor.validate()?;

        let rate = match self.rate_per_area_unit {
            Some(rate) if rate.is_positive() => rate,
            _ => {
                return Err(BillingError::SettingsIncomplete {
                    missing: "rate_per_area_unit",
                })
            }
        };

        let due_lead_days = self.due_lead_days.ok_or(BillingError::SettingsIncomplete {
            missing: "due_lead_days",
        })?;

        Ok(BillingSettings {
            rate_per_area_unit: rate,
            due_lead_days,
            fiscal_year_anchor: self.fiscal_year_anchor,
            reserve_fund_percentage: self.reserve_fund_percentage,
        })
    }
}

/// validated, immutable snapshot passed through every billing operation;
/// later settings edits never alter demands issued from an earlier snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillingSettings {
    pub rate_per_area_unit: Money,
    pub due_lead_days: u32,
    pub fiscal_year_anchor: FiscalAnchor,
    pub reserve_fund_percentage: Option<Rate>,
}
