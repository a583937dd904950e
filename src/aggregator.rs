use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{FiscalCalendar, QuarterDescriptor};
use crate::config::BillingSettings;
use crate::decimal::Money;
use crate::ledger::DemandLedger;
use crate::types::Unit;

/// dashboard rollup for one quarter or one fiscal year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub budget: Money,
    pub collected: Money,
    pub outstanding: Money,
    /// budget minus collected; negative when collection exceeds the nominal
    /// budget (penalties, ground rent on top of the area budget)
    pub uncollected: Money,
}

/// read-only rollups over the demand ledger; no write authority.
///
/// Aggregation is advisory (dashboard display) and tolerates reading a ledger
/// mid-update.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetAggregator;

impl BudgetAggregator {
    pub fn new() -> Self {
        Self
    }

    /// nominal quarterly budget from the current eligible area
    pub fn quarterly_budget(&self, units: &[Unit], settings: &BillingSettings) -> Money {
        let total_area: Decimal = units.iter().map(|u| u.billable_area()).sum();
        settings.rate_per_area_unit * total_area
    }

    /// total received against the quarter's non-cancelled demands
    pub fn collected(&self, ledger: &DemandLedger, quarter: &QuarterDescriptor) -> Money {
        ledger
            .demands_for_quarter(&quarter.value())
            .iter()
            .filter(|d| !d.is_cancelled())
            .map(|d| d.amount_paid)
            .sum()
    }

    /// total still owed against the quarter's non-cancelled demands
    pub fn outstanding(&self, ledger: &DemandLedger, quarter: &QuarterDescriptor) -> Money {
        ledger
            .demands_for_quarter(&quarter.value())
            .iter()
            .filter(|d| !d.is_cancelled())
            .map(|d| d.outstanding())
            .sum()
    }

    /// collected as a share of the quarterly budget, in percent
    pub fn quarter_fill_percentage(
        &self,
        ledger: &DemandLedger,
        quarter: &QuarterDescriptor,
        units: &[Unit],
        settings: &BillingSettings,
    ) -> Decimal {
        let budget = self.quarterly_budget(units, settings);
        if budget.is_zero() {
            return Decimal::ZERO;
        }
        (self.collected(ledger, quarter).as_decimal() / budget.as_decimal()
            * Decimal::from(100))
        .round_dp(2)
    }

    /// annual budget for a fiscal year. Policy for intra-year area changes:
    /// quarters already issued use the area snapshotted on their demands
    /// (the sum of billable base amounts); unissued quarters use the current
    /// eligible area. A stable-area building degenerates to 4x the quarterly
    /// budget.
    pub fn annual_budget(
        &self,
        calendar: &FiscalCalendar,
        fiscal_year: i32,
        units: &[Unit],
        settings: &BillingSettings,
        ledger: &DemandLedger,
    ) -> Money {
        (1..=4)
            .map(|index| {
                let quarter = calendar.quarter(fiscal_year, index);
                let issued: Vec<_> = ledger
                    .demands_for_quarter(&quarter.value())
                    .into_iter()
                    .filter(|d| d.is_billable())
                    .collect();
                if issued.is_empty() {
                    self.quarterly_budget(units, settings)
                } else {
                    issued.iter().map(|d| d.base_amount).sum()
                }
            })
            .sum()
    }

    /// share of a collection earmarked for the reserve fund, when configured
    pub fn reserve_fund_contribution(&self, collected: Money, settings: &BillingSettings) -> Money {
        match settings.reserve_fund_percentage {
            Some(rate) => collected.apply_rate(rate),
            None => Money::ZERO,
        }
    }

    /// rollup for one quarter
    pub fn quarter_summary(
        &self,
        ledger: &DemandLedger,
        quarter: &QuarterDescriptor,
        units: &[Unit],
        settings: &BillingSettings,
    ) -> FinancialSummary {
        let budget = self.quarterly_budget(units, settings);
        let collected = self.collected(ledger, quarter);
        FinancialSummary {
            budget,
            collected,
            outstanding: self.outstanding(ledger, quarter),
            uncollected: budget - collected,
        }
    }

    /// rollup across the four quarters of a fiscal year
    pub fn annual_summary(
        &self,
        calendar: &FiscalCalendar,
        fiscal_year: i32,
        ledger: &DemandLedger,
        units: &[Unit],
        settings: &BillingSettings,
    ) -> FinancialSummary {
        let budget = self.annual_budget(calendar, fiscal_year, units, settings, ledger);
        let mut collected = Money::ZERO;
        let mut outstanding = Money::ZERO;
        for index in 1..=4 {
            let quarter = calendar.quarter(fiscal_year, index);
            collected += self.collected(ledger, &quarter);
            outstanding += self.outstanding(ledger, &quarter);
        }
        FinancialSummary {
            budget,
            collected,
            outstanding,
            uncollected: budget - collected,
        }
    }
}
