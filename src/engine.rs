use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;

use crate::aggregator::{BudgetAggregator, FinancialSummary};
use crate::calendar::{FiscalCalendar, QuarterDescriptor};
use crate::config::FinancialSettings;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::events::{Event, EventStore};
use crate::issuance::{IssuanceCoordinator, IssuanceOutcome, IssuancePlan, NotificationSink, PlanMode};
use crate::ledger::{DemandFilter, DemandLedger, PaymentRecord, ServiceChargeDemand};
use crate::types::{BuildingId, DemandId, PaymentMethod, UnitId, Unit};

/// how far the manager-facing quarter picker looks back and ahead
const PICKER_PAST_QUARTERS: usize = 4;
const PICKER_FUTURE_QUARTERS: usize = 2;

/// the entry point consumed by the UI/form layer.
///
/// Settings and the unit list belong to collaborators (building configuration
/// and the units store); they are fetched once per operation by the caller
/// and passed through, never read from ambient state.
pub struct BillingEngine {
    pub building_id: BuildingId,
    pub ledger: DemandLedger,
    pub events: EventStore,
    coordinator: IssuanceCoordinator,
    aggregator: BudgetAggregator,
}

impl BillingEngine {
    pub fn new(building_id: BuildingId) -> Self {
        Self::with_ledger(building_id, DemandLedger::new())
    }

    /// resume from a previously persisted ledger
    pub fn with_ledger(building_id: BuildingId, ledger: DemandLedger) -> Self {
        Self {
            building_id,
            ledger,
            events: EventStore::new(),
            coordinator: IssuanceCoordinator::new(building_id),
            aggregator: BudgetAggregator::new(),
        }
    }

    fn calendar(settings: &FinancialSettings) -> Result<FiscalCalendar> {
        FiscalCalendar::new(settings.fiscal_year_anchor)
    }

    /// quarters around as_of for display pickers
    pub fn quarter_options(
        &self,
        settings: &FinancialSettings,
        as_of: NaiveDate,
        past_count: usize,
        future_count: usize,
    ) -> Result<Vec<QuarterDescriptor>> {
        let calendar = Self::calendar(settings)?;
        Ok(calendar.enumerate_quarters(as_of, past_count, future_count))
    }

    /// quarters a manager can still act on: not yet issued, or carrying an
    /// unpaid balance; fully settled historical quarters are hidden
    pub fn actionable_quarters(
        &self,
        settings: &FinancialSettings,
        as_of: NaiveDate,
    ) -> Result<Vec<QuarterDescriptor>> {
        let calendar = Self::calendar(settings)?;
        Ok(calendar
            .enumerate_quarters(as_of, PICKER_PAST_QUARTERS, PICKER_FUTURE_QUARTERS)
            .into_iter()
            .filter(|q| self.coordinator.is_actionable(q, &self.ledger))
            .collect())
    }

    /// decide between first issuance and the reminder path for the selected
    /// quarter. An empty eligible-unit list is surfaced as NoEligibleUnits.
    pub fn plan_issuance_or_reminder(
        &self,
        settings: &FinancialSettings,
        units: &[Unit],
        quarter_value: &str,
    ) -> Result<IssuancePlan> {
        let calendar = Self::calendar(settings)?;
        let quarter = calendar.parse_value(quarter_value)?;
        let plan = self.coordinator.plan(&quarter, units, settings, &self.ledger)?;

        if plan.mode == PlanMode::Issue && plan.candidates.is_empty() {
            return Err(BillingError::NoEligibleUnits {
                quarter: quarter.value(),
            });
        }
        Ok(plan)
    }

    /// create demands for the selected units; repeat calls are safe
    pub fn commit_issuance(
        &mut self,
        settings: &FinancialSettings,
        units: &[Unit],
        quarter_value: &str,
        selected_unit_ids: &[UnitId],
        sink: &mut dyn NotificationSink,
        time_provider: &SafeTimeProvider,
    ) -> Result<IssuanceOutcome> {
        let calendar = Self::calendar(settings)?;
        let quarter = calendar.parse_value(quarter_value)?;
        self.coordinator.commit(
            &quarter,
            selected_unit_ids,
            units,
            settings,
            &mut self.ledger,
            sink,
            &mut self.events,
            time_provider,
        )
    }

    /// re-notify unpaid demands for the quarter
    pub fn send_reminders(
        &mut self,
        settings: &FinancialSettings,
        units: &[Unit],
        quarter_value: &str,
        sink: &mut dyn NotificationSink,
        time_provider: &SafeTimeProvider,
    ) -> Result<usize> {
        let calendar = Self::calendar(settings)?;
        let quarter = calendar.parse_value(quarter_value)?;
        self.coordinator.send_reminders(
            &quarter,
            units,
            &mut self.ledger,
            sink,
            &mut self.events,
            time_provider,
        )
    }

    /// append a payment to a demand and emit the resulting state
    pub fn record_payment(
        &mut self,
        demand_id: DemandId,
        amount: Money,
        method: PaymentMethod,
        date: NaiveDate,
        recorded_by: &str,
        reference: Option<String>,
        time_provider: &SafeTimeProvider,
    ) -> Result<&ServiceChargeDemand> {
        let record = PaymentRecord {
            amount,
            method,
            date,
            recorded_by: recorded_by.to_string(),
            reference,
        };
        let demand = self.ledger.apply_payment(demand_id, record)?;

        self.events.emit(Event::PaymentRecorded {
            demand_id,
            amount,
            method,
            outstanding_after: demand.outstanding(),
            status_after: demand.status(date),
            timestamp: time_provider.now(),
        });
        Ok(demand)
    }

    /// add a late penalty to a demand
    pub fn apply_penalty(
        &mut self,
        demand_id: DemandId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<&ServiceChargeDemand> {
        let demand = self.ledger.apply_penalty(demand_id, amount)?;

        self.events.emit(Event::PenaltyApplied {
            demand_id,
            amount,
            new_total_due: demand.total_due(),
            timestamp: time_provider.now(),
        });
        Ok(demand)
    }

    /// cancel a demand; terminal, never a deletion
    pub fn cancel_demand(
        &mut self,
        demand_id: DemandId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        self.ledger.cancel(demand_id, now)?;

        if let Some(demand) = self.ledger.demand(demand_id) {
            self.events.emit(Event::DemandCancelled {
                demand_id,
                quarter: demand.quarter.clone(),
                timestamp: now,
            });
        }
        Ok(())
    }

    pub fn demands(&self, filter: &DemandFilter, as_of: NaiveDate) -> Vec<&ServiceChargeDemand> {
        self.ledger.query(filter, as_of)
    }

    /// rollup for one quarter, or for the current fiscal year when no
    /// quarter is given
    pub fn financial_summary(
        &self,
        settings: &FinancialSettings,
        units: &[Unit],
        quarter_value: Option<&str>,
        as_of: NaiveDate,
    ) -> Result<FinancialSummary> {
        let billing = settings.validate_for_billing()?;
        let calendar = Self::calendar(settings)?;

        match quarter_value {
            Some(value) => {
                let quarter = calendar.parse_value(value)?;
                Ok(self
                    .aggregator
                    .quarter_summary(&self.ledger, &quarter, units, &billing))
            }
            None => {
                let fiscal_year = calendar.current_fiscal_year(as_of);
                Ok(self.aggregator.annual_summary(
                    &calendar,
                    fiscal_year,
                    &self.ledger,
                    units,
                    &billing,
                ))
            }
        }
    }

    /// drain events for the caller's audit or notification pipeline
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FiscalAnchor;
    use crate::issuance::{NullSink, UnitIssuance};
    use crate::types::DemandStatus;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings() -> FinancialSettings {
        FinancialSettings {
            rate_per_area_unit: Some(Money::from_str_exact("2.50").unwrap()),
            due_lead_days: Some(14),
            fiscal_year_anchor: FiscalAnchor { month: 4, day: 1 },
            reserve_fund_percentage: None,
        }
    }

    fn units() -> Vec<Unit> {
        vec![
            Unit {
                id: Uuid::new_v4(),
                reference: "Flat 1".to_string(),
                area_units: Some(dec!(1000)),
                ground_rent: Some(Money::from_major(300)),
            },
            Unit {
                id: Uuid::new_v4(),
                reference: "Flat 2".to_string(),
                area_units: Some(dec!(500)),
                ground_rent: None,
            },
        ]
    }

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_quarter_options_window() {
        let engine = BillingEngine::new(Uuid::new_v4());
        let options = engine
            .quarter_options(&settings(), date(2024, 5, 15), 2, 1)
            .unwrap();

        assert_eq!(options.len(), 4);
        assert_eq!(options[2].value(), "2024-Q1"); // current
    }

    #[test]
    fn test_full_issue_pay_remind_cycle() {
        let mut engine = BillingEngine::new(Uuid::new_v4());
        let settings = settings();
        let units = units();
        let time = test_time();
        let as_of = date(2024, 5, 15);

        // plan: fresh quarter, issue mode with both flats
        let plan = engine
            .plan_issuance_or_reminder(&settings, &units, "2024-Q1")
            .unwrap();
        assert_eq!(plan.mode, PlanMode::Issue);
        assert_eq!(plan.candidates.len(), 2);

        // commit for every candidate
        let selected: Vec<UnitId> = plan.candidates.iter().map(|c| c.unit_id).collect();
        let outcome = engine
            .commit_issuance(&settings, &units, "2024-Q1", &selected, &mut NullSink, &time)
            .unwrap();
        assert_eq!(outcome.created, 2);

        // second commit creates nothing new
        let again = engine
            .commit_issuance(&settings, &units, "2024-Q1", &selected, &mut NullSink, &time)
            .unwrap();
        assert_eq!(again.created, 0);
        assert!(again.results.iter().all(|(_, r)| *r == UnitIssuance::SkippedExisting));

        // planning again routes to reminders
        let replan = engine
            .plan_issuance_or_reminder(&settings, &units, "2024-Q1")
            .unwrap();
        assert_eq!(replan.mode, PlanMode::Remind);

        // pay off one demand
        let demand_id = replan.open_demands[0];
        let outstanding = engine.ledger.demand(demand_id).unwrap().outstanding();
        let demand = engine
            .record_payment(
                demand_id,
                outstanding,
                PaymentMethod::BankTransfer,
                date(2024, 4, 10),
                "manager",
                None,
                &time,
            )
            .unwrap();
        assert_eq!(demand.status(as_of), DemandStatus::Paid);

        // remind only the remaining unpaid demand
        let reminded = engine
            .send_reminders(&settings, &units, "2024-Q1", &mut NullSink, &time)
            .unwrap();
        assert_eq!(reminded, 1);

        let events = engine.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::DemandIssued { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::PaymentRecorded { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::ReminderSent { .. })));
    }

    #[test]
    fn test_plan_rejects_bad_quarter_value() {
        let engine = BillingEngine::new(Uuid::new_v4());
        assert!(matches!(
            engine.plan_issuance_or_reminder(&settings(), &units(), "not-a-quarter"),
            Err(BillingError::InvalidQuarterSelection { .. })
        ));
    }

    #[test]
    fn test_plan_reports_no_eligible_units() {
        let engine = BillingEngine::new(Uuid::new_v4());
        let empty_units: Vec<Unit> = Vec::new();
        assert!(matches!(
            engine.plan_issuance_or_reminder(&settings(), &empty_units, "2024-Q2"),
            Err(BillingError::NoEligibleUnits { .. })
        ));
    }

    #[test]
    fn test_actionable_quarters_hide_settled() {
        let mut engine = BillingEngine::new(Uuid::new_v4());
        let settings = settings();
        let units = units();
        let time = test_time();
        let as_of = date(2024, 5, 15);

        let before = engine.actionable_quarters(&settings, as_of).unwrap();
        assert_eq!(before.len(), 7); // 4 past + current + 2 future

        // issue and fully settle the current quarter
        let selected: Vec<UnitId> = units.iter().map(|u| u.id).collect();
        engine
            .commit_issuance(&settings, &units, "2024-Q1", &selected, &mut NullSink, &time)
            .unwrap();
        let ids: Vec<(DemandId, Money)> = engine
            .ledger
            .iter()
            .map(|d| (d.id, d.outstanding()))
            .collect();
        for (id, outstanding) in ids {
            engine
                .record_payment(
                    id,
                    outstanding,
                    PaymentMethod::BankTransfer,
                    date(2024, 4, 10),
                    "manager",
                    None,
                    &time,
                )
                .unwrap();
        }

        let after = engine.actionable_quarters(&settings, as_of).unwrap();
        assert_eq!(after.len(), 6);
        assert!(after.iter().all(|q| q.value() != "2024-Q1"));
    }

    #[test]
    fn test_financial_summary_for_quarter_and_year() {
        let mut engine = BillingEngine::new(Uuid::new_v4());
        let settings = settings();
        let units = units();
        let time = test_time();
        let as_of = date(2024, 5, 15);

        let selected: Vec<UnitId> = units.iter().map(|u| u.id).collect();
        engine
            .commit_issuance(&settings, &units, "2024-Q1", &selected, &mut NullSink, &time)
            .unwrap();

        let quarterly = engine
            .financial_summary(&settings, &units, Some("2024-Q1"), as_of)
            .unwrap();
        // budget excludes ground rent; (1000 + 500) * 2.50
        assert_eq!(quarterly.budget, Money::from_major(3_750));
        assert_eq!(quarterly.collected, Money::ZERO);
        // outstanding includes the Q1 ground rent
        assert_eq!(quarterly.outstanding, Money::from_major(4_050));

        let annual = engine
            .financial_summary(&settings, &units, None, as_of)
            .unwrap();
        assert_eq!(annual.budget, Money::from_major(15_000));
    }

    #[test]
    fn test_summary_requires_complete_settings() {
        let engine = BillingEngine::new(Uuid::new_v4());
        let incomplete = FinancialSettings::new(FiscalAnchor { month: 4, day: 1 });
        assert!(matches!(
            engine.financial_summary(&incomplete, &units(), None, date(2024, 5, 15)),
            Err(BillingError::SettingsIncomplete { .. })
        ));
    }

    #[test]
    fn test_penalty_and_cancel_emit_events() {
        let mut engine = BillingEngine::new(Uuid::new_v4());
        let settings = settings();
        let units = units();
        let time = test_time();

        let selected: Vec<UnitId> = units.iter().map(|u| u.id).collect();
        engine
            .commit_issuance(&settings, &units, "2024-Q1", &selected, &mut NullSink, &time)
            .unwrap();
        let ids: Vec<DemandId> = engine.ledger.iter().map(|d| d.id).collect();

        engine
            .apply_penalty(ids[0], Money::from_major(50), &time)
            .unwrap();
        engine.cancel_demand(ids[1], &time).unwrap();

        let events = engine.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::PenaltyApplied { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::DemandCancelled { .. })));
    }
}
