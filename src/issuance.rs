use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::calendar::QuarterDescriptor;
use crate::config::FinancialSettings;
use crate::decimal::Money;
use crate::eligibility::{select_eligible_units, ChargeBasis};
use crate::errors::{BillingError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::{DemandLedger, ServiceChargeDemand};
use crate::types::{BuildingId, DemandId, Unit, UnitId};

/// notification delivery after issuance or reminders; fire-and-forget.
/// A sink failure must never roll back the created demand, so implementations
/// handle their own errors.
pub trait NotificationSink {
    fn notify(&mut self, unit: &Unit, demand: &ServiceChargeDemand);
}

/// no-op sink
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _unit: &Unit, _demand: &ServiceChargeDemand) {}
}

/// what the manager action for a quarter should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanMode {
    /// no billable demands exist yet; create them
    Issue,
    /// billable demands exist with unpaid balances; send reminders
    Remind,
    /// demands exist and are all settled; nothing to do
    NothingToRemind,
}

/// result of planning a quarter, presented to the manager for confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuancePlan {
    pub quarter: QuarterDescriptor,
    pub mode: PlanMode,
    /// eligible units with their charge breakdown (Issue mode)
    pub candidates: Vec<ChargeBasis>,
    /// demands with an outstanding balance (Remind mode)
    pub open_demands: Vec<DemandId>,
    pub include_ground_rent: bool,
}

/// per-unit outcome of a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitIssuance {
    Created { demand_id: DemandId },
    SkippedExisting,
    NotEligible,
}

/// explicit per-unit result list so one unit's failure never silently
/// swallows the rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuanceOutcome {
    pub quarter: String,
    pub created: usize,
    pub results: Vec<(UnitId, UnitIssuance)>,
}

/// decides between first issuance and the reminder path for a quarter, and
/// enforces once-per-(unit, quarter) issuance
#[derive(Debug, Clone, Copy)]
pub struct IssuanceCoordinator {
    pub building_id: BuildingId,
}

impl IssuanceCoordinator {
    pub fn new(building_id: BuildingId) -> Self {
        Self { building_id }
    }

    /// plan the manager action for a quarter. Ground rent is folded in
    /// automatically iff the quarter is Q1 of its fiscal year. Settings are
    /// validated only when first issuance is planned; the reminder path needs
    /// neither rate nor lead days.
    pub fn plan(
        &self,
        quarter: &QuarterDescriptor,
        units: &[Unit],
        settings: &FinancialSettings,
        ledger: &DemandLedger,
    ) -> Result<IssuancePlan> {
        let include_ground_rent = quarter.includes_ground_rent();
        let quarter_value = quarter.value();

        let existing = ledger.demands_for_quarter(&quarter_value);
        let already_issued = existing.iter().any(|d| d.is_billable());

        if !already_issued {
            let billing = settings.validate_for_billing()?;
            return Ok(IssuancePlan {
                quarter: *quarter,
                mode: PlanMode::Issue,
                candidates: select_eligible_units(units, &billing, include_ground_rent),
                open_demands: Vec::new(),
                include_ground_rent,
            });
        }

        let open_demands: Vec<DemandId> = existing
            .iter()
            .filter(|d| !d.is_cancelled() && d.outstanding().is_positive())
            .map(|d| d.id)
            .collect();

        let mode = if open_demands.is_empty() {
            PlanMode::NothingToRemind
        } else {
            PlanMode::Remind
        };

        Ok(IssuancePlan {
            quarter: *quarter,
            mode,
            candidates: Vec::new(),
            open_demands,
            include_ground_rent,
        })
    }

    /// create one demand per selected unit. Settings are re-validated at
    /// commit time even if eligibility was computed earlier, and the call is
    /// safe with any subset of the eligible list or when repeated: units that
    /// already have a billable demand for the quarter are skipped, never
    /// double-billed. A unit holding only a ground-rent placeholder row still
    /// receives its billable demand, with the ground rent stripped.
    #[allow(clippy::too_many_arguments)]
    pub fn commit(
        &self,
        quarter: &QuarterDescriptor,
        selected_unit_ids: &[UnitId],
        units: &[Unit],
        settings: &FinancialSettings,
        ledger: &mut DemandLedger,
        sink: &mut dyn NotificationSink,
        events: &mut EventStore,
        time_provider: &SafeTimeProvider,
    ) -> Result<IssuanceOutcome> {
        let billing = settings.validate_for_billing()?;
        let quarter_value = quarter.value();
        let eligible = select_eligible_units(units, &billing, quarter.includes_ground_rent());
        let now = time_provider.now();

        let mut created = 0;
        let mut results = Vec::with_capacity(selected_unit_ids.len());

        for &unit_id in selected_unit_ids {
            let Some(basis) = eligible.iter().find(|b| b.unit_id == unit_id) else {
                results.push((unit_id, UnitIssuance::NotEligible));
                continue;
            };

            let already_exists = if basis.base_amount.is_positive() {
                ledger.billable_exists(unit_id, &quarter_value)
            } else {
                ledger.exists_for(unit_id, &quarter_value)
            };
            if already_exists {
                events.emit(Event::IssuanceSkipped {
                    unit_id,
                    quarter: quarter_value.clone(),
                    reason: "demand already exists".to_string(),
                });
                results.push((unit_id, UnitIssuance::SkippedExisting));
                continue;
            }

            // a unit may gain billable area after a ground-rent-only row was
            // issued; the new demand must not carry the ground rent twice
            let mut basis = basis.clone();
            if ledger.ground_rent_billed(unit_id, &quarter_value) {
                basis.ground_rent_amount = Money::ZERO;
            }

            let demand =
                ServiceChargeDemand::issue(self.building_id, &basis, quarter, &billing, now);

            match ledger.insert(demand.clone()) {
                Ok(demand_id) => {
                    events.emit(Event::DemandIssued {
                        demand_id,
                        unit_id,
                        building_id: self.building_id,
                        quarter: quarter_value.clone(),
                        total_due: demand.total_due(),
                        due_date: demand.due_date,
                        timestamp: now,
                    });

                    if let Some(unit) = units.iter().find(|u| u.id == unit_id) {
                        sink.notify(unit, &demand);
                        events.emit(Event::NotificationDispatched {
                            demand_id,
                            unit_id,
                            timestamp: now,
                        });
                    }

                    created += 1;
                    results.push((unit_id, UnitIssuance::Created { demand_id }));
                }
                Err(BillingError::DuplicateDemand { .. }) => {
                    results.push((unit_id, UnitIssuance::SkippedExisting));
                }
                Err(other) => return Err(other),
            }
        }

        Ok(IssuanceOutcome {
            quarter: quarter_value,
            created,
            results,
        })
    }

    /// re-notify every demand with an unpaid balance for the quarter
    pub fn send_reminders(
        &self,
        quarter: &QuarterDescriptor,
        units: &[Unit],
        ledger: &mut DemandLedger,
        sink: &mut dyn NotificationSink,
        events: &mut EventStore,
        time_provider: &SafeTimeProvider,
    ) -> Result<usize> {
        let quarter_value = quarter.value();
        let open: Vec<DemandId> = ledger
            .demands_for_quarter(&quarter_value)
            .iter()
            .filter(|d| !d.is_cancelled() && d.outstanding().is_positive())
            .map(|d| d.id)
            .collect();

        if open.is_empty() {
            return Err(BillingError::NothingToRemind {
                quarter: quarter_value,
            });
        }

        let now = time_provider.now();
        for id in &open {
            ledger.mark_reminded(*id, now)?;
            if let Some(demand) = ledger.demand(*id) {
                events.emit(Event::ReminderSent {
                    demand_id: demand.id,
                    unit_id: demand.unit_id,
                    quarter: demand.quarter.clone(),
                    outstanding: demand.outstanding(),
                    timestamp: now,
                });
                if let Some(unit) = units.iter().find(|u| u.id == demand.unit_id) {
                    sink.notify(unit, demand);
                }
            }
        }

        Ok(open.len())
    }

    /// a quarter belongs in the manager-facing picker only while there is
    /// something to do: no demands yet, or an unpaid balance remains
    pub fn is_actionable(&self, quarter: &QuarterDescriptor, ledger: &DemandLedger) -> bool {
        let demands = ledger.demands_for_quarter(&quarter.value());
        let live: Vec<_> = demands.iter().filter(|d| !d.is_cancelled()).collect();

        live.is_empty() || live.iter().any(|d| d.outstanding().is_positive())
    }
}
