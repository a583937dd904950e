pub mod demand;
pub mod serialization;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::types::{BuildingId, DemandId, DemandStatus, UnitId};

pub use demand::{PaymentRecord, ServiceChargeDemand};
pub use serialization::DemandView;

/// query filter for demand lookups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandFilter {
    pub quarter: Option<String>,
    pub unit_id: Option<UnitId>,
    pub status: Option<DemandStatus>,
}

/// the persisted collection of issued demands.
///
/// The billable-uniqueness invariant is enforced here at insert time, not by
/// an application-level existence check: at most one non-cancelled demand with
/// a positive base amount may exist per (unit, quarter).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DemandLedger {
    demands: BTreeMap<DemandId, ServiceChargeDemand>,
}

impl DemandLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.demands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceChargeDemand> {
        self.demands.values()
    }

    pub fn demand(&self, id: DemandId) -> Option<&ServiceChargeDemand> {
        self.demands.get(&id)
    }

    fn demand_mut(&mut self, id: DemandId) -> Result<&mut ServiceChargeDemand> {
        self.demands
            .get_mut(&id)
            .ok_or(BillingError::DemandNotFound { id })
    }

    /// true iff a non-cancelled billable demand exists for (unit, quarter);
    /// ground-rent-only placeholder rows never satisfy this check
    pub fn billable_exists(&self, unit_id: UnitId, quarter: &str) -> bool {
        self.demands
            .values()
            .any(|d| d.unit_id == unit_id && d.quarter == quarter && d.is_billable())
    }

    /// true iff any non-cancelled demand exists for (unit, quarter)
    pub fn exists_for(&self, unit_id: UnitId, quarter: &str) -> bool {
        self.demands
            .values()
            .any(|d| d.unit_id == unit_id && d.quarter == quarter && !d.is_cancelled())
    }

    /// true iff a non-cancelled demand for (unit, quarter) already carries
    /// the annual ground rent
    pub fn ground_rent_billed(&self, unit_id: UnitId, quarter: &str) -> bool {
        self.demands.values().any(|d| {
            d.unit_id == unit_id
                && d.quarter == quarter
                && !d.is_cancelled()
                && d.ground_rent_amount.is_positive()
        })
    }

    /// insert a demand, rejecting a duplicate billable row for the pair
    pub fn insert(&mut self, demand: ServiceChargeDemand) -> Result<DemandId> {
        if demand.is_billable() && self.billable_exists(demand.unit_id, &demand.quarter) {
            return Err(BillingError::DuplicateDemand {
                unit_id: demand.unit_id,
                quarter: demand.quarter,
            });
        }
        let id = demand.id;
        self.demands.insert(id, demand);
        Ok(id)
    }

    pub fn demands_for_quarter(&self, quarter: &str) -> Vec<&ServiceChargeDemand> {
        self.demands
            .values()
            .filter(|d| d.quarter == quarter)
            .collect()
    }

    pub fn demands_for_building(&self, building_id: BuildingId) -> Vec<&ServiceChargeDemand> {
        self.demands
            .values()
            .filter(|d| d.building_id == building_id)
            .collect()
    }

    pub fn query(&self, filter: &DemandFilter, as_of: NaiveDate) -> Vec<&ServiceChargeDemand> {
        self.demands
            .values()
            .filter(|d| filter.quarter.as_deref().map_or(true, |q| d.quarter == q))
            .filter(|d| filter.unit_id.map_or(true, |u| d.unit_id == u))
            .filter(|d| filter.status.map_or(true, |s| d.status(as_of) == s))
            .collect()
    }

    /// append a payment and recompute the paid total; only non-negative
    /// appends up to the outstanding balance are accepted (refunds are out
    /// of scope)
    pub fn apply_payment(
        &mut self,
        id: DemandId,
        record: PaymentRecord,
    ) -> Result<&ServiceChargeDemand> {
        let demand = self.demand_mut(id)?;

        if demand.is_cancelled() {
            return Err(BillingError::DemandNotPayable {
                id,
                reason: "demand is cancelled".to_string(),
            });
        }
        if !record.amount.is_positive() {
            return Err(BillingError::InvalidPayment {
                amount: record.amount,
                reason: "payment must be positive".to_string(),
            });
        }
        if record.amount > demand.outstanding() {
            return Err(BillingError::InvalidPayment {
                amount: record.amount,
                reason: format!("exceeds outstanding balance {}", demand.outstanding()),
            });
        }

        demand.amount_paid += record.amount;
        demand.payment_history.push(record);
        Ok(demand)
    }

    /// add a late penalty to the demand's total; settled demands take no
    /// further penalties
    pub fn apply_penalty(&mut self, id: DemandId, amount: Money) -> Result<&ServiceChargeDemand> {
        let demand = self.demand_mut(id)?;

        if demand.is_cancelled() {
            return Err(BillingError::DemandNotPayable {
                id,
                reason: "demand is cancelled".to_string(),
            });
        }
        if demand.outstanding().is_zero() {
            return Err(BillingError::DemandNotPayable {
                id,
                reason: "demand is fully paid".to_string(),
            });
        }
        if !amount.is_positive() {
            return Err(BillingError::InvalidPayment {
                amount,
                reason: "penalty must be positive".to_string(),
            });
        }

        demand.penalty_amount += amount;
        Ok(demand)
    }

    /// stamp the reminder timestamp; orthogonal to the payment-derived status
    pub fn mark_reminded(&mut self, id: DemandId, at: DateTime<Utc>) -> Result<()> {
        let demand = self.demand_mut(id)?;
        demand.last_reminder = Some(at);
        Ok(())
    }

    /// cancellation is terminal; demands are never deleted
    pub fn cancel(&mut self, id: DemandId, at: DateTime<Utc>) -> Result<()> {
        let demand = self.demand_mut(id)?;
        if demand.is_cancelled() {
            return Err(BillingError::DemandNotPayable {
                id,
                reason: "demand is already cancelled".to_string(),
            });
        }
        demand.cancelled_at = Some(at);
        Ok(())
    }
}
