use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::QuarterDescriptor;
use crate::config::BillingSettings;
use crate::decimal::Money;
use crate::eligibility::ChargeBasis;
use crate::types::{BuildingId, DemandId, DemandStatus, PaymentMethod, UnitId};

/// a single payment against a demand; appended only, never mutated or removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount: Money,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    pub recorded_by: String,
    pub reference: Option<String>,
}

/// a billing record owed by one unit for one quarter.
///
/// Area and rate are snapshotted at issuance so later settings changes never
/// retroactively alter the amount. Status is derived from the persisted facts
/// on read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceChargeDemand {
    pub id: DemandId,
    pub unit_id: UnitId,
    pub building_id: BuildingId,
    /// sortable quarter identifier, e.g. "2024-Q1"
    pub quarter: String,
    /// human-readable label, e.g. "Q1 FY24/25"
    pub quarter_display: String,
    pub area_at_issue: Decimal,
    pub rate_at_issue: Money,
    pub base_amount: Money,
    pub ground_rent_amount: Money,
    pub penalty_amount: Money,
    pub amount_paid: Money,
    pub due_date: NaiveDate,
    pub issued_at: DateTime<Utc>,
    pub last_reminder: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub payment_history: Vec<PaymentRecord>,
}

impl ServiceChargeDemand {
    /// create a demand for one unit, snapshotting the charge basis and rate
    pub fn issue(
        building_id: BuildingId,
        basis: &ChargeBasis,
        quarter: &QuarterDescriptor,
        settings: &BillingSettings,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            unit_id: basis.unit_id,
            building_id,
            quarter: quarter.value(),
            quarter_display: quarter.display_string(),
            area_at_issue: basis.area,
            rate_at_issue: settings.rate_per_area_unit,
            base_amount: basis.base_amount,
            ground_rent_amount: basis.ground_rent_amount,
            penalty_amount: Money::ZERO,
            amount_paid: Money::ZERO,
            due_date: quarter.due_date(settings.due_lead_days),
            issued_at,
            last_reminder: None,
            cancelled_at: None,
            payment_history: Vec::new(),
        }
    }

    pub fn total_due(&self) -> Money {
        self.base_amount + self.ground_rent_amount + self.penalty_amount
    }

    pub fn outstanding(&self) -> Money {
        (self.total_due() - self.amount_paid).max(Money::ZERO)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }

    /// billable demands are what the idempotency check counts; ground-rent-only
    /// placeholder rows have a zero base amount and are excluded
    pub fn is_billable(&self) -> bool {
        self.base_amount.is_positive() && !self.is_cancelled()
    }

    /// status as a pure function of the persisted facts
    pub fn status(&self, as_of: NaiveDate) -> DemandStatus {
        if self.is_cancelled() {
            DemandStatus::Cancelled
        } else if self.outstanding().is_zero() {
            DemandStatus::Paid
        } else if self.amount_paid.is_positive() {
            DemandStatus::PartiallyPaid
        } else if as_of > self.due_date {
            DemandStatus::Overdue
        } else if self.last_reminder.is_some() {
            DemandStatus::ReminderSent
        } else {
            DemandStatus::Issued
        }
    }
}
