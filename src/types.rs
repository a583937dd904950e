use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a service-charge demand
pub type DemandId = Uuid;

/// unique identifier for a unit (flat)
pub type UnitId = Uuid;

/// unique identifier for a building
pub type BuildingId = Uuid;

/// a unit (flat) as read from the units store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// human-readable reference, e.g. "Flat 3"
    pub reference: String,
    /// billable area in area units; None or zero means no service charge
    pub area_units: Option<Decimal>,
    /// annual ground rent; None or zero means no ground rent
    pub ground_rent: Option<Money>,
}

impl Unit {
    /// a unit qualifies for the area-based service charge iff its area is positive
    pub fn is_service_charge_eligible(&self) -> bool {
        self.billable_area() > Decimal::ZERO
    }

    /// a unit qualifies for annual ground rent iff a positive amount is configured
    pub fn is_ground_rent_eligible(&self) -> bool {
        self.ground_rent.map(|g| g.is_positive()).unwrap_or(false)
    }

    /// billable area, zero when unset or non-positive
    pub fn billable_area(&self) -> Decimal {
        match self.area_units {
            Some(a) if a > Decimal::ZERO => a,
            _ => Decimal::ZERO,
        }
    }
}

/// demand status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandStatus {
    /// staged upstream, not yet issued (never derived by the ledger)
    Draft,
    /// issued, not yet due or paid
    Issued,
    /// a reminder has gone out, still unpaid
    ReminderSent,
    /// past due date with an outstanding balance
    Overdue,
    /// partially paid
    PartiallyPaid,
    /// fully paid
    Paid,
    /// cancelled, terminal
    Cancelled,
}

/// how a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    BankTransfer,
    Card,
    Cheque,
    Cash,
    Other,
}
