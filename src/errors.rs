use thiserror::Error;

use crate::decimal::Money;
use crate::types::{DemandId, UnitId};

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("financial settings incomplete: {missing} must be set before billing")]
    SettingsIncomplete {
        missing: &'static str,
    },

    #[error("no eligible units for quarter {quarter}")]
    NoEligibleUnits {
        quarter: String,
    },

    #[error("nothing to remind: all demands for {quarter} are settled")]
    NothingToRemind {
        quarter: String,
    },

    #[error("invalid payment of {amount}: {reason}")]
    InvalidPayment {
        amount: Money,
        reason: String,
    },

    #[error("invalid quarter selection: {value}")]
    InvalidQuarterSelection {
        value: String,
    },

    #[error("invalid fiscal anchor: month {month}, day {day}")]
    InvalidAnchor {
        month: u32,
        day: u32,
    },

    #[error("billable demand already exists for unit {unit_id} in {quarter}")]
    DuplicateDemand {
        unit_id: UnitId,
        quarter: String,
    },

    #[error("demand not found: {id}")]
    DemandNotFound {
        id: DemandId,
    },

    #[error("demand {id} cannot be changed: {reason}")]
    DemandNotPayable {
        id: DemandId,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, BillingError>;
