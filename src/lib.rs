pub mod aggregator;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod eligibility;
pub mod engine;
pub mod errors;
pub mod events;
pub mod issuance;
pub mod ledger;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use errors::{BillingError, Result};
pub use events::{Event, EventStore};
pub use calendar::{FiscalAnchor, FiscalCalendar, QuarterDescriptor};
pub use config::{BillingSettings, FinancialSettings};
pub use eligibility::{select_eligible_units, ChargeBasis};
pub use engine::BillingEngine;
pub use aggregator::{BudgetAggregator, FinancialSummary};
pub use issuance::{
    IssuanceCoordinator, IssuanceOutcome, IssuancePlan, NotificationSink, NullSink, PlanMode,
    UnitIssuance,
};
pub use ledger::{DemandFilter, DemandLedger, DemandView, PaymentRecord, ServiceChargeDemand};
pub use types::{
    BuildingId, DemandId, DemandStatus, PaymentMethod, Unit, UnitId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
