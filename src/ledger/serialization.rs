/// serialization support for the demand ledger
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::{DemandLedger, ServiceChargeDemand};
use crate::types::{DemandId, DemandStatus, UnitId};

/// serializable read-model of a demand, with the derived fields materialized
#[derive(Debug, Serialize, Deserialize)]
pub struct DemandView {
    pub id: DemandId,
    pub unit_id: UnitId,
    pub quarter: String,
    pub quarter_display: String,
    pub status: DemandStatus,
    pub amounts: AmountView,
    pub dates: DateView,
    pub payment_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AmountView {
    pub base_amount: Money,
    pub ground_rent_amount: Money,
    pub penalty_amount: Money,
    pub total_due: Money,
    pub amount_paid: Money,
    pub outstanding: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DateView {
    pub due_date: NaiveDate,
    pub issued_at: DateTime<Utc>,
    pub last_reminder: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl DemandView {
    pub fn from_demand(demand: &ServiceChargeDemand, as_of: NaiveDate) -> Self {
        DemandView {
            id: demand.id,
            unit_id: demand.unit_id,
            quarter: demand.quarter.clone(),
            quarter_display: demand.quarter_display.clone(),
            status: demand.status(as_of),
            amounts: AmountView {
                base_amount: demand.base_amount,
                ground_rent_amount: demand.ground_rent_amount,
                penalty_amount: demand.penalty_amount,
                total_due: demand.total_due(),
                amount_paid: demand.amount_paid,
                outstanding: demand.outstanding(),
            },
            dates: DateView {
                due_date: demand.due_date,
                issued_at: demand.issued_at,
                last_reminder: demand.last_reminder,
                cancelled_at: demand.cancelled_at,
            },
            payment_count: demand.payment_history.len(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl DemandLedger {
    /// export the full ledger as json; this is how callers persist it
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{FiscalAnchor, FiscalCalendar};
    use crate::config::BillingSettings;
    use crate::eligibility::ChargeBasis;
    use crate::ledger::PaymentRecord;
    use crate::types::PaymentMethod;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn populated_ledger() -> DemandLedger {
        let cal = FiscalCalendar::new(FiscalAnchor { month: 4, day: 1 }).unwrap();
        let settings = BillingSettings {
            rate_per_area_unit: Money::from_str_exact("2.50").unwrap(),
            due_lead_days: 14,
            fiscal_year_anchor: cal.anchor(),
            reserve_fund_percentage: None,
        };
        let basis = ChargeBasis {
            unit_id: Uuid::new_v4(),
            unit_reference: "Flat 3".to_string(),
            area: dec!(1000),
            base_amount: Money::from_major(2_500),
            ground_rent_amount: Money::from_major(300),
        };
        let demand = ServiceChargeDemand::issue(
            Uuid::new_v4(),
            &basis,
            &cal.quarter(2024, 1),
            &settings,
            Utc::now(),
        );

        let mut ledger = DemandLedger::new();
        let id = ledger.insert(demand).unwrap();
        ledger
            .apply_payment(
                id,
                PaymentRecord {
                    amount: Money::from_major(1_000),
                    method: PaymentMethod::BankTransfer,
                    date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
                    recorded_by: "manager".to_string(),
                    reference: Some("ref-1".to_string()),
                },
            )
            .unwrap();
        ledger
    }

    #[test]
    fn test_ledger_json_roundtrip() {
        let ledger = populated_ledger();
        let json = ledger.to_json().unwrap();
        let restored = DemandLedger::from_json(&json).unwrap();

        assert_eq!(restored.len(), 1);
        let original = ledger.iter().next().unwrap();
        let roundtripped = restored.demand(original.id).unwrap();
        assert_eq!(roundtripped, original);
        assert_eq!(roundtripped.payment_history.len(), 1);
    }

    #[test]
    fn test_demand_view_materializes_derived_fields() {
        let ledger = populated_ledger();
        let demand = ledger.iter().next().unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();

        let view = DemandView::from_demand(demand, as_of);
        assert_eq!(view.status, DemandStatus::PartiallyPaid);
        assert_eq!(view.amounts.total_due, Money::from_major(2_800));
        assert_eq!(view.amounts.outstanding, Money::from_major(1_800));
        assert_eq!(view.payment_count, 1);

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"outstanding\""));
        assert!(json.contains("Q1 FY24/25"));
    }
}
