use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::BillingSettings;
use crate::decimal::Money;
use crate::types::{Unit, UnitId};

/// per-unit charge computation for a quarter, before any demand exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeBasis {
    pub unit_id: UnitId,
    pub unit_reference: String,
    pub area: Decimal,
    pub base_amount: Money,
    pub ground_rent_amount: Money,
}

impl ChargeBasis {
    pub fn total(&self) -> Money {
        self.base_amount + self.ground_rent_amount
    }
}

/// select the units qualifying for a charge this quarter.
///
/// A unit is included iff it is service-charge eligible, or ground-rent
/// inclusion is requested and it is ground-rent eligible. Q1 demands must
/// also reach ground-rent-only units with no billable area; those carry a
/// zero base amount.
pub fn select_eligible_units(
    units: &[Unit],
    settings: &BillingSettings,
    include_ground_rent: bool,
) -> Vec<ChargeBasis> {
    units
        .iter()
        .filter(|unit| {
            unit.is_service_charge_eligible()
                || (include_ground_rent && unit.is_ground_rent_eligible())
        })
        .map(|unit| {
            let area = unit.billable_area();
            let ground_rent_amount = if include_ground_rent && unit.is_ground_rent_eligible() {
                unit.ground_rent.unwrap_or(Money::ZERO)
            } else {
                Money::ZERO
            };

            ChargeBasis {
                unit_id: unit.id,
                unit_reference: unit.reference.clone(),
                area,
                base_amount: settings.rate_per_area_unit * area,
                ground_rent_amount,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FiscalAnchor;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn settings() -> BillingSettings {
        BillingSettings {
            rate_per_area_unit: Money::from_str_exact("2.50").unwrap(),
            due_lead_days: 14,
            fiscal_year_anchor: FiscalAnchor { month: 4, day: 1 },
            reserve_fund_percentage: None,
        }
    }

    fn unit(area: Option<Decimal>, ground_rent: Option<Money>) -> Unit {
        Unit {
            id: Uuid::new_v4(),
            reference: "Flat".to_string(),
            area_units: area,
            ground_rent,
        }
    }

    #[test]
    fn test_area_unit_charged_by_area() {
        let units = vec![unit(Some(dec!(1000)), None)];
        let basis = select_eligible_units(&units, &settings(), false);

        assert_eq!(basis.len(), 1);
        assert_eq!(basis[0].base_amount, Money::from_major(2_500));
        assert_eq!(basis[0].ground_rent_amount, Money::ZERO);
    }

    #[test]
    fn test_ground_rent_only_unit_included_when_requested() {
        let units = vec![unit(None, Some(Money::from_major(300)))];

        let without = select_eligible_units(&units, &settings(), false);
        assert!(without.is_empty());

        let with = select_eligible_units(&units, &settings(), true);
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].base_amount, Money::ZERO);
        assert_eq!(with[0].ground_rent_amount, Money::from_major(300));
    }

    #[test]
    fn test_q1_unit_with_both_charges() {
        let units = vec![unit(Some(dec!(1000)), Some(Money::from_major(300)))];
        let basis = select_eligible_units(&units, &settings(), true);

        assert_eq!(basis[0].base_amount, Money::from_major(2_500));
        assert_eq!(basis[0].ground_rent_amount, Money::from_major(300));
        assert_eq!(basis[0].total(), Money::from_major(2_800));
    }

    #[test]
    fn test_ground_rent_suppressed_outside_q1() {
        let units = vec![unit(Some(dec!(1000)), Some(Money::from_major(300)))];
        let basis = select_eligible_units(&units, &settings(), false);

        assert_eq!(basis[0].ground_rent_amount, Money::ZERO);
        assert_eq!(basis[0].total(), Money::from_major(2_500));
    }

    #[test]
    fn test_ineligible_unit_excluded() {
        let units = vec![unit(Some(dec!(0)), Some(Money::ZERO)), unit(None, None)];
        assert!(select_eligible_units(&units, &settings(), true).is_empty());
    }
}
