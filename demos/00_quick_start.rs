/// quick start - issue a quarter of demands and record a payment
use service_charge_rs::{
    BillingEngine, Decimal, FinancialSettings, FiscalAnchor, Money, NullSink, PaymentMethod,
    SafeTimeProvider, TimeSource, Unit, UnitId, Uuid,
};
use chrono::{NaiveDate, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));

    // an april-anchored fiscal year at 2.50 per area unit
    let settings = FinancialSettings {
        rate_per_area_unit: Some(Money::from_str_exact("2.50")?),
        due_lead_days: Some(14),
        fiscal_year_anchor: FiscalAnchor::new(4, 1)?,
        reserve_fund_percentage: None,
    };

    let units = vec![
        Unit {
            id: Uuid::new_v4(),
            reference: "Flat 1".to_string(),
            area_units: Some(Decimal::from(1000)),
            ground_rent: Some(Money::from_major(300)),
        },
        Unit {
            id: Uuid::new_v4(),
            reference: "Flat 2".to_string(),
            area_units: Some(Decimal::from(500)),
            ground_rent: None,
        },
    ];

    let mut engine = BillingEngine::new(Uuid::new_v4());
    let as_of = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

    // plan the current quarter and issue for every candidate
    let quarter = engine.quarter_options(&settings, as_of, 0, 0)?[0];
    let plan = engine.plan_issuance_or_reminder(&settings, &units, &quarter.value())?;
    println!(
        "planned {}: {} candidates",
        quarter.display_string(),
        plan.candidates.len()
    );

    let selected: Vec<UnitId> = plan.candidates.iter().map(|c| c.unit_id).collect();
    let outcome = engine.commit_issuance(
        &settings,
        &units,
        &quarter.value(),
        &selected,
        &mut NullSink,
        &time,
    )?;
    println!("issued {} demands", outcome.created);

    // record a partial payment against the first demand
    let demand_id = engine.ledger.iter().next().unwrap().id;
    let demand = engine.record_payment(
        demand_id,
        Money::from_major(500),
        PaymentMethod::BankTransfer,
        as_of,
        "manager",
        None,
        &time,
    )?;
    println!("outstanding after payment: {}", demand.outstanding());

    // print current state
    println!("{}", engine.ledger.to_json()?);

    Ok(())
}
