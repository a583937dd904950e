/// billing cycle - issue, remind, settle, and roll up a fiscal year
use service_charge_rs::{
    BillingEngine, Decimal, Event, FinancialSettings, FiscalAnchor, Money, NotificationSink,
    PaymentMethod, SafeTimeProvider, ServiceChargeDemand, TimeSource, Unit, UnitId, Uuid,
};
use chrono::{NaiveDate, TimeZone, Utc};

/// a sink that just prints what would be emailed
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&mut self, unit: &Unit, demand: &ServiceChargeDemand) {
        println!(
            "  -> notify {}: {} due {} ({})",
            unit.reference,
            demand.outstanding(),
            demand.due_date,
            demand.quarter_display
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));

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
        Unit {
            id: Uuid::new_v4(),
            reference: "Garage".to_string(),
            area_units: None,
            ground_rent: Some(Money::from_major(100)),
        },
    ];

    let mut engine = BillingEngine::new(Uuid::new_v4());
    let as_of = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

    // q1 issuance reaches the ground-rent-only garage too
    println!("=== issuing 2024-Q1 ===");
    let selected: Vec<UnitId> = units.iter().map(|u| u.id).collect();
    let outcome = engine.commit_issuance(
        &settings,
        &units,
        "2024-Q1",
        &selected,
        &mut ConsoleSink,
        &time,
    )?;
    println!("created {} demands", outcome.created);

    // the flat with ground rent settles in full, the rest stay open
    let (paid_id, paid_amount) = {
        let demand = engine
            .ledger
            .iter()
            .find(|d| d.ground_rent_amount == Money::from_major(300))
            .unwrap();
        (demand.id, demand.outstanding())
    };
    engine.record_payment(
        paid_id,
        paid_amount,
        PaymentMethod::BankTransfer,
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
        "manager",
        Some("bank ref 1042".to_string()),
        &time,
    )?;
    println!("\nFlat 1 settled in full ({})", paid_amount);

    // second run on the same quarter goes down the reminder path
    println!("\n=== reminders for 2024-Q1 ===");
    let reminded = engine.send_reminders(&settings, &units, "2024-Q1", &mut ConsoleSink, &time)?;
    println!("reminded {} unpaid demands", reminded);

    // quarters with no open balance drop out of the actionable picker
    let actionable = engine.actionable_quarters(&settings, as_of)?;
    println!("\nactionable quarters:");
    for quarter in &actionable {
        println!("  {}", quarter.display_string());
    }

    // dashboard rollups
    let quarterly = engine.financial_summary(&settings, &units, Some("2024-Q1"), as_of)?;
    println!(
        "\n2024-Q1: budget {} collected {} outstanding {}",
        quarterly.budget, quarterly.collected, quarterly.outstanding
    );
    let annual = engine.financial_summary(&settings, &units, None, as_of)?;
    println!(
        "FY24/25: budget {} collected {}",
        annual.budget, annual.collected
    );

    // drain the audit trail
    println!("\naudit events:");
    for event in engine.take_events() {
        match event {
            Event::DemandIssued { quarter, total_due, .. } => {
                println!("  issued {} for {}", quarter, total_due)
            }
            Event::PaymentRecorded { amount, outstanding_after, .. } => {
                println!("  payment {} (outstanding {})", amount, outstanding_after)
            }
            Event::ReminderSent { outstanding, .. } => {
                println!("  reminder sent ({} outstanding)", outstanding)
            }
            other => println!("  {:?}", other),
        }
    }

    Ok(())
}
