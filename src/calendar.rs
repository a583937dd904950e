use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{BillingError, Result};

/// year-independent month/day on which a building's fiscal year begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalAnchor {
    pub month: u32,
    pub day: u32,
}

impl FiscalAnchor {
    pub fn new(month: u32, day: u32) -> Result<Self> {
        let anchor = FiscalAnchor { month, day };
        anchor.validate()?;
        Ok(anchor)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.month) || !(1..=31).contains(&self.day) {
            return Err(BillingError::InvalidAnchor {
                month: self.month,
                day: self.day,
            });
        }
        Ok(())
    }

    /// the anchor date in a given calendar year, clamped to the month's last
    /// valid day (Feb 29 in a non-leap year becomes Feb 28)
    pub fn date_in(&self, year: i32) -> NaiveDate {
        clamped_date(year, self.month, self.day)
    }
}

fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    for d in (1..=day.min(31)).rev() {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, d) {
            return date;
        }
    }
    // unreachable for a validated anchor; day 1 exists in every month
    NaiveDate::default()
}

/// a computed three-month billing period; derived, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterDescriptor {
    /// quarter number within the fiscal year, 1-4
    pub index: u8,
    /// calendar year in which the fiscal year starts
    pub fiscal_year: i32,
    pub start_date: NaiveDate,
    /// exclusive; equals the start of the next quarter
    pub end_date: NaiveDate,
}

impl QuarterDescriptor {
    /// e.g. "FY24/25" for the year starting April 2024
    pub fn fiscal_year_label(&self) -> String {
        format!(
            "FY{:02}/{:02}",
            self.fiscal_year.rem_euclid(100),
            (self.fiscal_year + 1).rem_euclid(100)
        )
    }

    /// e.g. "Q1 FY24/25"
    pub fn display_string(&self) -> String {
        format!("Q{} {}", self.index, self.fiscal_year_label())
    }

    /// stable, lexicographically sortable identifier, e.g. "2024-Q1"
    pub fn value(&self) -> String {
        format!("{:04}-Q{}", self.fiscal_year, self.index)
    }

    /// a quarter is past once its end date has been reached
    pub fn is_past(&self, as_of: NaiveDate) -> bool {
        self.end_date <= as_of
    }

    pub fn is_current(&self, as_of: NaiveDate) -> bool {
        self.start_date <= as_of && as_of < self.end_date
    }

    /// ground rent is billed only in the first quarter of the fiscal year
    pub fn includes_ground_rent(&self) -> bool {
        self.index == 1
    }

    /// demands fall due this many days before the quarter starts
    pub fn due_date(&self, lead_days: u32) -> NaiveDate {
        self.start_date - chrono::Duration::days(lead_days as i64)
    }
}

/// the single source of quarter boundaries; no other component computes them
#[derive(Debug, Clone, Copy)]
pub struct FiscalCalendar {
    anchor: FiscalAnchor,
}

impl FiscalCalendar {
    pub fn new(anchor: FiscalAnchor) -> Result<Self> {
        anchor.validate()?;
        Ok(Self { anchor })
    }

    pub fn anchor(&self) -> FiscalAnchor {
        self.anchor
    }

    /// start of the fiscal year beginning in the given calendar year
    pub fn fiscal_year_start(&self, year: i32) -> NaiveDate {
        self.anchor.date_in(year)
    }

    /// calendar year of the latest fiscal-year start that is <= as_of
    pub fn current_fiscal_year(&self, as_of: NaiveDate) -> i32 {
        use chrono::Datelike;
        let candidate = self.fiscal_year_start(as_of.year());
        if as_of < candidate {
            as_of.year() - 1
        } else {
            as_of.year()
        }
    }

    /// quarter n starts 3n-3 months after the fiscal year start, with the
    /// anchor day clamped per month; the end is the next quarter's start, so
    /// quarters are always contiguous across fiscal-year boundaries
    pub fn quarter(&self, fiscal_year: i32, index: u8) -> QuarterDescriptor {
        let index = index.clamp(1, 4);
        QuarterDescriptor {
            index,
            fiscal_year,
            start_date: self.quarter_start(fiscal_year, index as i32 - 1),
            end_date: self.quarter_start(fiscal_year, index as i32),
        }
    }

    fn quarter_start(&self, fiscal_year: i32, quarters_after_start: i32) -> NaiveDate {
        let months = self.anchor.month as i32 - 1 + 3 * quarters_after_start;
        let year = fiscal_year + months.div_euclid(12);
        let month = months.rem_euclid(12) as u32 + 1;
        clamped_date(year, month, self.anchor.day)
    }

    /// the quarter containing as_of
    pub fn current_quarter(&self, as_of: NaiveDate) -> QuarterDescriptor {
        let fiscal_year = self.current_fiscal_year(as_of);
        let mut index = 1;
        for candidate in 2..=4 {
            if self.quarter_start(fiscal_year, candidate - 1) <= as_of {
                index = candidate;
            }
        }
        self.quarter(fiscal_year, index as u8)
    }

    /// exactly past_count + future_count + 1 contiguous quarters, ascending,
    /// always containing the current one
    pub fn enumerate_quarters(
        &self,
        as_of: NaiveDate,
        past_count: usize,
        future_count: usize,
    ) -> Vec<QuarterDescriptor> {
        let current = self.current_quarter(as_of);
        let base = current.fiscal_year as i64 * 4 + current.index as i64 - 1;

        ((base - past_count as i64)..=(base + future_count as i64))
            .map(|global| {
                let fiscal_year = global.div_euclid(4) as i32;
                let index = global.rem_euclid(4) as u8 + 1;
                self.quarter(fiscal_year, index)
            })
            .collect()
    }

    /// inverse of QuarterDescriptor::value
    pub fn parse_value(&self, value: &str) -> Result<QuarterDescriptor> {
        let invalid = || BillingError::InvalidQuarterSelection {
            value: value.to_string(),
        };

        let (year_part, quarter_part) = value.split_once("-Q").ok_or_else(invalid)?;
        let fiscal_year: i32 = year_part.parse().map_err(|_| invalid())?;
        let index: u8 = quarter_part.parse().map_err(|_| invalid())?;
        if !(1..=4).contains(&index) {
            return Err(invalid());
        }
        Ok(self.quarter(fiscal_year, index))
    }
}
