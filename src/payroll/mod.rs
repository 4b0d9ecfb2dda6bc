pub mod aggregate;
pub mod calculator;
pub mod ledger;
pub mod renderer;
pub mod scheduler;
pub mod storage;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{PayrollError, PayrollResult};

/// One payroll cycle. `month` is always 1..=12 when constructed through
/// [`Period::new`] or [`Period::previous_month`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Period {
    #[schema(example = 6, minimum = 1, maximum = 12)]
    pub month: u32,
    #[schema(example = 2025)]
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> PayrollResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(PayrollError::invalid_period(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Period { month, year })
    }

    /// The period a periodic trigger processes: the calendar month before
    /// `today` (running on the 25th of June generates May).
    pub fn previous_month(today: NaiveDate) -> Self {
        let first = today
            .with_day(1)
            .expect("day 1 is valid for every month")
            .checked_sub_months(Months::new(1))
            .expect("previous month is representable");
        Period {
            month: first.month(),
            year: first.year(),
        }
    }

    /// Manual generation is only allowed for closed periods, strictly
    /// before the month `today` falls in.
    pub fn ensure_closed(&self, today: NaiveDate) -> PayrollResult<()> {
        if (self.year, self.month) >= (today.year(), today.month()) {
            return Err(PayrollError::invalid_period(format!(
                "period {}/{} has not ended yet",
                self.month, self.year
            )));
        }
        Ok(())
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated month")
    }

    /// Inclusive lower bound for `published_at` aggregation.
    pub fn start(&self) -> NaiveDateTime {
        self.first_day()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
    }

    /// Exclusive upper bound: midnight on the first day of the next month.
    pub fn end_exclusive(&self) -> NaiveDateTime {
        self.first_day()
            .checked_add_months(Months::new(1))
            .expect("next month is representable")
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        assert!(Period::new(0, 2025).is_err());
        assert!(Period::new(13, 2025).is_err());
        assert!(Period::new(12, 2025).is_ok());
    }

    #[test]
    fn previous_month_in_same_year() {
        let period = Period::previous_month(date(2025, 6, 25));
        assert_eq!(period, Period { month: 5, year: 2025 });
    }

    #[test]
    fn previous_month_crosses_year_boundary() {
        let period = Period::previous_month(date(2025, 1, 25));
        assert_eq!(period, Period { month: 12, year: 2024 });
    }

    #[test]
    fn current_and_future_periods_are_not_closed() {
        let today = date(2025, 6, 10);
        assert!(Period::new(6, 2025).unwrap().ensure_closed(today).is_err());
        assert!(Period::new(7, 2025).unwrap().ensure_closed(today).is_err());
        assert!(Period::new(1, 2026).unwrap().ensure_closed(today).is_err());
        assert!(Period::new(5, 2025).unwrap().ensure_closed(today).is_ok());
        assert!(Period::new(12, 2024).unwrap().ensure_closed(today).is_ok());
    }

    #[test]
    fn aggregation_bounds_cover_the_calendar_month() {
        let period = Period::new(12, 2024).unwrap();
        assert_eq!(period.start(), date(2024, 12, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            period.end_exclusive(),
            date(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap()
        );
    }
}
