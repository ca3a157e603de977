//! Month grid and custody totals built from per-day resolution.
//!
//! The calendar view colors each day cell by exactly one `resolve` call;
//! these helpers perform that loop so every client renders the same grid.

use crate::model::custody::Label;
use crate::model::schedule::ScheduleConfig;
use crate::schedule::resolver::resolve;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Custodian of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAssignment {
    pub date: NaiveDate,
    pub custodian: Label,
}

/// Day counts per parent over a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyTotals {
    pub parent_a_days: u32,
    pub parent_b_days: u32,
}

impl CustodyTotals {
    pub fn total_days(&self) -> u32 {
        self.parent_a_days + self.parent_b_days
    }

    /// Percentage of days with `label`, `0.0` for an empty range.
    pub fn share_of(&self, label: Label) -> f64 {
        let total = self.total_days();
        if total == 0 {
            return 0.0;
        }
        let days = match label {
            Label::A => self.parent_a_days,
            Label::B => self.parent_b_days,
        };
        f64::from(days) * 100.0 / f64::from(total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    InvalidMonth { year: i32, month: u32 },
    ReversedRange { from: NaiveDate, to: NaiveDate },
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonth { year, month } => write!(f, "invalid month {year}-{month:02}"),
            Self::ReversedRange { from, to } => {
                write!(f, "range start {from} is after range end {to}")
            }
        }
    }
}

impl Error for CalendarError {}

/// Resolves every day of `year-month`.
///
/// # Errors
/// - `InvalidMonth` when `month` is outside `1..=12` or the year is out of
///   chrono's range.
pub fn month_grid(
    year: i32,
    month: u32,
    config: Option<&ScheduleConfig>,
) -> Result<Vec<DayAssignment>, CalendarError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(CalendarError::InvalidMonth { year, month })?;

    Ok(first
        .iter_days()
        .take_while(|day| day.month() == month)
        .map(|date| DayAssignment {
            date,
            custodian: resolve(date, config),
        })
        .collect())
}

/// Counts days per parent in `from..=to`.
pub fn custody_totals(
    from: NaiveDate,
    to: NaiveDate,
    config: Option<&ScheduleConfig>,
) -> Result<CustodyTotals, CalendarError> {
    if from > to {
        return Err(CalendarError::ReversedRange { from, to });
    }

    let mut totals = CustodyTotals::default();
    for date in from.iter_days().take_while(|day| *day <= to) {
        match resolve(date, config) {
            Label::A => totals.parent_a_days += 1,
            Label::B => totals.parent_b_days += 1,
        }
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::{custody_totals, month_grid, CalendarError};
    use crate::model::custody::Label;
    use crate::model::schedule::{PatternKey, ScheduleConfig};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn month_grid_covers_every_day_of_month() {
        let config = ScheduleConfig::new(PatternKey::AlternatingWeeks, date(2024, 1, 1), Label::A);
        let february = month_grid(2024, 2, Some(&config)).expect("valid month");
        assert_eq!(february.len(), 29);
        assert_eq!(february[0].date, date(2024, 2, 1));
        assert_eq!(february[28].date, date(2024, 2, 29));

        let january = month_grid(2024, 1, Some(&config)).expect("valid month");
        assert_eq!(january[0].custodian, Label::A);
        assert_eq!(january[7].custodian, Label::B);
        assert_eq!(january[14].custodian, Label::A);
    }

    #[test]
    fn month_grid_rejects_invalid_month() {
        assert_eq!(
            month_grid(2024, 13, None),
            Err(CalendarError::InvalidMonth {
                year: 2024,
                month: 13
            })
        );
    }

    #[test]
    fn totals_count_full_cycles_evenly() {
        let config = ScheduleConfig::new(PatternKey::TwoTwoFiveFive, date(2024, 1, 1), Label::B);
        let totals = custody_totals(date(2024, 1, 1), date(2024, 1, 28), Some(&config))
            .expect("valid range");
        assert_eq!(totals.parent_a_days, 14);
        assert_eq!(totals.parent_b_days, 14);
        assert!((totals.share_of(Label::A) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn every_other_weekend_gives_parent_b_two_of_fourteen_days() {
        let config =
            ScheduleConfig::new(PatternKey::EveryOtherWeekend, date(2024, 1, 1), Label::A);
        let totals = custody_totals(date(2024, 1, 1), date(2024, 1, 14), Some(&config))
            .expect("valid range");
        assert_eq!(totals.parent_b_days, 2);
        assert_eq!(totals.total_days(), 14);
    }

    #[test]
    fn totals_reject_reversed_range() {
        let err = custody_totals(date(2024, 2, 1), date(2024, 1, 1), None)
            .expect_err("reversed range must fail");
        assert!(matches!(err, CalendarError::ReversedRange { .. }));
    }
}
