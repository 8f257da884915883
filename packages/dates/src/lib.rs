#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Calendar-date helpers shared by the recidivism and supervision pipelines.
//!
//! Every calculation in this workspace reasons over plain calendar dates
//! ([`NaiveDate`]); there is no timezone handling anywhere. Month and year
//! arithmetic clamps to the end of the month (adding one month to January 31
//! yields the last day of February).

use chrono::{Datelike, Days, Months, NaiveDate};

/// Returns the first day of the month containing `date`.
#[must_use]
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Returns the last day of the month containing `date`.
#[must_use]
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_day_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .unwrap_or(date)
}

/// Adds `months` calendar months to `date`, clamping to the end of the
/// target month when the day of month does not exist there.
#[must_use]
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// Subtracts `months` calendar months from `date`, clamping like
/// [`add_months`].
#[must_use]
pub fn sub_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

/// Adds `years` calendar years to `date` (February 29 clamps to
/// February 28 in non-leap years).
#[must_use]
pub fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    add_months(date, years * 12)
}

/// Returns the number of whole calendar months between `start` and `end`,
/// rounded down.
///
/// A span from 2015-01-15 to 2017-01-14 is 23 months; to 2017-01-15 it is
/// 24 months.
#[must_use]
pub fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let mut months = (end.year() - start.year()) * 12 + i32::try_from(end.month()).unwrap_or(0)
        - i32::try_from(start.month()).unwrap_or(0);

    if end.day() < start.day() {
        months -= 1;
    }

    months
}

/// Returns the `(year, month)` pair for `date`.
#[must_use]
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn first_and_last_day_of_month() {
        assert_eq!(first_day_of_month(d(2019, 2, 14)), d(2019, 2, 1));
        assert_eq!(last_day_of_month(d(2019, 2, 14)), d(2019, 2, 28));
        assert_eq!(last_day_of_month(d(2020, 2, 14)), d(2020, 2, 29));
        assert_eq!(last_day_of_month(d(2019, 12, 1)), d(2019, 12, 31));
    }

    #[test]
    fn month_arithmetic_clamps_to_end_of_month() {
        assert_eq!(add_months(d(2019, 1, 31), 1), d(2019, 2, 28));
        assert_eq!(sub_months(d(2019, 3, 31), 1), d(2019, 2, 28));
        assert_eq!(add_years(d(2020, 2, 29), 1), d(2021, 2, 28));
    }

    #[test]
    fn whole_months_rounds_down() {
        assert_eq!(whole_months_between(d(2015, 1, 15), d(2017, 1, 14)), 23);
        assert_eq!(whole_months_between(d(2015, 1, 15), d(2017, 1, 15)), 24);
        assert_eq!(whole_months_between(d(2015, 1, 15), d(2015, 1, 15)), 0);
    }
}
