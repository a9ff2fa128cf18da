//! Structural date filters: calendar range, allowed weekdays, holiday policy.
//!
//! These checks are independent of participant counts and run after
//! aggregation, before any time-slot work.

use chrono::NaiveDate;
use tracing::debug;

use crate::aggregate::DailyAvailability;
use crate::holidays::{HolidayCalendar, RegionalHolidays};
use crate::model::{weekday_index, CalendarConfig, HolidaysPolicy};

/// True when `date` lies inside the optional `[start, end]` range.
/// A missing bound is unbounded on that side.
pub fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
}

/// Weekday and holiday admissibility for one date, using the built-in holiday
/// table for `timezone`.
pub fn is_date_allowed(
    date: NaiveDate,
    timezone: &str,
    allowed_weekdays: &[u8],
    holidays_policy: HolidaysPolicy,
    allow_holiday_eves: bool,
) -> bool {
    let holidays = RegionalHolidays::for_timezone(timezone);
    is_date_allowed_with(
        &holidays,
        date,
        allowed_weekdays,
        holidays_policy,
        allow_holiday_eves,
    )
}

/// [`is_date_allowed`] against an explicit holiday calendar.
///
/// Checks run in order:
/// 1. the weekday must be allowed, whatever the holiday policy;
/// 2. under [`HolidaysPolicy::Block`] holidays are rejected;
/// 3. unless eves are allowed, the eve of a holiday is rejected.
///
/// [`HolidaysPolicy::Allow`] and [`HolidaysPolicy::Ignore`] only differ from
/// `Block` in step 2.
pub fn is_date_allowed_with(
    holidays: &dyn HolidayCalendar,
    date: NaiveDate,
    allowed_weekdays: &[u8],
    holidays_policy: HolidaysPolicy,
    allow_holiday_eves: bool,
) -> bool {
    if !allowed_weekdays.contains(&weekday_index(date)) {
        return false;
    }
    if holidays_policy == HolidaysPolicy::Block && holidays.is_holiday(date) {
        return false;
    }
    allow_holiday_eves || !holidays.is_holiday_eve(date)
}

/// Drop dates that fail the calendar's range, weekday or holiday rules.
pub fn admit(
    days: Vec<DailyAvailability>,
    config: &CalendarConfig,
    holidays: &dyn HolidayCalendar,
) -> Vec<DailyAvailability> {
    let before = days.len();
    let admitted: Vec<DailyAvailability> = days
        .into_iter()
        .filter(|day| in_range(day.date, config.start_date, config.end_date))
        .filter(|day| {
            is_date_allowed_with(
                holidays,
                day.date,
                &config.allowed_weekdays,
                config.holidays_policy,
                config.allow_holiday_eves,
            )
        })
        .collect();

    debug!(dates = before, admitted = admitted.len(), "filtered dates");
    admitted
}
