//! Recurrence materialization -- turns weekly availability rules into concrete
//! per-date occurrences.
//!
//! Each stored [`Recurrence`] is compiled into an RFC 5545 rule
//! (`FREQ=WEEKLY;BYDAY=..;UNTIL=..` plus `EXDATE` lines for its exceptions) and
//! expanded with the `rrule` crate. Expansion is always bounded by a
//! [`MaterializeWindow`] capped one year past "today", so open-ended rules
//! never expand without limit.

use std::collections::{HashMap, HashSet};

use chrono::{Days, NaiveDate, Weekday};
use rrule::RRuleSet;
use tracing::{debug, warn};

use crate::error::RecurrenceError;
use crate::model::{
    weekday_from_index, Availability, AvailabilityRecord, AvailabilitySource, Recurrence,
    RecurrenceException,
};

/// How far past "today" open-ended rules are expanded.
pub const HORIZON_DAYS: u64 = 365;

/// Inclusive date range that bounds recurrence expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MaterializeWindow {
    /// `[min(start_date), max(end_date or horizon)]`, with the end capped at
    /// `today + HORIZON_DAYS`.
    ///
    /// Returns `None` when there are no recurrences or every rule starts after
    /// the horizon.
    pub fn for_recurrences(recurrences: &[Recurrence], today: NaiveDate) -> Option<Self> {
        let horizon = today.checked_add_days(Days::new(HORIZON_DAYS))?;
        let start = recurrences.iter().map(|r| r.start_date).min()?;
        let end = recurrences
            .iter()
            .map(|r| r.end_date.unwrap_or(horizon))
            .max()?
            .min(horizon);

        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The dates on which one recurrence occurs inside a window.
///
/// Iteration is lazy and finite, and [`Occurrences::iter`] can be called any
/// number of times; each call restarts from the first occurrence.
#[derive(Debug, Clone)]
pub struct Occurrences {
    set: Option<RRuleSet>,
    window: MaterializeWindow,
}

impl Occurrences {
    /// Compile a recurrence and its exception dates for expansion inside `window`.
    ///
    /// # Errors
    /// Returns `RecurrenceError::InvalidWeekday` if `day_of_week` is not 0-6.
    /// Returns `RecurrenceError::InvalidRule` if the generated rule is rejected.
    pub fn compile(
        recurrence: &Recurrence,
        exceptions: &[NaiveDate],
        window: MaterializeWindow,
    ) -> Result<Self, RecurrenceError> {
        let byday = byday_code(recurrence.day_of_week)?;

        // Clip the rule's own validity range to the window.
        let first = recurrence.start_date.max(window.start);
        let last = recurrence
            .end_date
            .map_or(window.end, |end| end.min(window.end));

        if first > last {
            return Ok(Self { set: None, window });
        }

        let mut rule_text = format!(
            "DTSTART;TZID=UTC:{}\nRRULE:FREQ=WEEKLY;BYDAY={};UNTIL={}Z",
            ical_date(first),
            byday,
            ical_date(last)
        );

        // EXDATE must match occurrence datetimes exactly, i.e. midnight UTC.
        let exdates: Vec<String> = exceptions
            .iter()
            .filter(|d| first <= **d && **d <= last)
            .map(|d| ical_date(*d))
            .collect();
        if !exdates.is_empty() {
            rule_text.push_str(&format!("\nEXDATE;TZID=UTC:{}", exdates.join(",")));
        }

        let set: RRuleSet = rule_text
            .parse()
            .map_err(|e| RecurrenceError::InvalidRule(format!("{}", e)))?;

        Ok(Self {
            set: Some(set),
            window,
        })
    }

    /// Occurrence dates in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let window = self.window;
        self.set
            .iter()
            .flat_map(|set| set.into_iter())
            .map(|dt| dt.date_naive())
            .skip_while(move |d| *d < window.start)
            .take_while(move |d| window.contains(*d))
    }
}

/// Expand recurrences into availability occurrences.
///
/// For every date in `window` on which a recurrence occurs (weekday matches,
/// inside its validity range, not excepted), one record is emitted unless the
/// participant already has a manual entry on that date. At most one record is
/// produced per (participant, date); when several recurrences of the same
/// participant land on one date the rule with the lowest id wins.
///
/// Recurrences that cannot be compiled are logged and skipped.
///
/// Output is sorted by date, then participant id.
pub fn materialize(
    recurrences: &[Recurrence],
    exceptions: &[RecurrenceException],
    manual: &[Availability],
    window: MaterializeWindow,
) -> Vec<AvailabilityRecord> {
    let mut exceptions_by_rule: HashMap<&str, Vec<NaiveDate>> = HashMap::new();
    for ex in exceptions {
        exceptions_by_rule
            .entry(ex.recurrence_id.as_str())
            .or_default()
            .push(ex.date);
    }

    // Manual entries claim their (participant, date) first.
    let mut taken: HashSet<(&str, NaiveDate)> = manual
        .iter()
        .map(|a| (a.participant_id.as_str(), a.date))
        .collect();

    let mut ordered: Vec<&Recurrence> = recurrences.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let mut records = Vec::new();
    for recurrence in ordered {
        let excepted = exceptions_by_rule
            .get(recurrence.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let occurrences = match Occurrences::compile(recurrence, excepted, window) {
            Ok(o) => o,
            Err(e) => {
                warn!(recurrence = %recurrence.id, error = %e, "skipping recurrence");
                continue;
            }
        };

        for date in occurrences.iter() {
            if !taken.insert((recurrence.participant_id.as_str(), date)) {
                continue;
            }
            records.push(AvailabilityRecord {
                participant_id: recurrence.participant_id.clone(),
                date,
                start_time: recurrence.start_time.clone(),
                end_time: recurrence.end_time.clone(),
                note: recurrence.note.clone(),
                source: AvailabilitySource::Recurrence,
            });
        }
    }

    records.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });

    debug!(
        recurrences = recurrences.len(),
        occurrences = records.len(),
        window_start = %window.start,
        window_end = %window.end,
        "materialized recurrences"
    );

    records
}

fn byday_code(day_of_week: u8) -> Result<&'static str, RecurrenceError> {
    let weekday =
        weekday_from_index(day_of_week).ok_or(RecurrenceError::InvalidWeekday(day_of_week))?;
    Ok(match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    })
}

/// `2026-02-17` → `20260217T000000`.
fn ical_date(date: NaiveDate) -> String {
    date.format("%Y%m%dT000000").to_string()
}
