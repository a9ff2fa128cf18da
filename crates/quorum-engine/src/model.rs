//! Stored rows, calendar configuration and derived slot types.
//!
//! Everything read from the store is plain `serde` data. Time-of-day values stay
//! as the strings the store holds (`"HH:MM"` or `"HH:MM:SS"`); they are only
//! interpreted by the segmenter, where a malformed value degrades to the
//! all-day default instead of failing the request.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// First minute of the day.
pub const DAY_START_MINUTE: u16 = 0;

/// Last representable minute of the day (23:59). Open-ended intervals end here.
pub const DAY_END_MINUTE: u16 = 1439;

/// A person taking part in one calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub calendar_id: String,
    pub name: String,
}

/// A manual, one-off availability entry. Unique per (participant, date).
///
/// `start_time`/`end_time` both `None` means "all day".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub participant_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// "Every `<weekday>` from `<start_time>` to `<end_time>`, valid from
/// `start_date` through `end_date` (or forever)".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub id: String,
    pub participant_id: String,
    /// 0 = Sunday … 6 = Saturday.
    pub day_of_week: u8,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Suppresses a single occurrence of a recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceException {
    pub recurrence_id: String,
    pub date: NaiveDate,
}

/// How public holidays affect date admissibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidaysPolicy {
    /// Holidays are treated like any other date.
    #[default]
    Ignore,
    /// Holidays are admitted on allowed weekdays; only eve handling applies.
    Allow,
    /// Holidays are never admitted.
    Block,
}

/// Per-calendar settings the engine reads but never writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Minimum number of distinct overlapping participants.
    pub threshold: u32,
    /// Allowed weekdays, 0 = Sunday … 6 = Saturday.
    #[serde(default = "all_weekdays")]
    pub allowed_weekdays: Vec<u8>,
    #[serde(default)]
    pub holidays_policy: HolidaysPolicy,
    #[serde(default)]
    pub allow_holiday_eves: bool,
    #[serde(default)]
    pub min_duration_hours: u32,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// IANA timezone identifier, e.g. `Europe/Berlin`.
    pub timezone: String,
    pub owner_id: String,
    /// Number of participants in the calendar, shown as the denominator of
    /// each event summary. Stores should fill it in; when left at 0 the
    /// pipeline counts the calendar's participant rows instead.
    #[serde(default)]
    pub total_participants: u32,
}

fn all_weekdays() -> Vec<u8> {
    (0..7).collect()
}

impl CalendarConfig {
    /// Threshold clamped to at least one participant.
    pub fn effective_threshold(&self) -> usize {
        self.threshold.max(1) as usize
    }
}

/// Where an effective availability record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilitySource {
    Manual,
    Recurrence,
}

/// One effective availability record for a (participant, date) pair, either a
/// manual entry or a materialized recurrence occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub participant_id: String,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub note: Option<String>,
    pub source: AvailabilitySource,
}

impl From<&Availability> for AvailabilityRecord {
    fn from(a: &Availability) -> Self {
        Self {
            participant_id: a.participant_id.clone(),
            date: a.date,
            start_time: a.start_time.clone(),
            end_time: a.end_time.clone(),
            note: a.note.clone(),
            source: AvailabilitySource::Manual,
        }
    }
}

/// A participant's availability on one date, normalized to minutes since
/// midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInterval {
    pub participant_id: String,
    pub name: String,
    pub start_minute: u16,
    pub end_minute: u16,
    pub note: Option<String>,
}

impl ParticipantInterval {
    /// True when the interval spans the whole day.
    pub fn is_full_day(&self) -> bool {
        self.start_minute == DAY_START_MINUTE && self.end_minute == DAY_END_MINUTE
    }

    /// True when this interval fully contains `[start, end]`.
    pub fn covers(&self, start: u16, end: u16) -> bool {
        self.start_minute <= start && self.end_minute >= end
    }
}

/// A maximal continuous range on one date where coverage meets the threshold.
///
/// Derived per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start_minute: u16,
    pub end_minute: u16,
    /// Every participant covering any segment of the slot, in input order.
    pub participants: Vec<ParticipantInterval>,
}

impl TimeSlot {
    /// A slot is all-day iff it runs exactly 00:00–23:59.
    pub fn is_all_day(&self) -> bool {
        self.start_minute == DAY_START_MINUTE && self.end_minute == DAY_END_MINUTE
    }

    /// Length in minutes; all-day slots count as a full 24 hours.
    pub fn duration_minutes(&self) -> u32 {
        if self.is_all_day() {
            24 * 60
        } else {
            u32::from(self.end_minute.saturating_sub(self.start_minute))
        }
    }
}

/// Weekday index with 0 = Sunday … 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Inverse of [`weekday_index`]; `None` for values outside 0–6.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Format a minute-of-day as `HH:MM`.
pub fn format_minute(minute: u16) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}
