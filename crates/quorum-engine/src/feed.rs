//! Calendar feed model -- numbers slots and turns them into feed events.
//!
//! Events carry everything the wire encoder needs: a stable UID, floating or
//! all-day times, a summary with the participant fraction, a description
//! listing contributors, and one attendee per contributor. Serialization lives
//! in [`crate::encoder`].

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{format_minute, CalendarConfig, TimeSlot};

/// Local part of the fixed attendee address (`noreply@<domain>`).
pub const NO_REPLY_USER: &str = "noreply";

/// A slot with its position in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberedSlot {
    /// 1-based position across the whole filtered feed.
    pub number: usize,
    /// 0-based position among the slots of the same date.
    pub slot_index: usize,
    #[serde(flatten)]
    pub slot: TimeSlot,
}

/// Number slots already ordered by (date, start).
///
/// Numbering runs after every filter, so dropped slots never consume a number.
pub fn number_slots(slots: Vec<TimeSlot>) -> Vec<NumberedSlot> {
    let mut previous: Option<NaiveDate> = None;
    let mut slot_index = 0;

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot_index = if previous == Some(slot.date) {
                slot_index + 1
            } else {
                0
            };
            previous = Some(slot.date);
            NumberedSlot {
                number: i + 1,
                slot_index,
                slot,
            }
        })
        .collect()
}

/// Start or end of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventTime {
    /// Wall-clock time without a timezone.
    Floating(NaiveDateTime),
    /// Date-only value for all-day events.
    AllDay(NaiveDate),
}

/// An attendee entry (always accepted, required, individual).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEvent {
    pub uid: String,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub summary: String,
    pub description: String,
    pub attendees: Vec<Attendee>,
}

impl FeedEvent {
    /// End of the event; a missing end means one hour after a floating start,
    /// or the next day for an all-day start.
    pub fn resolved_end(&self) -> EventTime {
        if let Some(end) = self.end {
            return end;
        }
        match self.start {
            EventTime::Floating(start) => EventTime::Floating(start + Duration::hours(1)),
            EventTime::AllDay(date) => {
                EventTime::AllDay(date.checked_add_days(Days::new(1)).unwrap_or(date))
            }
        }
    }
}

/// A complete feed, ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feed {
    pub name: String,
    pub description: String,
    pub timezone: String,
    /// Value used for every event's `DTSTAMP`.
    pub stamp: DateTime<Utc>,
    pub events: Vec<FeedEvent>,
}

/// Request-level inputs to rendering.
#[derive(Debug, Clone, Copy)]
pub struct FeedContext<'a> {
    pub calendar: &'a CalendarConfig,
    /// Serving domain embedded in UIDs and attendee addresses.
    pub domain: &'a str,
    pub now: DateTime<Utc>,
}

/// Deterministic event UID: a digest of (calendar, date, slot index) with the
/// serving domain appended after `@`.
pub fn event_uid(calendar_id: &str, date: NaiveDate, slot_index: usize, domain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(calendar_id.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(slot_index.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}@{}", &digest[..32], domain)
}

/// `"<name> #<n> (<available>/<total>)"`.
pub fn summary(calendar_name: &str, number: usize, available: usize, total: u32) -> String {
    format!("{} #{} ({}/{})", calendar_name, number, available, total)
}

/// One line per contributor, then the calendar description.
///
/// A contributor's own range is shown only when they are not available the
/// whole day; their note follows in parentheses.
pub fn describe(slot: &TimeSlot, calendar_description: &str) -> String {
    let mut lines: Vec<String> = slot
        .participants
        .iter()
        .map(|p| {
            let mut line = p.name.clone();
            if !p.is_full_day() {
                line.push_str(&format!(
                    " {}-{}",
                    format_minute(p.start_minute),
                    format_minute(p.end_minute)
                ));
            }
            if let Some(note) = p.note.as_deref().filter(|n| !n.trim().is_empty()) {
                line.push_str(&format!(" ({})", note.trim()));
            }
            line
        })
        .collect();

    let calendar_description = calendar_description.trim();
    if !calendar_description.is_empty() {
        lines.push(String::new());
        lines.push(calendar_description.to_string());
    }

    lines.join("\n")
}

fn slot_times(slot: &TimeSlot) -> (EventTime, Option<EventTime>) {
    if slot.is_all_day() {
        let next = slot.date.checked_add_days(Days::new(1));
        return (EventTime::AllDay(slot.date), next.map(EventTime::AllDay));
    }
    let at = |minute: u16| {
        NaiveTime::from_hms_opt(u32::from(minute / 60), u32::from(minute % 60), 0)
            .map(|t| EventTime::Floating(slot.date.and_time(t)))
    };
    let start = at(slot.start_minute)
        .unwrap_or(EventTime::Floating(slot.date.and_time(NaiveTime::MIN)));
    (start, at(slot.end_minute))
}

/// Build one event per numbered slot.
pub fn build_feed(slots: &[NumberedSlot], ctx: &FeedContext<'_>) -> Feed {
    let calendar = ctx.calendar;
    let address = format!("{}@{}", NO_REPLY_USER, ctx.domain);

    let events = slots
        .iter()
        .map(|numbered| {
            let slot = &numbered.slot;
            let (start, end) = slot_times(slot);
            FeedEvent {
                uid: event_uid(&calendar.id, slot.date, numbered.slot_index, ctx.domain),
                start,
                end,
                summary: summary(
                    &calendar.name,
                    numbered.number,
                    slot.participants.len(),
                    calendar.total_participants,
                ),
                description: describe(slot, &calendar.description),
                attendees: slot
                    .participants
                    .iter()
                    .map(|p| Attendee {
                        name: p.name.clone(),
                        address: address.clone(),
                    })
                    .collect(),
            }
        })
        .collect();

    Feed {
        name: calendar.name.clone(),
        description: calendar.description.clone(),
        timezone: calendar.timezone.clone(),
        stamp: ctx.now,
        events,
    }
}
