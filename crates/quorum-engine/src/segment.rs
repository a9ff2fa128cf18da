//! Time-slot segmentation -- finds the parts of a day where enough
//! participants overlap.
//!
//! The day is cut at every participant start/end minute (plus 00:00 and
//! 23:59). Each resulting segment is covered by the participants whose interval
//! fully contains it. Consecutive segments whose coverage meets the threshold
//! are merged into one [`TimeSlot`] by [`SlotAccumulator`], a two-state walk
//! (`Idle` / `Open`) over the segments in time order.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::{debug, warn};

use crate::aggregate::{DailyAvailability, DailyEntry};
use crate::model::{ParticipantInterval, TimeSlot, DAY_END_MINUTE, DAY_START_MINUTE};

/// A span between two consecutive boundaries and who covers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: u16,
    pub end: u16,
    /// Indices into the day's interval list.
    pub participants: Vec<usize>,
}

/// A merged run of qualifying segments, before it is attached to a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpan {
    pub start: u16,
    pub end: u16,
    pub participants: BTreeSet<usize>,
}

/// State of the merge walk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotAccumulator {
    /// Not inside a slot.
    #[default]
    Idle,
    /// Inside a slot that started at `start` and currently ends at `end`.
    Open {
        start: u16,
        end: u16,
        participants: BTreeSet<usize>,
    },
}

impl SlotAccumulator {
    /// Feed the next segment. Returns the new state and, when this segment
    /// closes an open slot, the finished span.
    pub fn step(self, segment: &Segment, qualifies: bool) -> (Self, Option<SlotSpan>) {
        match (self, qualifies) {
            (SlotAccumulator::Idle, false) => (SlotAccumulator::Idle, None),
            (SlotAccumulator::Idle, true) => (
                SlotAccumulator::Open {
                    start: segment.start,
                    end: segment.end,
                    participants: segment.participants.iter().copied().collect(),
                },
                None,
            ),
            (
                SlotAccumulator::Open {
                    start,
                    mut participants,
                    ..
                },
                true,
            ) => {
                participants.extend(segment.participants.iter().copied());
                (
                    SlotAccumulator::Open {
                        start,
                        end: segment.end,
                        participants,
                    },
                    None,
                )
            }
            (open @ SlotAccumulator::Open { .. }, false) => (SlotAccumulator::Idle, open.finish()),
        }
    }

    /// Close the walk at end of day.
    pub fn finish(self) -> Option<SlotSpan> {
        match self {
            SlotAccumulator::Idle => None,
            SlotAccumulator::Open {
                start,
                end,
                participants,
            } => Some(SlotSpan {
                start,
                end,
                participants,
            }),
        }
    }
}

/// Parse a stored time-of-day (`HH:MM`, `HH:MM:SS` or with fractional
/// seconds) into minutes since midnight.
pub fn parse_minute(value: &str) -> Option<u16> {
    let trimmed = value.trim();
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .map(|t| (t.hour() * 60 + t.minute()) as u16)
}

/// Normalize a daily entry to minutes. Missing bounds mean the whole day;
/// malformed bounds are logged and treated the same way.
pub fn normalize(date: NaiveDate, entry: &DailyEntry) -> ParticipantInterval {
    let bound = |value: Option<&str>, default: u16, which: &str| match value {
        None => default,
        Some(raw) => parse_minute(raw).unwrap_or_else(|| {
            warn!(
                participant = %entry.participant_id,
                %date,
                value = raw,
                bound = which,
                "malformed time, using all-day default"
            );
            default
        }),
    };

    ParticipantInterval {
        participant_id: entry.participant_id.clone(),
        name: entry.name.clone(),
        start_minute: bound(entry.start_time.as_deref(), DAY_START_MINUTE, "start"),
        end_minute: bound(entry.end_time.as_deref(), DAY_END_MINUTE, "end"),
        note: entry.note.clone(),
    }
}

/// Sorted distinct boundary minutes, always including 00:00 and 23:59.
pub fn boundaries(intervals: &[ParticipantInterval]) -> Vec<u16> {
    let mut set = BTreeSet::from([DAY_START_MINUTE, DAY_END_MINUTE]);
    for interval in intervals {
        set.insert(interval.start_minute.min(DAY_END_MINUTE));
        set.insert(interval.end_minute.min(DAY_END_MINUTE));
    }
    set.into_iter().collect()
}

/// Segments between consecutive boundaries with their covering participants.
pub fn segments(intervals: &[ParticipantInterval]) -> Vec<Segment> {
    boundaries(intervals)
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            let participants = intervals
                .iter()
                .enumerate()
                .filter(|(_, interval)| interval.covers(start, end))
                .map(|(i, _)| i)
                .collect();
            Segment {
                start,
                end,
                participants,
            }
        })
        .collect()
}

/// Every maximal slot on one date where coverage meets `threshold`.
///
/// No minimum-duration filtering happens here; see [`segment_days`].
pub fn segment_day(
    date: NaiveDate,
    intervals: &[ParticipantInterval],
    threshold: usize,
) -> Vec<TimeSlot> {
    if intervals.is_empty() {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut state = SlotAccumulator::Idle;
    for segment in segments(intervals) {
        let qualifies = segment.participants.len() >= threshold;
        let (next, closed) = state.step(&segment, qualifies);
        state = next;
        spans.extend(closed);
    }
    spans.extend(state.finish());

    spans
        .into_iter()
        .map(|span| TimeSlot {
            date,
            start_minute: span.start,
            end_minute: span.end,
            participants: span
                .participants
                .iter()
                .map(|&i| intervals[i].clone())
                .collect(),
        })
        .collect()
}

/// True when the slot lasts at least `min_duration_hours`.
/// All-day slots always pass.
pub fn meets_min_duration(slot: &TimeSlot, min_duration_hours: u32) -> bool {
    slot.is_all_day() || slot.duration_minutes() >= min_duration_hours.saturating_mul(60)
}

/// Segment every admitted date and drop slots shorter than the minimum
/// duration. Slots come back ordered by date, then start.
pub fn segment_days(
    days: &[DailyAvailability],
    threshold: usize,
    min_duration_hours: u32,
) -> Vec<TimeSlot> {
    let mut slots = Vec::new();
    let mut too_short = 0usize;

    for day in days {
        let intervals: Vec<ParticipantInterval> = day
            .entries
            .iter()
            .map(|entry| normalize(day.date, entry))
            .collect();

        for slot in segment_day(day.date, &intervals, threshold) {
            if meets_min_duration(&slot, min_duration_hours) {
                slots.push(slot);
            } else {
                too_short += 1;
            }
        }
    }

    debug!(
        dates = days.len(),
        slots = slots.len(),
        too_short,
        "segmented dates"
    );

    slots
}
