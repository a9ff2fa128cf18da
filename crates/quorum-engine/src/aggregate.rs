//! Per-date aggregation of manual and recurrence-derived availability.
//!
//! Accepts the manual entries and the materialized occurrences of one calendar,
//! collapses them into one effective record per (participant, date), and keeps
//! only the dates on which enough distinct participants are available.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Availability, AvailabilityRecord, AvailabilitySource, Participant};

/// One participant's availability on a retained date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub participant_id: String,
    pub name: String,
    /// Stored start time; `None` means from the start of the day.
    pub start_time: Option<String>,
    /// Stored end time; `None` means until the end of the day.
    pub end_time: Option<String>,
    pub note: Option<String>,
    pub source: AvailabilitySource,
}

/// All contributions to a date that met the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAvailability {
    pub date: NaiveDate,
    /// One entry per distinct participant, ordered by name then id.
    pub entries: Vec<DailyEntry>,
}

/// Merge manual and materialized availability and keep dates meeting `threshold`.
///
/// Counting is by distinct participant, not by record: duplicate rows for the
/// same (participant, date) collapse into one, and a manual entry always wins
/// over a recurrence occurrence. Rows whose participant is unknown are dropped.
///
/// Returns retained dates in ascending order.
pub fn aggregate(
    participants: &[Participant],
    manual: &[Availability],
    occurrences: &[AvailabilityRecord],
    threshold: usize,
) -> Vec<DailyAvailability> {
    let names: HashMap<&str, &str> = participants
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    let manual_records: Vec<AvailabilityRecord> = manual.iter().map(Into::into).collect();

    // Manual records are visited first so they claim their (participant, date).
    let mut by_date: BTreeMap<NaiveDate, Vec<DailyEntry>> = BTreeMap::new();
    let mut seen: HashSet<(&str, NaiveDate)> = HashSet::new();
    let mut unknown = 0usize;

    for record in manual_records.iter().chain(occurrences.iter()) {
        let Some(name) = names.get(record.participant_id.as_str()) else {
            unknown += 1;
            continue;
        };
        if !seen.insert((record.participant_id.as_str(), record.date)) {
            continue;
        }
        by_date.entry(record.date).or_default().push(DailyEntry {
            participant_id: record.participant_id.clone(),
            name: (*name).to_string(),
            start_time: record.start_time.clone(),
            end_time: record.end_time.clone(),
            note: record.note.clone(),
            source: record.source,
        });
    }

    if unknown > 0 {
        warn!(rows = unknown, "dropped availability rows for unknown participants");
    }

    let total_dates = by_date.len();
    let retained: Vec<DailyAvailability> = by_date
        .into_iter()
        .filter(|(_, entries)| entries.len() >= threshold)
        .map(|(date, mut entries)| {
            entries.sort_by(|a, b| {
                a.name
                    .cmp(&b.name)
                    .then_with(|| a.participant_id.cmp(&b.participant_id))
            });
            DailyAvailability { date, entries }
        })
        .collect();

    debug!(
        dates = total_dates,
        retained = retained.len(),
        threshold,
        "aggregated availability"
    );

    retained
}
