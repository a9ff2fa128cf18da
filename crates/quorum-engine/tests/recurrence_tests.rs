//! Tests for recurrence materialization.

use chrono::{Datelike, NaiveDate, Weekday};
use quorum_engine::error::RecurrenceError;
use quorum_engine::model::{Availability, AvailabilitySource, Recurrence, RecurrenceException};
use quorum_engine::recurrence::{materialize, MaterializeWindow, Occurrences, HORIZON_DAYS};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn rule(id: &str, participant: &str, day_of_week: u8, start: NaiveDate, end: Option<NaiveDate>) -> Recurrence {
    Recurrence {
        id: id.to_string(),
        participant_id: participant.to_string(),
        day_of_week,
        start_time: Some("18:00".to_string()),
        end_time: Some("22:00".to_string()),
        start_date: start,
        end_date: end,
        note: Some(format!("from {}", id)),
    }
}

fn manual(participant: &str, date: NaiveDate) -> Availability {
    Availability {
        participant_id: participant.to_string(),
        date,
        start_time: None,
        end_time: None,
        note: None,
    }
}

fn exception(recurrence: &str, date: NaiveDate) -> RecurrenceException {
    RecurrenceException {
        recurrence_id: recurrence.to_string(),
        date,
    }
}

fn march() -> MaterializeWindow {
    MaterializeWindow {
        start: d(2026, 3, 1),
        end: d(2026, 3, 31),
    }
}

// ── Occurrences ─────────────────────────────────────────────────────────────

#[test]
fn weekly_rule_hits_every_matching_weekday() {
    // 1 = Monday. March 2026 Mondays: 2, 9, 16, 23, 30.
    let r = rule("r1", "p1", 1, d(2026, 3, 1), Some(d(2026, 3, 31)));
    let occ = Occurrences::compile(&r, &[], march()).unwrap();

    let dates: Vec<NaiveDate> = occ.iter().collect();
    assert_eq!(
        dates,
        vec![d(2026, 3, 2), d(2026, 3, 9), d(2026, 3, 16), d(2026, 3, 23), d(2026, 3, 30)]
    );
    assert!(dates.iter().all(|date| date.weekday() == Weekday::Mon));
}

#[test]
fn sunday_is_day_zero() {
    let r = rule("r1", "p1", 0, d(2026, 3, 1), Some(d(2026, 3, 10)));
    let dates: Vec<NaiveDate> = Occurrences::compile(&r, &[], march()).unwrap().iter().collect();
    assert_eq!(dates, vec![d(2026, 3, 1), d(2026, 3, 8)]);
}

#[test]
fn exceptions_suppress_single_occurrences() {
    let r = rule("r1", "p1", 1, d(2026, 3, 1), Some(d(2026, 3, 31)));
    let occ = Occurrences::compile(&r, &[d(2026, 3, 9), d(2026, 3, 23)], march()).unwrap();

    let dates: Vec<NaiveDate> = occ.iter().collect();
    assert_eq!(dates, vec![d(2026, 3, 2), d(2026, 3, 16), d(2026, 3, 30)]);
}

#[test]
fn rule_validity_range_is_respected() {
    // Starts on a Wednesday, ends mid-month.
    let r = rule("r1", "p1", 1, d(2026, 3, 4), Some(d(2026, 3, 20)));
    let dates: Vec<NaiveDate> = Occurrences::compile(&r, &[], march()).unwrap().iter().collect();
    assert_eq!(dates, vec![d(2026, 3, 9), d(2026, 3, 16)]);
}

#[test]
fn open_ended_rule_stops_at_window_end() {
    let r = rule("r1", "p1", 1, d(2026, 3, 1), None);
    let dates: Vec<NaiveDate> = Occurrences::compile(&r, &[], march()).unwrap().iter().collect();
    assert_eq!(dates.last(), Some(&d(2026, 3, 30)));
}

#[test]
fn rule_outside_window_has_no_occurrences() {
    let r = rule("r1", "p1", 1, d(2026, 5, 1), None);
    let occ = Occurrences::compile(&r, &[], march()).unwrap();
    assert_eq!(occ.iter().count(), 0);
}

#[test]
fn iteration_is_restartable() {
    let r = rule("r1", "p1", 5, d(2026, 3, 1), None);
    let occ = Occurrences::compile(&r, &[], march()).unwrap();

    let first: Vec<NaiveDate> = occ.iter().collect();
    let second: Vec<NaiveDate> = occ.iter().collect();
    assert_eq!(first, second);
    assert_eq!(occ.iter().take(2).count(), 2);
}

#[test]
fn invalid_weekday_is_rejected() {
    let r = rule("r1", "p1", 7, d(2026, 3, 1), None);
    let err = Occurrences::compile(&r, &[], march()).unwrap_err();
    assert_eq!(err, RecurrenceError::InvalidWeekday(7));
}

// ── Window ──────────────────────────────────────────────────────────────────

#[test]
fn window_spans_earliest_start_to_latest_end() {
    let rules = vec![
        rule("r1", "p1", 1, d(2026, 2, 1), Some(d(2026, 4, 1))),
        rule("r2", "p2", 2, d(2026, 3, 1), Some(d(2026, 6, 1))),
    ];
    let window = MaterializeWindow::for_recurrences(&rules, d(2026, 3, 1)).unwrap();
    assert_eq!(window.start, d(2026, 2, 1));
    assert_eq!(window.end, d(2026, 6, 1));
}

#[test]
fn open_ended_rules_extend_to_horizon() {
    let today = d(2026, 3, 1);
    let rules = vec![rule("r1", "p1", 1, d(2026, 1, 1), None)];
    let window = MaterializeWindow::for_recurrences(&rules, today).unwrap();
    assert_eq!(window.end, today + chrono::Days::new(HORIZON_DAYS));
}

#[test]
fn window_end_is_capped_one_year_ahead() {
    let today = d(2026, 3, 1);
    let rules = vec![rule("r1", "p1", 1, d(2026, 1, 1), Some(d(2030, 1, 1)))];
    let window = MaterializeWindow::for_recurrences(&rules, today).unwrap();
    assert_eq!(window.end, d(2027, 3, 1));
}

#[test]
fn no_window_without_recurrences_or_beyond_horizon() {
    assert_eq!(MaterializeWindow::for_recurrences(&[], d(2026, 3, 1)), None);

    let far = vec![rule("r1", "p1", 1, d(2028, 1, 1), None)];
    assert_eq!(MaterializeWindow::for_recurrences(&far, d(2026, 3, 1)), None);
}

// ── materialize ─────────────────────────────────────────────────────────────

#[test]
fn occurrences_carry_rule_times_and_note() {
    let rules = vec![rule("r1", "p1", 1, d(2026, 3, 1), Some(d(2026, 3, 8)))];
    let records = materialize(&rules, &[], &[], march());

    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.participant_id, "p1");
    assert_eq!(rec.date, d(2026, 3, 2));
    assert_eq!(rec.start_time.as_deref(), Some("18:00"));
    assert_eq!(rec.end_time.as_deref(), Some("22:00"));
    assert_eq!(rec.note.as_deref(), Some("from r1"));
    assert_eq!(rec.source, AvailabilitySource::Recurrence);
}

#[test]
fn manual_entry_suppresses_occurrence_for_same_participant_only() {
    let rules = vec![
        rule("r1", "p1", 1, d(2026, 3, 1), Some(d(2026, 3, 31))),
        rule("r2", "p2", 1, d(2026, 3, 1), Some(d(2026, 3, 31))),
    ];
    let manual_rows = vec![manual("p1", d(2026, 3, 9))];

    let records = materialize(&rules, &[], &manual_rows, march());

    assert!(!records
        .iter()
        .any(|r| r.participant_id == "p1" && r.date == d(2026, 3, 9)));
    assert!(records
        .iter()
        .any(|r| r.participant_id == "p2" && r.date == d(2026, 3, 9)));
    assert_eq!(records.len(), 9);
}

#[test]
fn exceptions_apply_only_to_their_rule() {
    let rules = vec![
        rule("r1", "p1", 1, d(2026, 3, 1), Some(d(2026, 3, 31))),
        rule("r2", "p2", 1, d(2026, 3, 1), Some(d(2026, 3, 31))),
    ];
    let exceptions = vec![exception("r1", d(2026, 3, 16))];

    let records = materialize(&rules, &exceptions, &[], march());

    let on_16th: Vec<&str> = records
        .iter()
        .filter(|r| r.date == d(2026, 3, 16))
        .map(|r| r.participant_id.as_str())
        .collect();
    assert_eq!(on_16th, vec!["p2"]);
}

#[test]
fn overlapping_rules_of_one_participant_emit_once_lowest_id_wins() {
    let rules = vec![
        rule("r2", "p1", 1, d(2026, 3, 1), Some(d(2026, 3, 8))),
        rule("r1", "p1", 1, d(2026, 3, 1), Some(d(2026, 3, 8))),
    ];

    let records = materialize(&rules, &[], &[], march());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].note.as_deref(), Some("from r1"));
}

#[test]
fn invalid_rule_is_skipped_not_fatal() {
    let rules = vec![
        rule("bad", "p1", 9, d(2026, 3, 1), None),
        rule("good", "p2", 1, d(2026, 3, 1), Some(d(2026, 3, 8))),
    ];

    let records = materialize(&rules, &[], &[], march());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].participant_id, "p2");
}

#[test]
fn output_is_sorted_by_date_then_participant() {
    let rules = vec![
        rule("r1", "zoe", 1, d(2026, 3, 1), Some(d(2026, 3, 31))),
        rule("r2", "amy", 3, d(2026, 3, 1), Some(d(2026, 3, 31))),
        rule("r3", "bob", 1, d(2026, 3, 1), Some(d(2026, 3, 31))),
    ];

    let records = materialize(&rules, &[], &[], march());

    let keys: Vec<(NaiveDate, &str)> = records
        .iter()
        .map(|r| (r.date, r.participant_id.as_str()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert_eq!(keys[0], (d(2026, 3, 2), "bob"));
    assert_eq!(keys[1], (d(2026, 3, 2), "zoe"));
}

#[test]
fn materialization_is_deterministic() {
    let rules = vec![
        rule("r1", "p1", 1, d(2026, 3, 1), None),
        rule("r2", "p2", 4, d(2026, 3, 1), None),
    ];
    let exceptions = vec![exception("r2", d(2026, 3, 12))];
    let manual_rows = vec![manual("p1", d(2026, 3, 16))];

    let a = materialize(&rules, &exceptions, &manual_rows, march());
    let b = materialize(&rules, &exceptions, &manual_rows, march());
    assert_eq!(a, b);
}
