//! Feed request orchestration.
//!
//! One request reads the calendar config, checks the owner's quota, reads the
//! calendar's rows and runs them through materialization, aggregation, date
//! filtering, segmentation and rendering. Nothing is cached or shared between
//! requests; the output depends only on the stored rows, the config, `now` and
//! the serving domain.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::admissibility::admit;
use crate::aggregate::aggregate;
use crate::encoder;
use crate::error::{FeedError, Result, StoreError};
use crate::feed::{build_feed, number_slots, FeedContext, NumberedSlot};
use crate::holidays::{HolidayCalendar, RegionalHolidays};
use crate::model::CalendarConfig;
use crate::recurrence::{materialize, MaterializeWindow};
use crate::segment::segment_days;
use crate::store::{CalendarRows, CalendarStore, QuotaGate};

pub const CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// Domain embedded in event UIDs, taken from the first non-empty of the
/// forwarded host, the real host and the request's own host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingHost(String);

impl ServingHost {
    pub fn resolve(forwarded_host: Option<&str>, real_host: Option<&str>, host: &str) -> Self {
        // X-Forwarded-Host may carry a proxy chain; the client-facing host is first.
        let forwarded = forwarded_host.and_then(|h| h.split(',').next()).map(str::trim);
        let real = real_host.map(str::trim);

        let chosen = [forwarded, real, Some(host.trim())]
            .into_iter()
            .flatten()
            .find(|h| !h.is_empty())
            .unwrap_or("localhost");
        Self(chosen.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One feed request.
#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub token: String,
    pub host: ServingHost,
    pub now: DateTime<Utc>,
}

/// The rendered feed plus the metadata the HTTP layer serves it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub body: String,
    pub content_type: &'static str,
    pub filename: String,
    pub event_count: usize,
}

impl FeedResponse {
    /// Response headers: content type, no-cache directives and attachment name.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", self.content_type.to_string()),
            (
                "Cache-Control",
                "no-cache, no-store, must-revalidate".to_string(),
            ),
            ("Pragma", "no-cache".to_string()),
            ("Expires", "0".to_string()),
            (
                "Content-Disposition",
                format!("inline; filename=\"{}\"", self.filename),
            ),
        ]
    }
}

/// Numbered slots of one calendar, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotReport {
    pub calendar: CalendarConfig,
    pub slots: Vec<NumberedSlot>,
}

/// Calendar date of `now` in `timezone`; UTC when the identifier is unknown.
pub fn today_in(timezone: &str, now: DateTime<Utc>) -> NaiveDate {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => {
            warn!(timezone, "unknown timezone, using UTC date");
            now.date_naive()
        }
    }
}

/// Run every stage up to numbering on already-loaded rows.
pub fn slots_for(
    config: &CalendarConfig,
    rows: &CalendarRows,
    today: NaiveDate,
    holidays: &dyn HolidayCalendar,
) -> Vec<NumberedSlot> {
    let threshold = config.effective_threshold();

    let occurrences = MaterializeWindow::for_recurrences(&rows.recurrences, today)
        .map(|window| {
            materialize(
                &rows.recurrences,
                &rows.exceptions,
                &rows.availability,
                window,
            )
        })
        .unwrap_or_default();

    let days = aggregate(
        &rows.participants,
        &rows.availability,
        &occurrences,
        threshold,
    );
    let days = admit(days, config, holidays);
    let slots = segment_days(&days, threshold, config.min_duration_hours);

    number_slots(slots)
}

/// Serialize numbered slots as an iCalendar document.
pub fn render(
    config: &CalendarConfig,
    slots: &[NumberedSlot],
    domain: &str,
    now: DateTime<Utc>,
) -> String {
    let ctx = FeedContext {
        calendar: config,
        domain,
        now,
    };
    encoder::encode(&build_feed(slots, &ctx))
}

/// Read config and rows for `token`, enforcing the quota gate first.
fn load(
    store: &dyn CalendarStore,
    quota: &dyn QuotaGate,
    token: &str,
) -> Result<(CalendarConfig, CalendarRows)> {
    let mut config = store.calendar_config(token).map_err(upstream)?;

    if quota.is_over_quota(&config.owner_id).map_err(upstream)? {
        info!(calendar = %config.id, owner = %config.owner_id, "feed refused, quota exceeded");
        return Err(FeedError::QuotaExceeded(config.owner_id));
    }

    let rows = store.rows(&config.id).map_err(upstream)?;
    if config.total_participants == 0 {
        config.total_participants = rows.participants.len() as u32;
    }
    Ok((config, rows))
}

fn upstream(err: StoreError) -> FeedError {
    if let StoreError::Read(message) = &err {
        error!(error = %message, "store read failed");
    }
    err.into()
}

/// Numbered slots for the calendar behind `token`.
pub fn compute_slots(
    store: &dyn CalendarStore,
    quota: &dyn QuotaGate,
    token: &str,
    now: DateTime<Utc>,
) -> Result<SlotReport> {
    let (config, rows) = load(store, quota, token)?;
    let holidays = RegionalHolidays::for_timezone(&config.timezone);
    let slots = slots_for(&config, &rows, today_in(&config.timezone, now), &holidays);
    Ok(SlotReport {
        calendar: config,
        slots,
    })
}

/// Produce the feed document for one request.
///
/// # Errors
/// `FeedError::NotFound` for an unknown token, `FeedError::QuotaExceeded` when
/// the owner is over quota (checked before any computation), and
/// `FeedError::UpstreamRead` when the store fails.
pub fn generate_feed(
    store: &dyn CalendarStore,
    quota: &dyn QuotaGate,
    request: &FeedRequest,
) -> Result<FeedResponse> {
    let report = compute_slots(store, quota, &request.token, request.now)?;
    let body = render(
        &report.calendar,
        &report.slots,
        request.host.as_str(),
        request.now,
    );

    info!(
        calendar = %report.calendar.id,
        events = report.slots.len(),
        bytes = body.len(),
        "rendered feed"
    );

    Ok(FeedResponse {
        body,
        content_type: CONTENT_TYPE,
        filename: feed_filename(&report.calendar.name),
        event_count: report.slots.len(),
    })
}

/// `"Team Offsite 2026"` → `"team-offsite-2026.ics"`.
pub fn feed_filename(calendar_name: &str) -> String {
    let mut slug = String::new();
    for ch in calendar_name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "calendar.ics".to_string()
    } else {
        format!("{}.ics", slug)
    }
}
