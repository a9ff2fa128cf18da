//! iCalendar (RFC 5545) encoder -- serializes a [`Feed`] into a `VCALENDAR`
//! document.
//!
//! Output rules:
//!
//! - **CRLF** line endings on every content line, including the last
//! - **Folding**: lines longer than 75 octets continue on the next line after
//!   CRLF + one space, never splitting a UTF-8 character
//! - **TEXT escaping**: `\`, `;`, `,` and newlines are backslash-escaped
//! - **Parameter values** are always double-quoted, with `"` removed
//! - **Floating times** are written without `Z` or `TZID`; all-day values use
//!   `VALUE=DATE`

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::feed::{EventTime, Feed, FeedEvent};

/// Product identifier written to every feed.
pub const PRODUCT_ID: &str = "-//Quorum//Availability Feed 1.0//EN";

/// Client refresh hint.
pub const REFRESH_INTERVAL: &str = "PT1H";

const CRLF: &str = "\r\n";
const MAX_LINE_OCTETS: usize = 75;

/// Encode a feed as an iCalendar document.
pub fn encode(feed: &Feed) -> String {
    let mut out = String::new();

    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{}", PRODUCT_ID));
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    push_line(&mut out, &format!("X-WR-CALNAME:{}", escape_text(&feed.name)));
    if !feed.description.trim().is_empty() {
        push_line(
            &mut out,
            &format!("X-WR-CALDESC:{}", escape_text(feed.description.trim())),
        );
    }
    push_line(&mut out, &format!("X-WR-TIMEZONE:{}", escape_text(&feed.timezone)));
    push_line(
        &mut out,
        &format!("REFRESH-INTERVAL;VALUE=DURATION:{}", REFRESH_INTERVAL),
    );
    push_line(&mut out, &format!("X-PUBLISHED-TTL:{}", REFRESH_INTERVAL));

    for event in &feed.events {
        encode_event(event, feed.stamp, &mut out);
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

fn encode_event(event: &FeedEvent, stamp: DateTime<Utc>, out: &mut String) {
    push_line(out, "BEGIN:VEVENT");
    push_line(out, &format!("UID:{}", event.uid));
    push_line(out, &format!("DTSTAMP:{}", format_utc(stamp)));
    push_line(out, &time_property("DTSTART", event.start));
    push_line(out, &time_property("DTEND", event.resolved_end()));
    push_line(out, &format!("SUMMARY:{}", escape_text(&event.summary)));
    if !event.description.is_empty() {
        push_line(
            out,
            &format!("DESCRIPTION:{}", escape_text(&event.description)),
        );
    }
    push_line(out, "TRANSP:TRANSPARENT");
    push_line(out, "STATUS:CONFIRMED");
    for attendee in &event.attendees {
        push_line(
            out,
            &format!(
                "ATTENDEE;CN={};CUTYPE=INDIVIDUAL;PARTSTAT=ACCEPTED;ROLE=REQ-PARTICIPANT:mailto:{}",
                quote_param(&attendee.name),
                attendee.address
            ),
        );
    }
    push_line(out, "END:VEVENT");
}

/// `DTSTART:20260317T100000` or `DTSTART;VALUE=DATE:20260317`.
fn time_property(name: &str, time: EventTime) -> String {
    match time {
        EventTime::Floating(dt) => format!("{}:{}", name, format_floating(dt)),
        EventTime::AllDay(date) => format!("{};VALUE=DATE:{}", name, format_date(date)),
    }
}

fn format_floating(dt: NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT value (RFC 5545 §3.3.11).
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Quote a parameter value. DQUOTE and control characters cannot appear inside
/// a quoted-string and are dropped.
pub fn quote_param(value: &str) -> String {
    let inner: String = value
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    format!("\"{}\"", inner)
}

/// Append a content line, folding it at 75 octets.
fn push_line(out: &mut String, line: &str) {
    let mut remaining = line;
    let mut limit = MAX_LINE_OCTETS;

    while remaining.len() > limit {
        let mut cut = limit;
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&remaining[..cut]);
        out.push_str(CRLF);
        out.push(' ');
        remaining = &remaining[cut..];
        // Continuation lines spend one octet on the leading space.
        limit = MAX_LINE_OCTETS - 1;
    }

    out.push_str(remaining);
    out.push_str(CRLF);
}
