//! # quorum-engine
//!
//! Group availability aggregation and iCalendar feed rendering.
//!
//! Participants declare when they are available, either on single dates or as
//! weekly recurring patterns with exceptions. The engine finds the dates and
//! time ranges where at least a calendar's threshold of participants overlap
//! and publishes them as a subscribable feed.
//!
//! ## Pipeline
//!
//! stored rows → [`recurrence`] → [`aggregate`] → [`admissibility`] →
//! [`segment`] → [`feed`] → [`encoder`]
//!
//! ## Modules
//!
//! - [`recurrence`]: weekly rules → concrete per-date occurrences (via `rrule`)
//! - [`aggregate`]: manual + recurring availability per date, thresholded
//! - [`admissibility`]: calendar range, weekday and holiday filters
//! - [`holidays`]: public holiday rule table behind a trait
//! - [`segment`]: per-day time slots where coverage meets the threshold
//! - [`feed`]: numbered slots → feed events with stable UIDs
//! - [`encoder`]: feed → RFC 5545 text
//! - [`store`]: read contracts and an in-memory store
//! - [`pipeline`]: request orchestration, quota gate, response metadata
//! - [`model`]: stored rows and derived types
//! - [`error`]: Error types
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use quorum_engine::pipeline::{generate_feed, FeedRequest, ServingHost};
//! use quorum_engine::store::{MemoryStore, NoQuota};
//!
//! let store = MemoryStore::from_json(r#"{
//!   "calendars": [{
//!     "token": "t0k3n",
//!     "config": {"id": "cal-1", "name": "Board games", "threshold": 2,
//!                "timezone": "UTC", "owner_id": "owner-1"},
//!     "participants": [{"id": "p1", "name": "Ana"}, {"id": "p2", "name": "Ben"}],
//!     "availability": [
//!       {"participant_id": "p1", "date": "2026-03-14", "start_time": "10:00", "end_time": "18:00"},
//!       {"participant_id": "p2", "date": "2026-03-14", "start_time": "12:00", "end_time": "20:00"}
//!     ]
//!   }]
//! }"#).unwrap();
//!
//! let request = FeedRequest {
//!     token: "t0k3n".to_string(),
//!     host: ServingHost::resolve(None, None, "feeds.example.org"),
//!     now: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
//! };
//! let response = generate_feed(&store, &NoQuota, &request).unwrap();
//! assert_eq!(response.event_count, 1);
//! assert!(response.body.contains("DTSTART:20260314T120000\r\n"));
//! ```

pub mod admissibility;
pub mod aggregate;
pub mod encoder;
pub mod error;
pub mod feed;
pub mod holidays;
pub mod model;
pub mod pipeline;
pub mod recurrence;
pub mod segment;
pub mod store;

pub use admissibility::is_date_allowed;
pub use error::{FeedError, StoreError};
pub use model::{CalendarConfig, HolidaysPolicy, TimeSlot};
pub use pipeline::{generate_feed, FeedRequest, FeedResponse, ServingHost};
pub use segment::segment_day;
