//! Error types for quorum-engine operations.

use thiserror::Error;

/// Failures reported by a [`CalendarStore`](crate::store::CalendarStore) or
/// [`QuotaGate`](crate::store::QuotaGate).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No calendar is published under this feed token.
    #[error("no calendar for feed token '{0}'")]
    NotFound(String),

    /// The underlying data store failed while reading rows.
    #[error("store read failed: {0}")]
    Read(String),
}

/// A stored recurrence that cannot be turned into an expansion rule.
///
/// Never fatal for a feed: the materializer logs and skips the row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("invalid day of week {0}, expected 0-6")]
    InvalidWeekday(u8),

    #[error("invalid recurrence rule: {0}")]
    InvalidRule(String),
}

/// Terminal conditions of a feed request.
///
/// Empty availability, zero qualifying dates and fully filtered slot lists are
/// not errors: they produce a valid, empty feed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Unknown feed token.
    #[error("calendar not found: {0}")]
    NotFound(String),

    /// The calendar owner is over their entitlement.
    #[error("quota exceeded for owner '{0}'")]
    QuotaExceeded(String),

    /// Reading the calendar config or its rows failed.
    #[error("upstream read failed: {0}")]
    UpstreamRead(String),
}

impl FeedError {
    /// HTTP status the serving layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            FeedError::NotFound(_) => 404,
            FeedError::QuotaExceeded(_) => 403,
            FeedError::UpstreamRead(_) => 500,
        }
    }
}

impl From<StoreError> for FeedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(token) => FeedError::NotFound(token),
            StoreError::Read(message) => FeedError::UpstreamRead(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
