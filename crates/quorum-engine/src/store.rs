//! Read contracts the engine consumes, plus an in-memory implementation.
//!
//! The engine never writes. A feed request reads one calendar config and the
//! raw availability/recurrence rows of that calendar, then computes everything
//! itself, so threshold semantics do not depend on the store.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{Availability, CalendarConfig, Participant, Recurrence, RecurrenceException};

/// Every stored row of one calendar the pipeline needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarRows {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub availability: Vec<Availability>,
    #[serde(default)]
    pub recurrences: Vec<Recurrence>,
    #[serde(default)]
    pub exceptions: Vec<RecurrenceException>,
}

/// Source of calendar configs and availability rows.
pub trait CalendarStore {
    /// Config of the calendar published under `ics_token`.
    ///
    /// # Errors
    /// `StoreError::NotFound` for an unknown token, `StoreError::Read` when the
    /// store fails.
    fn calendar_config(&self, ics_token: &str) -> Result<CalendarConfig, StoreError>;

    fn participants(&self, calendar_id: &str) -> Result<Vec<Participant>, StoreError>;

    fn availability(&self, calendar_id: &str) -> Result<Vec<Availability>, StoreError>;

    fn recurrences(&self, calendar_id: &str) -> Result<Vec<Recurrence>, StoreError>;

    fn recurrence_exceptions(
        &self,
        calendar_id: &str,
    ) -> Result<Vec<RecurrenceException>, StoreError>;

    /// All rows of a calendar in one call.
    fn rows(&self, calendar_id: &str) -> Result<CalendarRows, StoreError> {
        Ok(CalendarRows {
            participants: self.participants(calendar_id)?,
            availability: self.availability(calendar_id)?,
            recurrences: self.recurrences(calendar_id)?,
            exceptions: self.recurrence_exceptions(calendar_id)?,
        })
    }
}

/// Entitlement check for calendar owners.
pub trait QuotaGate {
    fn is_over_quota(&self, owner_id: &str) -> Result<bool, StoreError>;
}

/// A gate that never reports an owner over quota.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQuota;

impl QuotaGate for NoQuota {
    fn is_over_quota(&self, _owner_id: &str) -> Result<bool, StoreError> {
        Ok(false)
    }
}

/// A gate with a fixed set of over-quota owners.
#[derive(Debug, Clone, Default)]
pub struct FixedQuota {
    over: HashSet<String>,
}

impl FixedQuota {
    pub fn new<I, S>(owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            over: owners.into_iter().map(Into::into).collect(),
        }
    }
}

impl QuotaGate for FixedQuota {
    fn is_over_quota(&self, owner_id: &str) -> Result<bool, StoreError> {
        Ok(self.over.contains(owner_id))
    }
}

/// One calendar in a [`MemoryStore`] snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCalendar {
    /// Feed token the calendar is published under.
    pub token: String,
    pub config: CalendarConfig,
    #[serde(flatten)]
    pub rows: CalendarRows,
}

/// In-memory store loaded from a JSON snapshot.
///
/// ```
/// use quorum_engine::store::{CalendarStore, MemoryStore};
///
/// let store = MemoryStore::from_json(r#"{"calendars": []}"#).unwrap();
/// assert!(store.calendar_config("missing").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    pub calendars: Vec<StoredCalendar>,
}

impl MemoryStore {
    pub fn new(calendars: Vec<StoredCalendar>) -> Self {
        Self { calendars }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn by_id(&self, calendar_id: &str) -> Result<&StoredCalendar, StoreError> {
        self.calendars
            .iter()
            .find(|c| c.config.id == calendar_id)
            .ok_or_else(|| StoreError::Read(format!("unknown calendar id '{}'", calendar_id)))
    }
}

impl CalendarStore for MemoryStore {
    fn calendar_config(&self, ics_token: &str) -> Result<CalendarConfig, StoreError> {
        let stored = self
            .calendars
            .iter()
            .find(|c| c.token == ics_token)
            .ok_or_else(|| StoreError::NotFound(ics_token.to_string()))?;

        let mut config = stored.config.clone();
        config.total_participants = stored.rows.participants.len() as u32;
        Ok(config)
    }

    fn participants(&self, calendar_id: &str) -> Result<Vec<Participant>, StoreError> {
        Ok(self.by_id(calendar_id)?.rows.participants.clone())
    }

    fn availability(&self, calendar_id: &str) -> Result<Vec<Availability>, StoreError> {
        Ok(self.by_id(calendar_id)?.rows.availability.clone())
    }

    fn recurrences(&self, calendar_id: &str) -> Result<Vec<Recurrence>, StoreError> {
        Ok(self.by_id(calendar_id)?.rows.recurrences.clone())
    }

    fn recurrence_exceptions(
        &self,
        calendar_id: &str,
    ) -> Result<Vec<RecurrenceException>, StoreError> {
        Ok(self.by_id(calendar_id)?.rows.exceptions.clone())
    }
}
