//! Lot records as the ledger stores them

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::Principal;

/// Ledger-assigned lot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub u64);

impl LotId {
    /// Interpret an `add_lot` result; anything non-positive is a failure
    pub fn from_add_result(raw: i64) -> Option<Self> {
        if raw > 0 {
            Some(LotId(raw as u64))
        } else {
            None
        }
    }
}

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One status change appended to a lot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub status: String,

    pub details: String,

    /// Ledger time in nanoseconds since the Unix epoch
    pub timestamp: u64,

    pub updated_by: Principal,
}

impl Update {
    /// Wall-clock time the ledger recorded the update
    pub fn recorded_at(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.timestamp.min(i64::MAX as u64) as i64)
    }
}

/// A batch of coffee with provenance and status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,

    pub farmer: String,

    /// Harvest date as the ledger stores it; free text, ISO when entered here
    pub harvest_date: String,

    pub location: String,

    /// Current status label
    pub status: String,

    /// Chronological, append-only history
    #[serde(default)]
    pub updates: Vec<Update>,

    /// Creation time in nanoseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,
}

impl Lot {
    /// The harvest date, when it reads as a calendar date
    pub fn harvested_on(&self) -> Option<NaiveDate> {
        let text = self.harvest_date.trim();
        ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    }

    /// The most recent update, if any
    pub fn latest_update(&self) -> Option<&Update> {
        self.updates.last()
    }
}
