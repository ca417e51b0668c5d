//! Record identity
//!
//! A [`RecordId`] addresses one stored row. The store assigns it on first
//! insert and it never changes afterwards. Identities are never reused:
//! identity columns are declared `AUTOINCREMENT`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Primary key of a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw integer stored in the identity column
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a valid record identity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid record id: '{0}'")]
pub struct ParseRecordIdError(pub String);

impl FromStr for RecordId {
    type Err = ParseRecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(RecordId)
            .map_err(|_| ParseRecordIdError(s.to_string()))
    }
}

impl From<i64> for RecordId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}
