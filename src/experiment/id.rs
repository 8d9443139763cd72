//! Experiment identifier

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// Unique, totally ordered experiment identifier.
///
/// The training pipeline names every experiment after the unix timestamp
/// (seconds) at which it started, so ordering by id is ordering by start time.
/// Serialized as a bare number; deserialized from either a number or a
/// decimal string, since browsers post ids scraped from the page as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ExperimentId(u64);

impl ExperimentId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Start time encoded in the id, if it is a representable timestamp.
    #[must_use]
    pub fn created_at(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

impl From<u64> for ExperimentId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ExperimentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Validation(format!("invalid experiment id {s:?}")));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|e| Error::Validation(format!("invalid experiment id {s:?}: {e}")))
    }
}

impl<'de> Deserialize<'de> for ExperimentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(raw) => Ok(Self(raw)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}
