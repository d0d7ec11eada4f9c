//! Temporal extent of a data product
//!
//! A product is stamped either with a single `datetime` or with a
//! `start_datetime`/`end_datetime` pair. Modelling the two as enum variants
//! makes "both forms present" unrepresentable.

use crate::error::{PublishError, PublishResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire format of temporal values, whole seconds in UTC
pub const TEMPORAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemporalExtent {
    Interval {
        #[serde(with = "utc_seconds")]
        start_datetime: DateTime<Utc>,
        #[serde(with = "utc_seconds")]
        end_datetime: DateTime<Utc>,
    },
    Instant {
        #[serde(with = "utc_seconds")]
        datetime: DateTime<Utc>,
    },
}

impl TemporalExtent {
    /// Build from optional bounds
    ///
    /// A lone start is an instant, both bounds an interval, neither nothing.
    /// An end without a start, or an end before its start, is rejected.
    pub fn from_bounds(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> PublishResult<Option<Self>> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(datetime), None) => Ok(Some(Self::Instant { datetime })),
            (Some(start_datetime), Some(end_datetime)) => {
                if end_datetime < start_datetime {
                    return Err(PublishError::validation(format!(
                        "datetime end {} is before start {}",
                        end_datetime.format(TEMPORAL_FORMAT),
                        start_datetime.format(TEMPORAL_FORMAT)
                    )));
                }
                Ok(Some(Self::Interval {
                    start_datetime,
                    end_datetime,
                }))
            }
            (None, Some(_)) => Err(PublishError::validation(
                "datetime end given without a start",
            )),
        }
    }

    /// Parse `<rfc3339>` or `<rfc3339>,<rfc3339>`; blank input means no extent
    pub fn parse(value: &str) -> PublishResult<Option<Self>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }

        match value.split_once(',') {
            Some((start, end)) => {
                let start = parse_timestamp(start)
                    .map_err(|_| invalid("datetime start", start))?;
                let end = parse_timestamp(end).map_err(|_| invalid("datetime end", end))?;
                Self::from_bounds(Some(start), Some(end))
            }
            None => {
                let at = parse_timestamp(value).map_err(|_| invalid("datetime", value))?;
                Self::from_bounds(Some(at), None)
            }
        }
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim()).map(|t| t.with_timezone(&Utc))
}

fn invalid(what: &str, value: &str) -> PublishError {
    PublishError::validation(format!("invalid {what} value: {}", value.trim()))
}

/// Serde adapter writing [`TEMPORAL_FORMAT`] and reading any RFC 3339 value
mod utc_seconds {
    use super::{parse_timestamp, TEMPORAL_FORMAT};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TEMPORAL_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_timestamp(&text).map_err(serde::de::Error::custom)
    }
}
