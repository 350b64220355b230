//! pulse.feed_record.v1 schema definition
//!
//! One record per observation, as delivered by the external metrics feed.
//! Counts arrive signed so negative values can be reported as invalid input
//! instead of failing deserialization.

use crate::error::MetricsError;
use crate::types::{Sample, SeriesKind};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Current feed schema version
pub const FEED_SCHEMA_VERSION: &str = "pulse.feed_record.v1";

/// Accepted date-time layouts, tried in order before the date-only layout
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// A single feed record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    /// Optional producer-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Target series
    pub series: SeriesKind,
    /// `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub active_users: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<i64>,
}

impl FeedRecord {
    /// Create a record carrying only an active-user count
    pub fn new(series: SeriesKind, timestamp: impl Into<String>, active_users: i64) -> Self {
        Self {
            record_id: None,
            series,
            timestamp: timestamp.into(),
            active_users,
            cpu_usage: None,
            memory_usage: None,
            sessions: None,
            requests: None,
        }
    }

    /// Identifier used in error messages: the record id, else its timestamp
    pub fn label(&self) -> &str {
        self.record_id.as_deref().unwrap_or(&self.timestamp)
    }

    /// Validate the record without converting it
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.to_sample().map(|_| ())
    }

    /// Convert to a store sample.
    ///
    /// Daily and history records are pinned to midnight of their date.
    pub fn to_sample(&self) -> Result<Sample, ValidationError> {
        let mut timestamp = parse_timestamp(&self.timestamp)?;
        if self.series != SeriesKind::Hourly {
            timestamp = timestamp.date().and_time(NaiveTime::default());
        }

        Ok(Sample {
            timestamp,
            active_users: non_negative("activeUsers", self.active_users)?,
            cpu_usage: percentage("cpuUsage", self.cpu_usage)?,
            memory_usage: percentage("memoryUsage", self.memory_usage)?,
            sessions: self
                .sessions
                .map(|v| non_negative("sessions", v))
                .transpose()?,
            requests: self
                .requests
                .map(|v| non_negative("requests", v))
                .transpose()?,
        })
    }
}

/// Parse a feed or command-line timestamp. A bare date means midnight.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = value.trim();

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::default()))
        .map_err(|_| ValidationError::InvalidTimestamp(value.to_string()))
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, ValidationError> {
    u64::try_from(value).map_err(|_| ValidationError::NegativeCount { field, value })
}

fn percentage(field: &'static str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() || !(0.0..=100.0).contains(&v) => {
            Err(ValidationError::PercentageOutOfRange { field, value: v })
        }
        other => Ok(other),
    }
}

/// Validation errors for feed records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("{field} must be within 0-100, got {value}")]
    PercentageOutOfRange { field: &'static str, value: f64 },

    #[error("Unrecognized timestamp: {0}")]
    InvalidTimestamp(String),
}

impl ValidationError {
    /// Convert into a `MetricsError` that names the offending record
    pub fn for_record(self, record: &str) -> MetricsError {
        into_metrics_error(self, Some(record))
    }
}

impl From<ValidationError> for MetricsError {
    fn from(e: ValidationError) -> Self {
        into_metrics_error(e, None)
    }
}

fn into_metrics_error(e: ValidationError, record: Option<&str>) -> MetricsError {
    let message = match record {
        Some(record) => format!("record {record}: {e}"),
        None => e.to_string(),
    };
    match e {
        ValidationError::InvalidTimestamp(_) => MetricsError::DateParseError(message),
        _ => MetricsError::InvalidInput(message),
    }
}
