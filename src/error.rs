//! Error types for Pulse Rollup

use crate::types::{FieldSelector, SeriesKind};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur while resolving and aggregating metrics
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown window: {0} (expected one of 7d, 30d, 3m, 6m)")]
    UnknownWindow(String),

    #[error("No samples in range for field {field}")]
    EmptyRange { field: FieldSelector },

    #[error("Out of order sample for {series} series at {timestamp}")]
    OutOfOrder {
        series: SeriesKind,
        timestamp: NaiveDateTime,
    },

    #[error("Failed to parse feed: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<toml::de::Error> for MetricsError {
    fn from(e: toml::de::Error) -> Self {
        MetricsError::ConfigError(e.to_string())
    }
}
