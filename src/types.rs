//! Core types for the Pulse rollup engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: raw samples, resolved buckets, classified points and rollups.

use crate::error::MetricsError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One observation of platform activity at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Observation instant (midnight of the date for daily and history samples)
    pub timestamp: NaiveDateTime,
    /// Concurrent/active users
    pub active_users: u64,
    /// CPU usage percentage (0-100); the period peak on history samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    /// Memory usage percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
    /// Sessions opened during the period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<u64>,
    /// Requests served during the period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<u64>,
}

impl Sample {
    /// Create a sample carrying only an active-user count
    pub fn new(timestamp: NaiveDateTime, active_users: u64) -> Self {
        Self {
            timestamp,
            active_users,
            cpu_usage: None,
            memory_usage: None,
            sessions: None,
            requests: None,
        }
    }

    pub fn with_cpu(mut self, cpu_usage: f64) -> Self {
        self.cpu_usage = Some(cpu_usage);
        self
    }

    pub fn with_memory(mut self, memory_usage: f64) -> Self {
        self.memory_usage = Some(memory_usage);
        self
    }

    pub fn with_traffic(mut self, sessions: u64, requests: u64) -> Self {
        self.sessions = Some(sessions);
        self.requests = Some(requests);
        self
    }

    /// Check that percentage fields are finite and within 0-100
    pub fn validate(&self) -> Result<(), MetricsError> {
        for (name, value) in [("cpuUsage", self.cpu_usage), ("memoryUsage", self.memory_usage)] {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                    return Err(MetricsError::InvalidInput(format!(
                        "{name} must be within 0-100, got {v} at {}",
                        self.timestamp
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Granularity of a series in the observation store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Hourly,
    Daily,
    /// Coarse pre-aggregated snapshots (one per week)
    History,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Hourly => "hourly",
            SeriesKind::Daily => "daily",
            SeriesKind::History => "history",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete load classification, ordered `low < normal < high < peak`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityBand {
    Low,
    Normal,
    High,
    Peak,
}

impl IntensityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityBand::Low => "low",
            IntensityBand::Normal => "normal",
            IntensityBand::High => "high",
            IntensityBand::Peak => "peak",
        }
    }
}

impl fmt::Display for IntensityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named date range used to scope a dashboard view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "3m")]
    Months3,
    #[serde(rename = "6m")]
    Months6,
}

impl Window {
    /// Every recognized window, shortest first
    pub const ALL: [Window; 4] = [Window::Days7, Window::Days30, Window::Months3, Window::Months6];

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Days7 => "7d",
            Window::Days30 => "30d",
            Window::Months3 => "3m",
            Window::Months6 => "6m",
        }
    }

    /// Maximum number of buckets the window resolves to
    pub fn bucket_count(&self) -> usize {
        match self {
            Window::Days7 => 7,
            Window::Days30 => 4,
            Window::Months3 => 6,
            Window::Months6 => 8,
        }
    }

    /// Whether the window is served from the coarse history series
    pub fn uses_history(&self) -> bool {
        !matches!(self, Window::Days7)
    }
}

impl FromStr for Window {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Window::ALL
            .into_iter()
            .find(|w| w.as_str() == s.trim())
            .ok_or_else(|| MetricsError::UnknownWindow(s.to_string()))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured field of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldSelector {
    ActiveUsers,
    CpuUsage,
    MemoryUsage,
    Sessions,
    Requests,
}

impl FieldSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSelector::ActiveUsers => "activeUsers",
            FieldSelector::CpuUsage => "cpuUsage",
            FieldSelector::MemoryUsage => "memoryUsage",
            FieldSelector::Sessions => "sessions",
            FieldSelector::Requests => "requests",
        }
    }

    /// Extract this field's value from a sample, if the sample carries it
    pub fn value(&self, sample: &Sample) -> Option<f64> {
        match self {
            FieldSelector::ActiveUsers => Some(sample.active_users as f64),
            FieldSelector::CpuUsage => sample.cpu_usage,
            FieldSelector::MemoryUsage => sample.memory_usage,
            FieldSelector::Sessions => sample.sessions.map(|v| v as f64),
            FieldSelector::Requests => sample.requests.map(|v| v as f64),
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display and grouping label of one resolved time slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketLabel {
    /// Full date (YYYY-MM-DD) for grouping and tooltips
    pub date: String,
    pub month: u32,
    pub day: u32,
    /// Short weekday name (Mon, Tue, ...)
    pub weekday: String,
    /// Hour of day, set on hourly buckets only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    /// Axis label: "Oct 14" for day buckets, "14:00" for hourly buckets
    pub display: String,
}

impl BucketLabel {
    /// Label for a calendar-day bucket
    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            month: date.month(),
            day: date.day(),
            weekday: date.format("%a").to_string(),
            hour: None,
            display: date.format("%b %-d").to_string(),
        }
    }

    /// Label for an hourly bucket
    pub fn for_hour(timestamp: NaiveDateTime) -> Self {
        let hour = timestamp.hour();
        Self {
            hour: Some(hour),
            display: format!("{hour:02}:00"),
            ..Self::for_day(timestamp.date())
        }
    }
}

/// One resolved time slot and the sample that fills it.
///
/// A calendar slot with no upstream sample keeps its label and carries no
/// sample; it is never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: BucketLabel,
    #[serde(default)]
    pub sample: Option<Sample>,
}

impl Bucket {
    pub fn filled(label: BucketLabel, sample: Sample) -> Self {
        Self {
            label,
            sample: Some(sample),
        }
    }

    pub fn empty(label: BucketLabel) -> Self {
        Self {
            label,
            sample: None,
        }
    }
}

/// A resolved bucket with its intensity classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: BucketLabel,
    #[serde(default)]
    pub sample: Option<Sample>,
    /// Unset when the slot has no sample
    #[serde(default)]
    pub band: Option<IntensityBand>,
}

/// Scalar summary of one field over a resolved range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollupResult {
    /// Arithmetic mean rounded to the nearest integer
    pub average: f64,
    /// Maximum value
    pub max: f64,
    /// Number of samples that carried the field
    pub samples: usize,
}

/// Dataset and statistics for one dashboard window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub window: Window,
    /// Reference instant the window was resolved against
    pub now: NaiveDateTime,
    pub series: Vec<SeriesPoint>,
    pub stats: BTreeMap<FieldSelector, RollupResult>,
    /// Number of points in each intensity band
    pub bands: BTreeMap<IntensityBand, usize>,
}

/// Hour-by-hour activity ending at a reference instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyActivity {
    pub now: NaiveDateTime,
    pub span_hours: u32,
    pub series: Vec<SeriesPoint>,
    pub stats: BTreeMap<FieldSelector, RollupResult>,
    pub bands: BTreeMap<IntensityBand, usize>,
}
