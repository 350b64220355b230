//! Dashboard configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! stat_fields = ["activeUsers", "cpuUsage"]
//! hourly_span_hours = 24
//!
//! [thresholds]
//! low = 100
//! normal = 200
//! high = 300
//! ```

use crate::classifier::Thresholds;
use crate::error::MetricsError;
use crate::types::FieldSelector;
use serde::{Deserialize, Serialize};

/// Default span of the hourly activity view
pub const DEFAULT_HOURLY_SPAN_HOURS: u32 = 24;
/// Longest accepted hourly span (one leap year)
pub const MAX_HOURLY_SPAN_HOURS: u32 = 24 * 366;

/// Settings shared by every dashboard view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Fields summarized for window views
    pub stat_fields: Vec<FieldSelector>,
    /// Fields summarized for the hourly view
    pub hourly_fields: Vec<FieldSelector>,
    /// Trailing hours covered by the hourly view
    pub hourly_span_hours: u32,
    /// Intensity band bounds
    pub thresholds: Thresholds,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            stat_fields: vec![FieldSelector::ActiveUsers, FieldSelector::CpuUsage],
            hourly_fields: vec![
                FieldSelector::ActiveUsers,
                FieldSelector::CpuUsage,
                FieldSelector::MemoryUsage,
            ],
            hourly_span_hours: DEFAULT_HOURLY_SPAN_HOURS,
            thresholds: Thresholds::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml(toml_str: &str) -> Result<Self, MetricsError> {
        let config: DashboardConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, MetricsError> {
        toml::to_string_pretty(self).map_err(|e| MetricsError::ConfigError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), MetricsError> {
        self.thresholds
            .validate()
            .map_err(|e| MetricsError::ConfigError(e.to_string()))?;

        if self.stat_fields.is_empty() {
            return Err(MetricsError::ConfigError(
                "stat_fields must name at least one field".to_string(),
            ));
        }

        if self.hourly_span_hours == 0 || self.hourly_span_hours > MAX_HOURLY_SPAN_HOURS {
            return Err(MetricsError::ConfigError(format!(
                "hourly_span_hours must be within 1-{MAX_HOURLY_SPAN_HOURS}, got {}",
                self.hourly_span_hours
            )));
        }

        Ok(())
    }
}
