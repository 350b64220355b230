//! Dashboard payload encoding
//!
//! This module wraps facade output in a versioned JSON envelope for the
//! presentation layer.

use crate::error::MetricsError;
use crate::types::{DashboardData, HourlyActivity};
use crate::{PRODUCER_NAME, PULSE_VERSION};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current payload schema version
pub const PAYLOAD_VERSION: &str = "1.0.0";

/// Producer metadata stamped on every payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// The view a payload carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum DashboardView {
    Window(DashboardData),
    Hourly(HourlyActivity),
}

/// Versioned envelope handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub payload_version: String,
    pub producer: PayloadProducer,
    pub view: DashboardView,
}

/// Encoder for dashboard payloads
pub struct DashboardEncoder {
    instance_id: String,
}

impl Default for DashboardEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a view in a payload
    pub fn encode(&self, view: DashboardView) -> DashboardPayload {
        DashboardPayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer: PayloadProducer {
                name: PRODUCER_NAME.to_string(),
                version: PULSE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            view,
        }
    }

    /// Encode a window dataset to a JSON string
    pub fn encode_window_to_json(&self, data: DashboardData) -> Result<String, MetricsError> {
        self.encode_to_json(DashboardView::Window(data))
    }

    /// Encode an hourly activity view to a JSON string
    pub fn encode_hourly_to_json(&self, activity: HourlyActivity) -> Result<String, MetricsError> {
        self.encode_to_json(DashboardView::Hourly(activity))
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, view: DashboardView) -> Result<String, MetricsError> {
        let payload = self.encode(view);
        serde_json::to_string_pretty(&payload).map_err(MetricsError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Dashboard;
    use crate::seed::seeded_store;
    use crate::types::Window;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn make_dashboard() -> Dashboard {
        Dashboard::new(seeded_store(now()).unwrap())
    }

    #[test]
    fn test_encode_payload() {
        let data = make_dashboard().get_dashboard_data(Window::Days30, now()).unwrap();
        let encoder = DashboardEncoder::with_instance_id("test-instance".to_string());
        let payload = encoder.encode(DashboardView::Window(data.clone()));

        assert_eq!(payload.payload_version, PAYLOAD_VERSION);
        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.version, PULSE_VERSION);
        assert_eq!(payload.producer.instance_id, "test-instance");
        assert_eq!(payload.view, DashboardView::Window(data));
    }

    #[test]
    fn test_encode_window_to_json() {
        let data = make_dashboard().get_dashboard_data(Window::Days7, now()).unwrap();
        let json = DashboardEncoder::new().encode_window_to_json(data).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("payload_version").is_some());
        assert!(parsed.get("producer").is_some());
        assert_eq!(parsed["view"]["kind"], "window");
        assert_eq!(parsed["view"]["data"]["window"], "7d");
        assert_eq!(parsed["view"]["data"]["series"][6]["label"]["display"], "Jan 15");
        assert!(parsed["view"]["data"]["series"][0]["label"].get("hour").is_none());
    }

    #[test]
    fn test_encode_hourly_to_json() {
        let activity = make_dashboard().get_hourly_activity(now()).unwrap();
        let json = DashboardEncoder::new().encode_hourly_to_json(activity).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["view"]["kind"], "hourly");
        assert_eq!(parsed["view"]["data"]["span_hours"], 24);
        assert_eq!(parsed["view"]["data"]["series"][23]["label"]["hour"], 12);
    }

    #[test]
    fn test_payload_round_trip() {
        let data = make_dashboard().get_dashboard_data(Window::Months6, now()).unwrap();
        let encoder = DashboardEncoder::new();
        let json = encoder.encode_window_to_json(data).unwrap();
        let payload: DashboardPayload = serde_json::from_str(&json).unwrap();

        assert_eq!(payload.producer.instance_id, encoder.instance_id());
    }
}
