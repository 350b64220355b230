//! Pulse - Time-series rollup engine for the admin analytics dashboard
//!
//! Pulse turns hourly, daily and historical usage observations into
//! window-scoped datasets through a deterministic pipeline: range resolution
//! → intensity classification → rollup aggregation → payload encoding.
//!
//! ## Modules
//!
//! - **Dashboard Facade**: `Dashboard::get_dashboard_data` for the 7d, 30d,
//!   3m and 6m windows, plus the hourly activity view
//! - **Feed Schema**: Load `pulse.feed_record.v1` records into a store

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod schema;
pub mod seed;
pub mod store;
pub mod types;

pub use aggregator::RollupAggregator;
pub use classifier::{IntensityClassifier, Thresholds};
pub use config::DashboardConfig;
pub use encoder::{DashboardEncoder, DashboardPayload};
pub use error::MetricsError;
pub use pipeline::{dashboard_json, Dashboard};
pub use resolver::RangeResolver;
pub use store::{ObservationStore, Series};
pub use types::{DashboardData, FieldSelector, HourlyActivity, IntensityBand, Sample, Window};

// Schema exports
pub use schema::{FeedAdapter, FeedRecord, FEED_SCHEMA_VERSION};

/// Pulse version embedded in all payloads
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for payloads
pub const PRODUCER_NAME: &str = "pulse-rollup";
