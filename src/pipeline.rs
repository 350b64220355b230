//! Dashboard facade
//!
//! This module provides the public API for Pulse. It runs
//! resolve → classify → aggregate for a window and hands back a dataset the
//! presentation layer can render without further computation.

use crate::aggregator::RollupAggregator;
use crate::classifier::IntensityClassifier;
use crate::config::DashboardConfig;
use crate::encoder::DashboardEncoder;
use crate::error::MetricsError;
use crate::resolver::RangeResolver;
use crate::store::ObservationStore;
use crate::types::{DashboardData, HourlyActivity, Window};
use chrono::NaiveDateTime;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Compute one dashboard window from a store snapshot JSON.
///
/// # Arguments
/// * `store_json` - `ObservationStore` snapshot JSON
/// * `window` - Window name (`7d`, `30d`, `3m`, `6m`)
/// * `now` - Reference instant the window is resolved against
///
/// # Example
/// ```ignore
/// let payload = dashboard_json(&store_json, "3m", now)?;
/// ```
pub fn dashboard_json(
    store_json: &str,
    window: &str,
    now: NaiveDateTime,
) -> Result<String, MetricsError> {
    let dashboard = Dashboard::from_json(store_json)?;
    let data = dashboard.get_dashboard_data_named(window, now)?;
    DashboardEncoder::new().encode_window_to_json(data)
}

/// Read-only view over an observation store.
///
/// Each call takes one snapshot of the store at entry, so a store swapped in
/// by `replace_store` mid-call never mixes into a running computation.
pub struct Dashboard {
    store: RwLock<Arc<ObservationStore>>,
    config: DashboardConfig,
}

impl Dashboard {
    /// Create a dashboard with the default configuration
    pub fn new(store: ObservationStore) -> Self {
        Self {
            store: RwLock::new(Arc::new(store)),
            config: DashboardConfig::default(),
        }
    }

    /// Create a dashboard with a validated configuration
    pub fn with_config(store: ObservationStore, config: DashboardConfig) -> Result<Self, MetricsError> {
        config.validate()?;
        Ok(Self {
            store: RwLock::new(Arc::new(store)),
            config,
        })
    }

    /// Create a dashboard from a store snapshot JSON
    pub fn from_json(store_json: &str) -> Result<Self, MetricsError> {
        Ok(Self::new(ObservationStore::from_json(store_json)?))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Current store snapshot
    pub fn snapshot(&self) -> Arc<ObservationStore> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new store, returning the previous snapshot
    pub fn replace_store(&self, store: ObservationStore) -> Arc<ObservationStore> {
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(store))
    }

    /// Dataset and statistics for one window
    pub fn get_dashboard_data(
        &self,
        window: Window,
        now: NaiveDateTime,
    ) -> Result<DashboardData, MetricsError> {
        let store = self.snapshot();

        let buckets = RangeResolver::resolve(window, &store, now)?;
        let series = IntensityClassifier::classify_buckets(buckets, &self.config.thresholds);
        let stats = RollupAggregator::aggregate_fields(
            series.iter().filter_map(|point| point.sample.as_ref()),
            &self.config.stat_fields,
        )?;
        let bands = IntensityClassifier::band_counts(&series);

        debug!(window = window.as_str(), points = series.len(), "computed dashboard data");

        Ok(DashboardData {
            window,
            now,
            series,
            stats,
            bands,
        })
    }

    /// Same as `get_dashboard_data`, with the window given by name
    pub fn get_dashboard_data_named(
        &self,
        window: &str,
        now: NaiveDateTime,
    ) -> Result<DashboardData, MetricsError> {
        self.get_dashboard_data(window.parse()?, now)
    }

    /// Hour-by-hour activity over the configured trailing span
    pub fn get_hourly_activity(&self, now: NaiveDateTime) -> Result<HourlyActivity, MetricsError> {
        let store = self.snapshot();
        let span_hours = self.config.hourly_span_hours;

        let buckets = RangeResolver::resolve_hours(&store, now, span_hours)?;
        let series = IntensityClassifier::classify_buckets(buckets, &self.config.thresholds);
        let stats = RollupAggregator::aggregate_fields(
            series.iter().filter_map(|point| point.sample.as_ref()),
            &self.config.hourly_fields,
        )?;
        let bands = IntensityClassifier::band_counts(&series);

        Ok(HourlyActivity {
            now,
            span_hours,
            series,
            stats,
            bands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Thresholds;
    use crate::seed::{seeded_store, HISTORY};
    use crate::store::Series;
    use crate::types::{FieldSelector, IntensityBand, Sample};
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 12)
            .unwrap()
            .and_hms_opt(9, 45, 0)
            .unwrap()
    }

    fn seeded() -> Dashboard {
        Dashboard::new(seeded_store(now()).unwrap())
    }

    #[test]
    fn test_three_months_over_history() {
        let data = seeded().get_dashboard_data(Window::Months3, now()).unwrap();

        let users: Vec<u64> = data
            .series
            .iter()
            .filter_map(|p| p.sample.as_ref())
            .map(|s| s.active_users)
            .collect();
        assert_eq!(users, vec![245, 280, 320, 298, 334, 356]);

        let cpu = data.stats[&FieldSelector::CpuUsage];
        assert_eq!(cpu.max, 82.0);
        let active = data.stats[&FieldSelector::ActiveUsers];
        assert_eq!(active.average, 306.0);
        assert_eq!(active.samples, 6);
    }

    #[test]
    fn test_seven_days_over_daily() {
        let data = seeded().get_dashboard_data(Window::Days7, now()).unwrap();

        assert_eq!(data.series.len(), 7);
        assert_eq!(data.series.last().unwrap().label.date, "2024-06-12");
        assert_eq!(data.series.first().unwrap().label.date, "2024-06-06");
        // 268, 295 and 287 sit in (200, 300]; the rest are above 300
        assert_eq!(data.bands.get(&IntensityBand::High), Some(&3));
        assert_eq!(data.bands.get(&IntensityBand::Peak), Some(&4));
    }

    #[test]
    fn test_window_sizes() {
        let dashboard = seeded();
        assert_eq!(
            dashboard.get_dashboard_data(Window::Days30, now()).unwrap().series.len(),
            4
        );
        assert_eq!(
            dashboard.get_dashboard_data(Window::Months6, now()).unwrap().series.len(),
            HISTORY.len()
        );
    }

    #[test]
    fn test_unknown_window_propagates() {
        let result = seeded().get_dashboard_data_named("1y", now());
        assert!(matches!(result, Err(MetricsError::UnknownWindow(w)) if w == "1y"));
    }

    #[test]
    fn test_empty_range_propagates() {
        let dashboard = Dashboard::new(ObservationStore::default());
        let result = dashboard.get_dashboard_data(Window::Days30, now());
        assert!(matches!(
            result,
            Err(MetricsError::EmptyRange {
                field: FieldSelector::ActiveUsers
            })
        ));
    }

    #[test]
    fn test_missing_stat_field_is_empty_range() {
        let config = DashboardConfig {
            stat_fields: vec![FieldSelector::ActiveUsers, FieldSelector::Sessions],
            ..DashboardConfig::default()
        };
        // History samples carry no session counts
        let dashboard = Dashboard::with_config(seeded_store(now()).unwrap(), config).unwrap();
        assert!(matches!(
            dashboard.get_dashboard_data(Window::Months3, now()),
            Err(MetricsError::EmptyRange {
                field: FieldSelector::Sessions
            })
        ));
        // Daily samples do
        assert!(dashboard.get_dashboard_data(Window::Days7, now()).is_ok());
    }

    #[test]
    fn test_custom_thresholds() {
        let config = DashboardConfig {
            thresholds: Thresholds::new(250, 300, 340).unwrap(),
            ..DashboardConfig::default()
        };
        let dashboard = Dashboard::with_config(seeded_store(now()).unwrap(), config).unwrap();
        let data = dashboard.get_dashboard_data(Window::Months3, now()).unwrap();

        let bands: Vec<IntensityBand> = data.series.iter().filter_map(|p| p.band).collect();
        assert_eq!(
            bands,
            vec![
                IntensityBand::Low,
                IntensityBand::Normal,
                IntensityBand::High,
                IntensityBand::Normal,
                IntensityBand::High,
                IntensityBand::Peak,
            ]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        for hourly_span_hours in [0, u32::MAX] {
            let config = DashboardConfig {
                hourly_span_hours,
                ..DashboardConfig::default()
            };
            assert!(matches!(
                Dashboard::with_config(ObservationStore::default(), config),
                Err(MetricsError::ConfigError(_))
            ));
        }
    }

    #[test]
    fn test_seven_days_over_stale_feed() {
        // Daily feed ends three days before now; the rest of the store is empty
        let seeded = seeded_store(now() - Duration::days(3)).unwrap();
        let dashboard = Dashboard::new(ObservationStore::new(
            Series::default(),
            seeded.daily.clone(),
            Series::default(),
        ));

        let data = dashboard.get_dashboard_data(Window::Days7, now()).unwrap();
        assert_eq!(data.series.len(), 7);
        assert_eq!(data.series.last().unwrap().label.date, "2024-06-12");
        assert!(data.series[4..].iter().all(|p| p.sample.is_none() && p.band.is_none()));

        // Only the four filled days feed the stats and band counts
        assert_eq!(data.stats[&FieldSelector::ActiveUsers].samples, 4);
        assert_eq!(data.bands.values().sum::<usize>(), 4);
    }

    #[test]
    fn test_hourly_activity() {
        let activity = seeded().get_hourly_activity(now()).unwrap();

        assert_eq!(activity.span_hours, 24);
        assert_eq!(activity.series.len(), 24);
        assert_eq!(activity.series.last().unwrap().label.display, "09:00");
        assert_eq!(activity.series.first().unwrap().label.display, "10:00");
        assert!(activity.stats.contains_key(&FieldSelector::MemoryUsage));
        assert_eq!(activity.bands.values().sum::<usize>(), 24);
    }

    #[test]
    fn test_replace_store_keeps_old_snapshot() {
        let dashboard = seeded();
        let before = dashboard.snapshot();

        let start = now() - Duration::weeks(1);
        let history = Series::from_samples(vec![
            Sample::new(start, 10).with_cpu(40.0),
            Sample::new(now(), 20).with_cpu(60.0),
        ])
        .unwrap();
        let previous = dashboard.replace_store(ObservationStore::new(
            Series::default(),
            Series::default(),
            history,
        ));

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.history.len(), HISTORY.len());

        let data = dashboard.get_dashboard_data(Window::Days30, now()).unwrap();
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.stats[&FieldSelector::ActiveUsers].average, 15.0);
        assert_eq!(data.stats[&FieldSelector::CpuUsage].max, 60.0);

        // The earlier snapshot still resolves against the seeded history
        let old = RangeResolver::resolve(Window::Days30, &before, now()).unwrap();
        assert_eq!(old.len(), 4);
    }

    #[test]
    fn test_dashboard_json() {
        let store_json = seeded_store(now()).unwrap().to_json().unwrap();
        let json = dashboard_json(&store_json, "3m", now()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["view"]["kind"], "window");
        assert_eq!(parsed["view"]["data"]["window"], "3m");
        assert_eq!(parsed["view"]["data"]["stats"]["cpuUsage"]["max"], 82.0);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let dashboard = seeded();
        assert_eq!(
            dashboard.get_dashboard_data(Window::Days7, now()).unwrap(),
            dashboard.get_dashboard_data(Window::Days7, now()).unwrap()
        );
    }
}
