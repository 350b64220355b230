//! Range resolution
//!
//! This module maps a named window onto an ordered subset of the observation
//! store:
//! - `7d` walks the seven calendar days ending at `now` and fills each from the
//!   daily series
//! - `30d`, `3m` and `6m` take a suffix of the coarse history series
//! - hourly views take the samples inside a trailing span of hours
//!
//! `now` is always passed in, never read from the clock.

use crate::error::MetricsError;
use crate::store::ObservationStore;
use crate::types::{Bucket, BucketLabel, Window};
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

/// Resolver for window-scoped datasets
pub struct RangeResolver;

impl RangeResolver {
    /// Resolve a window against the store, oldest bucket first
    pub fn resolve(
        window: Window,
        store: &ObservationStore,
        now: NaiveDateTime,
    ) -> Result<Vec<Bucket>, MetricsError> {
        let buckets = if window.uses_history() {
            resolve_history_suffix(store, now, window.bucket_count())
        } else {
            resolve_calendar_days(store, now, window.bucket_count())
        };

        let filled = buckets.iter().filter(|b| b.sample.is_some()).count();
        if filled < window.bucket_count() {
            warn!(
                window = window.as_str(),
                filled,
                expected = window.bucket_count(),
                "window has fewer samples than buckets"
            );
        }
        debug!(window = window.as_str(), %now, buckets = buckets.len(), filled, "resolved window");

        Ok(buckets)
    }

    /// Resolve a window given by name (`7d`, `30d`, `3m`, `6m`)
    pub fn resolve_named(
        window: &str,
        store: &ObservationStore,
        now: NaiveDateTime,
    ) -> Result<Vec<Bucket>, MetricsError> {
        let window: Window = window.parse()?;
        Self::resolve(window, store, now)
    }

    /// Hourly samples in `(now - span_hours, now]`, oldest first.
    ///
    /// Fails with `InvalidInput` when the span reaches past the representable
    /// date range.
    pub fn resolve_hours(
        store: &ObservationStore,
        now: NaiveDateTime,
        span_hours: u32,
    ) -> Result<Vec<Bucket>, MetricsError> {
        let after = now
            .checked_sub_signed(Duration::hours(i64::from(span_hours)))
            .ok_or_else(|| {
                MetricsError::InvalidInput(format!(
                    "hourly span of {span_hours} hours before {now} is out of range"
                ))
            })?;

        let buckets: Vec<Bucket> = store
            .hourly
            .between(after, now)
            .iter()
            .map(|sample| Bucket::filled(BucketLabel::for_hour(sample.timestamp), sample.clone()))
            .collect();

        debug!(%now, span_hours, buckets = buckets.len(), "resolved hourly span");
        Ok(buckets)
    }
}

/// One bucket per calendar day ending at `now`'s date. Days without an
/// upstream daily sample keep their label and carry no sample.
fn resolve_calendar_days(store: &ObservationStore, now: NaiveDateTime, days: usize) -> Vec<Bucket> {
    let today = now.date();

    (0..days as i64)
        .rev()
        .filter_map(|offset| today.checked_sub_signed(Duration::days(offset)))
        .map(|date| {
            let label = BucketLabel::for_day(date);
            match store.daily.on_date(date) {
                Some(sample) => Bucket::filled(label, sample.clone()),
                None => Bucket::empty(label),
            }
        })
        .collect()
}

/// The most recent `count` history entries at or before `now`
fn resolve_history_suffix(store: &ObservationStore, now: NaiveDateTime, count: usize) -> Vec<Bucket> {
    let available = store.history.until(now);
    let start = available.len().saturating_sub(count);

    available[start..]
        .iter()
        .map(|sample| Bucket::filled(BucketLabel::for_day(sample.timestamp.date()), sample.clone()))
        .collect()
}
