//! Intensity classification
//!
//! Maps an active-user count to a load band. Bounds are configuration and are
//! inclusive: a count equal to `low` is still `low`; anything above `high` is
//! `peak`.

use crate::error::MetricsError;
use crate::types::{Bucket, IntensityBand, SeriesPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default inclusive upper bound of the low band
pub const DEFAULT_LOW_BOUND: u64 = 100;
/// Default inclusive upper bound of the normal band
pub const DEFAULT_NORMAL_BOUND: u64 = 200;
/// Default inclusive upper bound of the high band
pub const DEFAULT_HIGH_BOUND: u64 = 300;

/// Upper bounds for the low, normal and high bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub low: u64,
    pub normal: u64,
    pub high: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_BOUND,
            normal: DEFAULT_NORMAL_BOUND,
            high: DEFAULT_HIGH_BOUND,
        }
    }
}

impl Thresholds {
    /// Create validated thresholds
    pub fn new(low: u64, normal: u64, high: u64) -> Result<Self, MetricsError> {
        let thresholds = Self { low, normal, high };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Bounds must be non-decreasing for the classification to stay monotonic
    pub fn validate(&self) -> Result<(), MetricsError> {
        if self.low <= self.normal && self.normal <= self.high {
            Ok(())
        } else {
            Err(MetricsError::InvalidInput(format!(
                "thresholds must satisfy low <= normal <= high, got {}/{}/{}",
                self.low, self.normal, self.high
            )))
        }
    }
}

/// Classifier for active-user counts
pub struct IntensityClassifier;

impl IntensityClassifier {
    /// Classify a signed count; negative counts are invalid input
    pub fn classify(active_users: i64, thresholds: &Thresholds) -> Result<IntensityBand, MetricsError> {
        let count = u64::try_from(active_users).map_err(|_| {
            MetricsError::InvalidInput(format!(
                "active user count must be non-negative, got {active_users}"
            ))
        })?;
        Ok(Self::classify_count(count, thresholds))
    }

    /// Classify a count already known to be non-negative
    pub fn classify_count(active_users: u64, thresholds: &Thresholds) -> IntensityBand {
        if active_users <= thresholds.low {
            IntensityBand::Low
        } else if active_users <= thresholds.normal {
            IntensityBand::Normal
        } else if active_users <= thresholds.high {
            IntensityBand::High
        } else {
            IntensityBand::Peak
        }
    }

    /// Attach a band to every filled bucket; empty buckets stay unclassified
    pub fn classify_buckets(buckets: Vec<Bucket>, thresholds: &Thresholds) -> Vec<SeriesPoint> {
        buckets
            .into_iter()
            .map(|bucket| SeriesPoint {
                band: bucket
                    .sample
                    .as_ref()
                    .map(|sample| Self::classify_count(sample.active_users, thresholds)),
                label: bucket.label,
                sample: bucket.sample,
            })
            .collect()
    }

    /// Count points per band; bands with no points are omitted
    pub fn band_counts(points: &[SeriesPoint]) -> BTreeMap<IntensityBand, usize> {
        let mut counts = BTreeMap::new();
        for band in points.iter().filter_map(|point| point.band) {
            *counts.entry(band).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BucketLabel, Sample};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    #[test]
    fn test_band_boundaries() {
        let t = Thresholds::default();

        assert_eq!(IntensityClassifier::classify(0, &t).unwrap(), IntensityBand::Low);
        assert_eq!(IntensityClassifier::classify(100, &t).unwrap(), IntensityBand::Low);
        assert_eq!(IntensityClassifier::classify(101, &t).unwrap(), IntensityBand::Normal);
        assert_eq!(IntensityClassifier::classify(200, &t).unwrap(), IntensityBand::Normal);
        assert_eq!(IntensityClassifier::classify(300, &t).unwrap(), IntensityBand::High);
        assert_eq!(IntensityClassifier::classify(301, &t).unwrap(), IntensityBand::Peak);
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let result = IntensityClassifier::classify(-1, &Thresholds::default());
        assert!(matches!(result, Err(MetricsError::InvalidInput(_))));
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds::new(10, 20, 30).unwrap();
        assert_eq!(IntensityClassifier::classify(25, &t).unwrap(), IntensityBand::High);
        assert_eq!(IntensityClassifier::classify(31, &t).unwrap(), IntensityBand::Peak);
    }

    #[test]
    fn test_non_monotonic_thresholds_rejected() {
        assert!(Thresholds::new(50, 40, 60).is_err());
        assert!(Thresholds::new(50, 70, 60).is_err());
        assert!(Thresholds::new(50, 50, 50).is_ok());
    }

    #[test]
    fn test_band_counts_skip_empty_buckets() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut buckets: Vec<Bucket> = [50u64, 150, 160, 400]
            .iter()
            .enumerate()
            .map(|(i, users)| {
                let day = date + chrono::Duration::days(i as i64);
                Bucket::filled(
                    BucketLabel::for_day(day),
                    Sample::new(day.and_hms_opt(0, 0, 0).unwrap(), *users),
                )
            })
            .collect();
        buckets.push(Bucket::empty(BucketLabel::for_day(date + chrono::Duration::days(4))));

        let points = IntensityClassifier::classify_buckets(buckets, &Thresholds::default());
        assert_eq!(points.len(), 5);
        assert_eq!(points[4].band, None);
        let counts = IntensityClassifier::band_counts(&points);
        assert_eq!(counts.values().sum::<usize>(), 4);

        assert_eq!(counts.get(&IntensityBand::Low), Some(&1));
        assert_eq!(counts.get(&IntensityBand::Normal), Some(&2));
        assert_eq!(counts.get(&IntensityBand::High), None);
        assert_eq!(counts.get(&IntensityBand::Peak), Some(&1));
    }

    proptest! {
        #[test]
        fn test_classification_is_monotonic(
            a in 0i64..1_000_000,
            b in 0i64..1_000_000,
            low in 0u64..500,
            step_normal in 0u64..500,
            step_high in 0u64..500,
        ) {
            let t = Thresholds::new(low, low + step_normal, low + step_normal + step_high).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let band_lo = IntensityClassifier::classify(lo, &t).unwrap();
            let band_hi = IntensityClassifier::classify(hi, &t).unwrap();
            prop_assert!(band_lo <= band_hi);
        }

        #[test]
        fn test_classification_is_total(count in 0i64..i64::MAX) {
            prop_assert!(IntensityClassifier::classify(count, &Thresholds::default()).is_ok());
        }
    }
}
