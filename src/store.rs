//! Observation store
//!
//! This module owns the raw samples the engine reads from: an hourly series, a
//! daily series and a coarse history series of weekly snapshots. Every series
//! keeps its samples unique by timestamp and in ascending order.

use crate::error::MetricsError;
use crate::types::{Sample, SeriesKind};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Ordered sequence of samples at one granularity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Sample>", into = "Vec<Sample>")]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    /// Build a series from unordered samples.
    ///
    /// Samples are sorted by timestamp; duplicate timestamps and invalid
    /// percentages are rejected.
    pub fn from_samples(mut samples: Vec<Sample>) -> Result<Self, MetricsError> {
        samples.sort_by_key(|s| s.timestamp);

        for sample in &samples {
            sample.validate()?;
        }

        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[0].timestamp == pair[1].timestamp)
        {
            return Err(MetricsError::InvalidInput(format!(
                "duplicate sample timestamp {}",
                pair[1].timestamp
            )));
        }

        Ok(Self { samples })
    }

    /// Append a sample that is strictly newer than every stored sample
    pub fn append(&mut self, kind: SeriesKind, sample: Sample) -> Result<(), MetricsError> {
        sample.validate()?;

        if let Some(last) = self.samples.last() {
            if sample.timestamp <= last.timestamp {
                return Err(MetricsError::OutOfOrder {
                    series: kind,
                    timestamp: sample.timestamp,
                });
            }
        }

        self.samples.push(sample);
        Ok(())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Samples with `timestamp <= until`
    pub fn until(&self, until: NaiveDateTime) -> &[Sample] {
        let end = self.samples.partition_point(|s| s.timestamp <= until);
        &self.samples[..end]
    }

    /// Samples with `after < timestamp <= until`
    pub fn between(&self, after: NaiveDateTime, until: NaiveDateTime) -> &[Sample] {
        let start = self.samples.partition_point(|s| s.timestamp <= after);
        let end = self.samples.partition_point(|s| s.timestamp <= until);
        if start >= end {
            return &[];
        }
        &self.samples[start..end]
    }

    /// The first sample whose timestamp falls on `date`
    pub fn on_date(&self, date: NaiveDate) -> Option<&Sample> {
        let idx = self.samples.partition_point(|s| s.timestamp.date() < date);
        self.samples
            .get(idx)
            .filter(|sample| sample.timestamp.date() == date)
    }
}

impl TryFrom<Vec<Sample>> for Series {
    type Error = MetricsError;

    fn try_from(samples: Vec<Sample>) -> Result<Self, Self::Error> {
        Series::from_samples(samples)
    }
}

impl From<Series> for Vec<Sample> {
    fn from(series: Series) -> Self {
        series.samples
    }
}

/// Owner of all raw sample data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationStore {
    /// Hour-by-hour samples (activeUsers, cpuUsage, memoryUsage)
    #[serde(default)]
    pub hourly: Series,
    /// Day-by-day samples (activeUsers, sessions, requests)
    #[serde(default)]
    pub daily: Series,
    /// Coarse weekly snapshots (activeUsers, cpuUsage peak)
    #[serde(default)]
    pub history: Series,
}

impl ObservationStore {
    /// Create a store from the three series
    pub fn new(hourly: Series, daily: Series, history: Series) -> Self {
        Self {
            hourly,
            daily,
            history,
        }
    }

    pub fn series(&self, kind: SeriesKind) -> &Series {
        match kind {
            SeriesKind::Hourly => &self.hourly,
            SeriesKind::Daily => &self.daily,
            SeriesKind::History => &self.history,
        }
    }

    /// Ordered insert into one series
    pub fn append(&mut self, kind: SeriesKind, sample: Sample) -> Result<(), MetricsError> {
        let series = match kind {
            SeriesKind::Hourly => &mut self.hourly,
            SeriesKind::Daily => &mut self.daily,
            SeriesKind::History => &mut self.history,
        };
        series.append(kind, sample)
    }

    /// Total number of samples across all series
    pub fn total_samples(&self) -> usize {
        self.hourly.len() + self.daily.len() + self.history.len()
    }

    /// Load an observation store from JSON
    pub fn from_json(json: &str) -> Result<Self, MetricsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the observation store to JSON
    pub fn to_json(&self) -> Result<String, MetricsError> {
        Ok(serde_json::to_string(self)?)
    }
}
