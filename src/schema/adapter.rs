//! Adapter for loading pulse.feed_record.v1 records into an observation store
//!
//! Two ways in: `build_store` takes an unordered batch and sorts each series;
//! `apply` appends records in arrival order and rejects anything older than
//! what a series already holds.

use crate::error::MetricsError;
use crate::schema::feed_record::{FeedRecord, ValidationError};
use crate::store::{ObservationStore, Series};
use crate::types::{Sample, SeriesKind};
use tracing::debug;

/// Adapter for converting feed records to store samples
pub struct FeedAdapter;

impl FeedAdapter {
    /// Parse a JSON string containing an array of FeedRecords
    pub fn parse_array(json: &str) -> Result<Vec<FeedRecord>, MetricsError> {
        let records: Vec<FeedRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing FeedRecords
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<FeedRecord>, MetricsError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<FeedRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(MetricsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Build a fresh store from a batch of records in any order
    pub fn build_store(records: &[FeedRecord]) -> Result<ObservationStore, MetricsError> {
        let mut hourly = Vec::new();
        let mut daily = Vec::new();
        let mut history = Vec::new();

        for record in records {
            let sample = Self::convert(record)?;
            match record.series {
                SeriesKind::Hourly => hourly.push(sample),
                SeriesKind::Daily => daily.push(sample),
                SeriesKind::History => history.push(sample),
            }
        }

        debug!(
            hourly = hourly.len(),
            daily = daily.len(),
            history = history.len(),
            "built store from feed batch"
        );

        Ok(ObservationStore::new(
            Series::from_samples(hourly)?,
            Series::from_samples(daily)?,
            Series::from_samples(history)?,
        ))
    }

    /// Append records to an existing store in arrival order.
    ///
    /// Stops at the first invalid or out-of-order record; records before it
    /// stay applied.
    pub fn apply(store: &mut ObservationStore, records: &[FeedRecord]) -> Result<usize, MetricsError> {
        for record in records {
            let sample = Self::convert(record)?;
            store.append(record.series, sample)?;
        }
        Ok(records.len())
    }

    /// Validate a batch of records
    pub fn validate_records(records: &[FeedRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index: idx,
                    record_id: record.record_id.clone(),
                    error,
                })
            })
            .collect()
    }

    fn convert(record: &FeedRecord) -> Result<Sample, MetricsError> {
        record.to_sample().map_err(|e| e.for_record(record.label()))
    }
}

/// Failed validation of one record
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub record_id: Option<String>,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ndjson() -> &'static str {
        r#"{"series":"history","timestamp":"2024-01-13","activeUsers":210,"cpuUsage":62.0}
{"series":"history","timestamp":"2024-01-06","activeUsers":180,"cpuUsage":55.0}

{"series":"daily","timestamp":"2024-01-13","activeUsers":300,"sessions":1900,"requests":51000}
{"series":"hourly","timestamp":"2024-01-13T09:00:00","activeUsers":240,"cpuUsage":61.0,"memoryUsage":60.0}"#
    }

    #[test]
    fn test_parse_ndjson() {
        let records = FeedAdapter::parse_ndjson(ndjson()).unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let result = FeedAdapter::parse_ndjson("{\"series\":\"daily\"}\nnot json");
        match result {
            Err(MetricsError::ParseError(msg)) => assert!(msg.contains("line 1")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_array() {
        let records = FeedAdapter::parse_array(
            r#"[{"series":"daily","timestamp":"2024-01-13","activeUsers":300}]"#,
        )
        .unwrap();
        assert_eq!(records[0].series, SeriesKind::Daily);
    }

    #[test]
    fn test_build_store_sorts_each_series() {
        let records = FeedAdapter::parse_ndjson(ndjson()).unwrap();
        let store = FeedAdapter::build_store(&records).unwrap();

        assert_eq!(store.hourly.len(), 1);
        assert_eq!(store.daily.len(), 1);
        let history: Vec<u64> = store.history.samples().iter().map(|s| s.active_users).collect();
        assert_eq!(history, vec![180, 210]);
    }

    #[test]
    fn test_apply_rejects_out_of_order() {
        let records = FeedAdapter::parse_ndjson(ndjson()).unwrap();
        let mut store = ObservationStore::default();

        let result = FeedAdapter::apply(&mut store, &records);
        assert!(matches!(
            result,
            Err(MetricsError::OutOfOrder {
                series: SeriesKind::History,
                ..
            })
        ));
        // The first record was applied before the failure
        assert_eq!(store.history.len(), 1);
    }

    #[test]
    fn test_apply_in_order() {
        let mut store = ObservationStore::default();
        let records = vec![
            FeedRecord::new(SeriesKind::Daily, "2024-01-12", 280),
            FeedRecord::new(SeriesKind::Daily, "2024-01-13", 300),
        ];

        assert_eq!(FeedAdapter::apply(&mut store, &records).unwrap(), 2);
        assert_eq!(store.daily.len(), 2);
    }

    #[test]
    fn test_validate_records() {
        let mut bad = FeedRecord::new(SeriesKind::Daily, "2024-01-13", -5);
        bad.record_id = Some("r-2".to_string());
        let records = vec![
            FeedRecord::new(SeriesKind::Daily, "2024-01-12", 280),
            bad,
            FeedRecord::new(SeriesKind::Daily, "yesterday", 1),
        ];

        let results = FeedAdapter::validate_records(&records);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 1);
        assert_eq!(results[0].record_id.as_deref(), Some("r-2"));
        assert!(matches!(results[1].error, ValidationError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_build_store_rejects_invalid_record() {
        let records = vec![FeedRecord::new(SeriesKind::Hourly, "2024-01-13T01:00:00", -1)];
        assert!(matches!(
            FeedAdapter::build_store(&records),
            Err(MetricsError::InvalidInput(msg)) if msg.starts_with("record 2024-01-13T01:00:00:")
        ));

        let records = vec![FeedRecord::new(SeriesKind::Daily, "next week", 1)];
        assert!(matches!(
            FeedAdapter::build_store(&records),
            Err(MetricsError::DateParseError(msg)) if msg.contains("next week")
        ));
    }
}
