//! Rollup aggregation
//!
//! Computes the average and maximum of one field over a resolved range.

use crate::error::MetricsError;
use crate::types::{FieldSelector, RollupResult, Sample};
use std::collections::BTreeMap;
use tracing::debug;

/// Aggregator for scalar summaries over resolved samples
pub struct RollupAggregator;

impl RollupAggregator {
    /// Summarize `field` across `samples`.
    ///
    /// Samples that do not carry the field are skipped. An empty range is an
    /// error rather than a zero reading.
    pub fn aggregate<'a, I>(samples: I, field: FieldSelector) -> Result<RollupResult, MetricsError>
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max = f64::NEG_INFINITY;

        for value in samples.into_iter().filter_map(|s| field.value(s)) {
            count += 1;
            sum += value;
            max = max.max(value);
        }

        if count == 0 {
            return Err(MetricsError::EmptyRange { field });
        }

        let mean = sum / count as f64;
        debug!(%field, samples = count, mean, max, "aggregated field");

        Ok(RollupResult {
            average: mean.round(),
            max,
            samples: count,
        })
    }

    /// Summarize several fields over the same samples
    pub fn aggregate_fields<'a, I>(
        samples: I,
        fields: &[FieldSelector],
    ) -> Result<BTreeMap<FieldSelector, RollupResult>, MetricsError>
    where
        I: IntoIterator<Item = &'a Sample> + Clone,
    {
        fields
            .iter()
            .map(|&field| Ok((field, Self::aggregate(samples.clone(), field)?)))
            .collect()
    }
}
