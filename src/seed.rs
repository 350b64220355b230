//! Showcase seed data
//!
//! Builds the demonstration data set the analytics view ships with, anchored
//! at a caller-supplied `now` so the same call always yields the same store.

use crate::error::MetricsError;
use crate::store::{ObservationStore, Series};
use crate::types::Sample;
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Active users by hour of day (00:00 - 23:00)
const HOURLY_ACTIVE_USERS: [u64; 24] = [
    45, 32, 28, 24, 22, 30, 58, 110, 185, 240, 275, 290, 310, 298, 285, 270, 262, 248, 225, 190,
    150, 120, 88, 62,
];

/// CPU usage by hour of day
const HOURLY_CPU: [f64; 24] = [
    22.0, 18.0, 16.0, 15.0, 14.0, 17.0, 25.0, 38.0, 52.0, 61.0, 67.0, 70.0, 74.0, 72.0, 69.0, 66.0,
    64.0, 60.0, 55.0, 48.0, 40.0, 34.0, 28.0, 24.0,
];

/// Memory usage by hour of day
const HOURLY_MEMORY: [f64; 24] = [
    41.0, 40.0, 39.0, 39.0, 38.0, 39.0, 42.0, 48.0, 55.0, 60.0, 63.0, 65.0, 68.0, 67.0, 65.0, 63.0,
    62.0, 60.0, 57.0, 53.0, 49.0, 46.0, 44.0, 42.0,
];

/// Last seven days, oldest first: (active users, cpu, memory, sessions, requests)
const DAILY: [(u64, f64, f64, u64, u64); 7] = [
    (268, 64.0, 55.0, 1820, 48_200),
    (295, 68.0, 58.0, 1975, 51_900),
    (312, 71.0, 60.0, 2104, 55_300),
    (287, 66.0, 57.0, 1890, 49_800),
    (334, 79.0, 66.0, 2260, 60_100),
    (301, 70.0, 61.0, 2031, 53_700),
    (322, 73.0, 63.0, 2150, 57_200),
];

/// Weekly snapshots, oldest first: (active users, cpu peak)
pub const HISTORY: [(u64, f64); 8] = [
    (180, 55.0),
    (210, 62.0),
    (245, 68.0),
    (280, 74.0),
    (320, 78.0),
    (298, 73.0),
    (334, 79.0),
    (356, 82.0),
];

/// Build the showcase store ending at `now`:
/// - 24 hourly samples ending at the top of `now`'s hour
/// - 7 daily samples ending at `now`'s date
/// - 8 weekly history snapshots, the newest on `now`'s date
pub fn seeded_store(now: NaiveDateTime) -> Result<ObservationStore, MetricsError> {
    let midnight = now.date().and_time(NaiveTime::default());
    let top_of_hour = midnight + Duration::hours(i64::from(now.hour()));

    let hourly = (0..24i64)
        .rev()
        .map(|back| {
            let timestamp = top_of_hour - Duration::hours(back);
            let hour = timestamp.hour() as usize;
            Sample::new(timestamp, HOURLY_ACTIVE_USERS[hour])
                .with_cpu(HOURLY_CPU[hour])
                .with_memory(HOURLY_MEMORY[hour])
        })
        .collect();

    let daily = DAILY
        .iter()
        .enumerate()
        .map(|(i, &(users, cpu, memory, sessions, requests))| {
            let back = (DAILY.len() - 1 - i) as i64;
            Sample::new(midnight - Duration::days(back), users)
                .with_cpu(cpu)
                .with_memory(memory)
                .with_traffic(sessions, requests)
        })
        .collect();

    let history = HISTORY
        .iter()
        .enumerate()
        .map(|(i, &(users, cpu_peak))| {
            let back = (HISTORY.len() - 1 - i) as i64;
            Sample::new(midnight - Duration::weeks(back), users).with_cpu(cpu_peak)
        })
        .collect();

    Ok(ObservationStore::new(
        Series::from_samples(hourly)?,
        Series::from_samples(daily)?,
        Series::from_samples(history)?,
    ))
}
