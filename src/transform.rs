//! Feature derivation: hourly resampling and calendar/usage columns.
//!
//! Every function takes the frame by reference and returns a new one.

use chrono::{DateTime, Datelike, Duration, DurationRound, Timelike, Utc};

use crate::error::DataError;
use crate::frame::{Column, Frame};

pub const WEEKDAY_COL: &str = "weekday";
pub const HOUR_COL: &str = "hour";
pub const SUM_MINUTES_COL: &str = "sum_minutes";

/// How the cells falling into one hour are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reducer {
    /// Sum of present cells; an empty hour sums to 0
    #[default]
    Sum,
    /// Mean of present cells; an empty hour is missing
    Mean,
}

impl Reducer {
    fn reduce(self, cells: &[Option<f64>]) -> Option<f64> {
        let present: Vec<f64> = cells.iter().flatten().copied().collect();
        match self {
            Reducer::Sum => Some(present.iter().sum()),
            Reducer::Mean if present.is_empty() => None,
            Reducer::Mean => Some(present.iter().sum::<f64>() / present.len() as f64),
        }
    }
}

/// Resample to one row per clock hour, reducing only `columns`.
///
/// Rows span the first to the last occupied hour, so hours without any
/// readings appear too. Columns not listed are dropped.
pub fn aggregate_hourly_usage(
    frame: &Frame,
    columns: &[String],
    reducer: Reducer,
) -> Result<Frame, DataError> {
    let sources = columns
        .iter()
        .map(|name| frame.values(name))
        .collect::<Result<Vec<_>, _>>()?;

    let buckets: Vec<DateTime<Utc>> = frame.times().iter().map(|t| floor_to_hour(*t)).collect();
    let (Some(first), Some(last)) = (buckets.iter().min(), buckets.iter().max()) else {
        let empty = columns.iter().map(|name| Column::new(name.clone(), Vec::new())).collect();
        return Frame::from_parts(frame.time_col(), Vec::new(), empty);
    };

    let hours = ((*last - *first).num_hours() + 1) as usize;
    let times: Vec<DateTime<Utc>> = (0..hours)
        .map(|i| *first + Duration::hours(i as i64))
        .collect();

    // Per hour, the source rows that fall into it
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); hours];
    for (row, bucket) in buckets.iter().enumerate() {
        members[(*bucket - *first).num_hours() as usize].push(row);
    }

    let aggregated = columns
        .iter()
        .zip(sources)
        .map(|(name, values)| {
            let reduced = members
                .iter()
                .map(|rows| {
                    let cells: Vec<Option<f64>> = rows.iter().map(|&row| values[row]).collect();
                    reducer.reduce(&cells)
                })
                .collect();
            Column::new(name.clone(), reduced)
        })
        .collect();

    let hourly = Frame::from_parts(frame.time_col(), times, aggregated)?;
    tracing::info!(
        "Aggregated {} rows into {} hourly rows",
        frame.len(),
        hourly.len()
    );
    Ok(hourly)
}

/// Add `weekday` (Monday=0 .. Sunday=6) from the UTC timestamp.
pub fn add_weekday_feature(frame: &Frame) -> Frame {
    frame.with_time_column(WEEKDAY_COL, |t| t.weekday().num_days_from_monday() as f64)
}

/// Add `hour` (0..23) from the UTC timestamp.
pub fn add_hour_feature(frame: &Frame) -> Frame {
    frame.with_time_column(HOUR_COL, |t| t.hour() as f64)
}

/// Add `sum_minutes`, the row-wise total of the device columns.
pub fn add_sum_minutes_feature(frame: &Frame, device_columns: &[String]) -> Result<Frame, DataError> {
    let devices = device_columns
        .iter()
        .map(|name| frame.values(name))
        .collect::<Result<Vec<_>, _>>()?;

    let totals = (0..frame.len())
        .map(|row| Some(devices.iter().filter_map(|values| values[row]).sum()))
        .collect();
    frame.with_column(SUM_MINUTES_COL, totals)
}

fn floor_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::hours(1)).unwrap_or(t)
}
