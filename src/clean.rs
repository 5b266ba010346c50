//! Missing-value handling and usage data quality checks.

use chrono::{DateTime, Utc};

use crate::error::DataError;
use crate::frame::Frame;

/// Drop every row that has a missing value in any column.
pub fn clean_data(frame: &Frame) -> Frame {
    let cleaned = frame.filter_rows(|row| !frame.row_has_missing(row));

    let dropped = frame.len() - cleaned.len();
    if dropped > 0 {
        tracing::info!(
            "Dropped {} of {} rows with missing values",
            dropped,
            frame.len()
        );
    } else {
        tracing::debug!("No rows with missing values");
    }
    cleaned
}

/// Longest run of consecutive missing values in a column.
pub fn max_na_series(values: &[Option<f64>]) -> usize {
    values
        .iter()
        .fold((0usize, 0usize), |(longest, current), v| match v {
            None => (longest.max(current + 1), current + 1),
            Some(_) => (longest, 0),
        })
        .0
}

/// Longest missing run for every column, in column order.
pub fn missing_value_report(frame: &Frame) -> Vec<(String, usize)> {
    frame
        .columns()
        .iter()
        .map(|c| (c.name.clone(), max_na_series(&c.values)))
        .collect()
}

/// Outcome of `validate_usage`.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub rows: usize,
    /// Earliest and latest timestamp, if any rows
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Device columns with negative minutes, with the number of such cells
    pub negative_values: Vec<(String, usize)>,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        self.negative_values.is_empty()
    }

    pub fn log(&self) {
        match self.date_range {
            Some((first, last)) => tracing::info!(
                "Usage data: {} rows from {} to {}",
                self.rows,
                first.format("%Y-%m-%d %H:%M"),
                last.format("%Y-%m-%d %H:%M")
            ),
            None => tracing::warn!("Usage data has no rows"),
        }
        for (column, count) in &self.negative_values {
            tracing::warn!("Device '{}' has {} negative usage values", column, count);
        }
    }
}

/// Check device usage is non-negative and report the covered date range.
pub fn validate_usage(frame: &Frame, device_columns: &[String]) -> Result<QualityReport, DataError> {
    let mut negative_values = Vec::new();
    for name in device_columns {
        let count = frame.values(name)?.iter().flatten().filter(|v| **v < 0.0).count();
        if count > 0 {
            negative_values.push((name.clone(), count));
        }
    }

    let date_range = frame
        .times()
        .iter()
        .min()
        .zip(frame.times().iter().max())
        .map(|(first, last)| (*first, *last));

    Ok(QualityReport {
        rows: frame.len(),
        date_range,
        negative_values,
    })
}
