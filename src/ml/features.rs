//! Model input extraction from the merged hourly table.

use crate::config::ColumnsConfig;
use crate::error::FeatureError;
use crate::frame::Frame;
use crate::transform::{HOUR_COL, WEEKDAY_COL};

/// Number of features in a model input row.
pub const NUM_FEATURES: usize = 5;

/// Feature names in model input order, as stored in model artifacts.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] =
    ["weekday", "hour", "precipitation", "snow_depth", "temperature"];

/// One model input row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    /// Day of week (0=Monday, 6=Sunday)
    pub weekday: u32,
    /// Hour of day (0-23)
    pub hour: u32,
    /// Precipitation amount in mm
    pub precipitation: f64,
    /// Snow depth in cm
    pub snow_depth: f64,
    /// Air temperature in degrees Celsius
    pub temperature: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.weekday as f64,
            self.hour as f64,
            self.precipitation,
            self.snow_depth,
            self.temperature,
        ]
    }

    pub fn feature_names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|n| n.to_string()).collect()
    }
}

/// Frame columns holding each feature.
#[derive(Debug, Clone)]
pub struct FeatureColumns {
    pub weekday: String,
    pub hour: String,
    pub precipitation: String,
    pub snow_depth: String,
    pub temperature: String,
}

impl FeatureColumns {
    pub fn from_config(columns: &ColumnsConfig) -> Self {
        Self {
            weekday: WEEKDAY_COL.to_string(),
            hour: HOUR_COL.to_string(),
            precipitation: columns.precipitation_col.clone(),
            snow_depth: columns.snow_depth_col.clone(),
            temperature: columns.temperature_col.clone(),
        }
    }
}

impl Default for FeatureColumns {
    fn default() -> Self {
        Self::from_config(&ColumnsConfig::default())
    }
}

/// Validate and cast the five feature columns of every row.
///
/// Fails on the first missing column, missing cell, out-of-range calendar
/// value or non-finite measurement, logging the reason.
pub fn extract_features(
    frame: &Frame,
    columns: &FeatureColumns,
) -> Result<Vec<FeatureVector>, FeatureError> {
    let result = extract(frame, columns);
    match &result {
        Ok(features) => tracing::info!("Extracted {} feature rows", features.len()),
        Err(e) => tracing::error!("Feature extraction failed: {}", e),
    }
    result
}

fn extract(frame: &Frame, columns: &FeatureColumns) -> Result<Vec<FeatureVector>, FeatureError> {
    let column = |name: &str| {
        frame
            .values(name)
            .map_err(|_| FeatureError::MissingColumn(name.to_string()))
    };
    let weekday = column(&columns.weekday)?;
    let hour = column(&columns.hour)?;
    let precipitation = column(&columns.precipitation)?;
    let snow_depth = column(&columns.snow_depth)?;
    let temperature = column(&columns.temperature)?;

    if frame.is_empty() {
        return Err(FeatureError::Empty);
    }

    (0..frame.len())
        .map(|row| {
            Ok(FeatureVector {
                weekday: calendar_value(row, &columns.weekday, weekday[row], 6)?,
                hour: calendar_value(row, &columns.hour, hour[row], 23)?,
                precipitation: measurement(row, &columns.precipitation, precipitation[row])?,
                snow_depth: measurement(row, &columns.snow_depth, snow_depth[row])?,
                temperature: measurement(row, &columns.temperature, temperature[row])?,
            })
        })
        .collect()
}

fn present(row: usize, column: &str, cell: Option<f64>) -> Result<f64, FeatureError> {
    cell.ok_or_else(|| FeatureError::MissingValue {
        row,
        column: column.to_string(),
    })
}

/// A whole number in `0..=max`.
fn calendar_value(row: usize, column: &str, cell: Option<f64>, max: u32) -> Result<u32, FeatureError> {
    let value = present(row, column, cell)?;
    if value.fract() != 0.0 || !(0.0..=max as f64).contains(&value) {
        return Err(FeatureError::InvalidValue {
            row,
            column: column.to_string(),
            value,
        });
    }
    Ok(value as u32)
}

fn measurement(row: usize, column: &str, cell: Option<f64>) -> Result<f64, FeatureError> {
    let value = present(row, column, cell)?;
    if !value.is_finite() {
        return Err(FeatureError::InvalidValue {
            row,
            column: column.to_string(),
            value,
        });
    }
    Ok(value)
}
