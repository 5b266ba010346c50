//! Inner join of weather and gym frames on their timestamps.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::DataError;
use crate::frame::{Column, Frame};

/// Join `weather` and `gym` on timestamp, keeping only shared timestamps.
///
/// The result has the weather columns followed by the gym columns, is named
/// after the gym time column, and follows the weather row order. A timestamp
/// repeated within one input only matches through its first occurrence.
pub fn merge_datasets(weather: &Frame, gym: &Frame) -> Result<Frame, DataError> {
    tracing::info!("Merging weather and gym datasets");

    if let Some(name) = weather.column_names().find(|name| gym.has_column(name)) {
        return Err(DataError::DuplicateColumn(name.to_string()));
    }

    let (gym_rows, gym_duplicates) = first_occurrences(gym.times());
    let mut seen: HashSet<DateTime<Utc>> = HashSet::new();
    let mut weather_duplicates = 0;
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for (weather_row, time) in weather.times().iter().enumerate() {
        if !seen.insert(*time) {
            weather_duplicates += 1;
            continue;
        }
        if let Some(&gym_row) = gym_rows.get(time) {
            pairs.push((weather_row, gym_row));
        }
    }

    if weather_duplicates + gym_duplicates > 0 {
        tracing::warn!(
            "Ignored duplicate timestamps while merging: {} weather, {} gym",
            weather_duplicates,
            gym_duplicates
        );
    }

    let weather_rows: Vec<usize> = pairs.iter().map(|(w, _)| *w).collect();
    let gym_rows: Vec<usize> = pairs.iter().map(|(_, g)| *g).collect();
    let left = weather.take_rows(&weather_rows);
    let right = gym.take_rows(&gym_rows);

    let columns: Vec<Column> = left
        .columns()
        .iter()
        .chain(right.columns())
        .cloned()
        .collect();
    let merged = Frame::from_parts(gym.time_col(), left.times().to_vec(), columns)?;

    if merged.is_empty() {
        tracing::warn!("Merged dataset is empty: weather and gym timestamps do not overlap");
    } else {
        tracing::info!(
            "Datasets merged: {} rows ({} weather, {} gym)",
            merged.len(),
            weather.len(),
            gym.len()
        );
    }
    Ok(merged)
}

/// Map each timestamp to its first row, counting the repeats.
fn first_occurrences(times: &[DateTime<Utc>]) -> (HashMap<DateTime<Utc>, usize>, usize) {
    let mut rows = HashMap::with_capacity(times.len());
    let mut duplicates = 0;
    for (row, time) in times.iter().enumerate() {
        if rows.contains_key(time) {
            duplicates += 1;
        } else {
            rows.insert(*time, row);
        }
    }
    (rows, duplicates)
}
