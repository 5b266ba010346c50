//! Column-oriented table keyed by a UTC timestamp.
//!
//! Every row carries one timestamp and one cell per named numeric column.
//! Cells may be missing. Frames are never mutated by the pipeline stages:
//! each transform clones what it needs and returns a new frame.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::DataError;

/// Raw cell values treated as missing.
/// Missing-value spellings, compared case-insensitively.
const MISSING_MARKERS: [&str; 17] = [
    "",
    "-",
    "#N/A",
    "#N/A N/A",
    "#NA",
    "-1.#IND",
    "-1.#QNAN",
    "-NaN",
    "1.#IND",
    "1.#QNAN",
    "<NA>",
    "N/A",
    "NA",
    "NULL",
    "NaN",
    "None",
    "n/a",
];

/// A named numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a column with no missing cells.
    pub fn complete(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, values.into_iter().map(Some).collect())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    time_col: String,
    times: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
}

impl Frame {
    /// Create an empty frame with the given time column name.
    pub fn new(time_col: impl Into<String>) -> Self {
        Self {
            time_col: time_col.into(),
            times: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Assemble a frame, checking that every column matches the time index.
    pub fn from_parts(
        time_col: impl Into<String>,
        times: Vec<DateTime<Utc>>,
        columns: Vec<Column>,
    ) -> Result<Self, DataError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DataError::DuplicateColumn(column.name.clone()));
            }
            if column.values.len() != times.len() {
                return Err(DataError::LengthMismatch {
                    column: column.name.clone(),
                    expected: times.len(),
                    actual: column.values.len(),
                });
            }
        }

        Ok(Self {
            time_col: time_col.into(),
            times,
            columns,
        })
    }

    pub fn time_col(&self) -> &str {
        &self.time_col
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cells of a column, or `MissingColumn`.
    pub fn values(&self, name: &str) -> Result<&[Option<f64>], DataError> {
        self.column(name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Cells of a column that must not contain missing values.
    pub fn complete_values(&self, name: &str) -> Result<Vec<f64>, DataError> {
        self.values(name)?
            .iter()
            .map(|v| v.ok_or_else(|| DataError::MissingValues(name.to_string())))
            .collect()
    }

    /// Return a copy with `name` added, or replaced if it already exists.
    pub fn with_column(
        &self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(DataError::LengthMismatch {
                column: name,
                expected: self.len(),
                actual: values.len(),
            });
        }

        let mut frame = self.clone();
        match frame.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => frame.columns.push(Column::new(name, values)),
        }
        Ok(frame)
    }

    /// Return a copy with a column computed from each row's timestamp.
    pub fn with_time_column<F>(&self, name: &str, derive: F) -> Self
    where
        F: Fn(&DateTime<Utc>) -> f64,
    {
        let values = self.times.iter().map(|t| Some(derive(t))).collect();
        let mut frame = self.clone();
        match frame.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => frame.columns.push(Column::new(name, values)),
        }
        frame
    }

    /// Return a copy holding only the rows for which `keep(row)` is true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let kept: Vec<usize> = (0..self.len()).filter(|&row| keep(row)).collect();
        self.take_rows(&kept)
    }

    /// Return a copy holding the given rows in the given order.
    pub(crate) fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            time_col: self.time_col.clone(),
            times: rows.iter().map(|&row| self.times[row]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), rows.iter().map(|&row| c.values[row]).collect()))
                .collect(),
        }
    }

    /// True if any column has a missing cell in `row`.
    pub fn row_has_missing(&self, row: usize) -> bool {
        self.columns.iter().any(|c| c.values[row].is_none())
    }
}

/// Parse a raw CSV cell, mapping the usual missing markers and any NaN to `None`.
///
/// Returns `Err(())` when the cell is present but not numeric.
pub(crate) fn parse_cell(raw: &str) -> Result<Option<f64>, ()> {
    let trimmed = raw.trim();
    if MISSING_MARKERS
        .iter()
        .any(|marker| marker.eq_ignore_ascii_case(trimmed))
    {
        return Ok(None);
    }
    let value = trimmed.parse::<f64>().map_err(|_| ())?;
    Ok(Some(value).filter(|v| !v.is_nan()))
}
