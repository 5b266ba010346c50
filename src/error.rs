//! Typed errors for the data, feature, prediction and chart stages.
//!
//! Pipelines wrap these in `anyhow` with context naming the failing stage.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, reshaping or joining tabular data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Missing column '{0}'")]
    MissingColumn(String),
    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),
    #[error("Row {row}: invalid timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },
    #[error("Row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("Column '{0}' contains missing values")]
    MissingValues(String),
    #[error("Number of bins must be at least 1")]
    InvalidBinCount,
}

/// Reasons a frame cannot be turned into model inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Feature column '{0}' is missing")]
    MissingColumn(String),
    #[error("Row {row}: feature '{column}' is missing")]
    MissingValue { row: usize, column: String },
    #[error("Row {row}: feature '{column}' has invalid value {value}")]
    InvalidValue {
        row: usize,
        column: String,
        value: f64,
    },
    #[error("No rows to extract features from")]
    Empty,
}

/// Failures while running a loaded model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("Model failed: {0}")]
    Model(String),
    #[error("Model returned {actual} predictions for {expected} inputs")]
    OutputLength { expected: usize, actual: usize },
    #[error("Model returned a non-finite prediction at row {0}")]
    NonFinite(usize),
}

/// Failures while fitting a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("Insufficient data for training: {0} samples")]
    InsufficientData(usize),
    #[error("Feature and target lengths mismatch: {features} vs {targets}")]
    MismatchedLengths { features: usize, targets: usize },
    #[error("Array error: {0}")]
    Array(String),
    #[error("Model fitting error: {0}")]
    Fit(String),
}

/// Validation errors for regression metric inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("Cannot compute metrics on empty inputs")]
    Empty,
    #[error("Length mismatch: {y_true} true values vs {y_pred} predictions")]
    LengthMismatch { y_true: usize, y_pred: usize },
    #[error("Non-finite value in {0} at index {1}")]
    NonFinite(&'static str, usize),
}

/// Why a model evaluation failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Errors raised while rendering or saving a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Nothing to plot: {0}")]
    EmptyData(String),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("Failed to prepare output directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Rendering failed: {0}")]
    Render(String),
}
