//! End-to-end runs: analysis charts and model evaluation.
//!
//! Both pipelines share one preparation pass: load, clean, aggregate the gym
//! readings to hourly totals, merge with the weather and derive the calendar
//! and total-usage features. Any stage error aborts the run.

use std::path::Path;

use anyhow::{Context, Result};

use crate::charts::{ChartOptions, render_analysis_plots};
use crate::clean::{clean_data, max_na_series, validate_usage};
use crate::config::AppConfig;
use crate::frame::Frame;
use crate::loader::{WeatherSchema, load_gym_data, load_weather_data};
use crate::merge::merge_datasets;
use crate::ml::{
    FeatureColumns, PredictorConfig, PredictorModel, RegressionMetrics, calculate_metrics,
    extract_features,
};
use crate::transform::{
    Reducer, SUM_MINUTES_COL, add_hour_feature, add_sum_minutes_feature, add_weekday_feature,
    aggregate_hourly_usage,
};

/// Column holding model predictions in `PredictionReport::frame`.
pub const PREDICTION_COL: &str = "prediction";

/// Result of a prediction run.
#[derive(Debug, Clone)]
pub struct PredictionReport {
    /// Enriched hourly table with a `prediction` column
    pub frame: Frame,
    pub predictions: Vec<f64>,
    /// Ground truth (`sum_minutes`)
    pub actual: Vec<f64>,
    pub metrics: RegressionMetrics,
}

fn log_missing_values(source: &str, frame: &Frame) {
    for column in frame.columns() {
        let missing = column.missing_count();
        if missing > 0 {
            tracing::debug!(
                "{} column '{}': {} missing values, longest run {}",
                source,
                column.name,
                missing,
                max_na_series(&column.values)
            );
        }
    }
}

/// Load both sources and build the enriched hourly table.
pub fn prepare_dataset(gym_path: &Path, weather_path: &Path, config: &AppConfig) -> Result<Frame> {
    let columns = &config.columns;

    let gym = load_gym_data(gym_path, &columns.time_col).context("Failed to load gym data")?;
    log_missing_values("Gym", &gym);
    validate_usage(&gym, &columns.device_columns)
        .context("Failed to check gym data quality")?
        .log();

    let schema = WeatherSchema::from_config(columns, &config.weather);
    let weather =
        load_weather_data(weather_path, &schema).context("Failed to load weather data")?;
    log_missing_values("Weather", &weather);

    tracing::info!("Cleaning data");
    let gym = clean_data(&gym);
    let weather = clean_data(&weather);

    tracing::info!("Aggregating gym usage to hourly totals");
    let hourly = aggregate_hourly_usage(&gym, &columns.device_columns, Reducer::Sum)
        .context("Failed to aggregate gym data")?;

    let merged = merge_datasets(&weather, &hourly).context("Failed to merge datasets")?;

    tracing::info!("Adding weekday, hour and sum of minutes features");
    let enriched = add_weekday_feature(&merged);
    let enriched = add_hour_feature(&enriched);
    let enriched = add_sum_minutes_feature(&enriched, &columns.device_columns)
        .context("Failed to add sum of minutes feature")?;

    Ok(enriched)
}

/// Prepare the data and write all analysis charts.
///
/// Individual chart failures are logged and do not abort the run.
pub fn data_analysis_pipeline(
    gym_path: &Path,
    weather_path: &Path,
    config: &AppConfig,
) -> Result<Frame> {
    tracing::info!("Starting data analysis pipeline");

    let data = prepare_dataset(gym_path, weather_path, config)?;

    let options = ChartOptions::from_config(&config.plots);
    let report = render_analysis_plots(&data, &config.columns, &options);
    tracing::info!(
        "Data analysis pipeline finished: {} rows, {} charts written, {} failed",
        data.len(),
        report.written.len(),
        report.failed.len()
    );

    Ok(data)
}

/// Load the model at `model_path`, predict usage and score it against `sum_minutes`.
pub fn predict_pipeline(
    gym_path: &Path,
    weather_path: &Path,
    model_path: &Path,
    config: &AppConfig,
) -> Result<PredictionReport> {
    let predictor = PredictorModel::load(&PredictorConfig {
        model_path: model_path.to_path_buf(),
    })
    .with_context(|| format!("Failed to load model from {}", model_path.display()))?;

    predict_pipeline_with_model(gym_path, weather_path, &predictor, config)
}

/// Prediction run with an already constructed predictor.
pub fn predict_pipeline_with_model(
    gym_path: &Path,
    weather_path: &Path,
    predictor: &PredictorModel,
    config: &AppConfig,
) -> Result<PredictionReport> {
    tracing::info!("Starting prediction pipeline");

    let data = prepare_dataset(gym_path, weather_path, config)?;

    let features = extract_features(&data, &FeatureColumns::from_config(&config.columns))
        .context("Failed to extract model features")?;

    tracing::info!("Making predictions on {} rows", features.len());
    let predictions = predictor
        .predict(&features)
        .context("Failed to make predictions")?;

    let actual = data
        .complete_values(SUM_MINUTES_COL)
        .context("Ground truth is incomplete")?;
    let metrics =
        calculate_metrics(&actual, &predictions).context("Failed to calculate metrics")?;
    metrics.log();

    let frame = data
        .with_column(PREDICTION_COL, predictions.iter().copied().map(Some).collect())
        .context("Failed to attach predictions")?;

    tracing::info!("Prediction pipeline finished");
    Ok(PredictionReport {
        frame,
        predictions,
        actual,
        metrics,
    })
}
