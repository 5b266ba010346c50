//! Hietaniemi Gym Library
//!
//! Loads the Hietaniemi outdoor gym usage export and the Kaisaniemi weather
//! observations, joins them hourly, draws the analysis charts and scores a
//! pre-trained usage model against the observed totals.

pub mod analysis;
pub mod charts;
pub mod clean;
pub mod config;
pub mod error;
pub mod frame;
pub mod loader;
pub mod merge;
pub mod ml;
pub mod pipeline;
pub mod traits;
pub mod transform;

// Re-export commonly used types
pub use analysis::{
    BinStats, DayType, DayTypeUsage, HourlyDeviceUsage, bin_statistics, categorize_day,
    mean_usage_per_hour, scatter_points, total_usage_per_device, weekday_weekend_usage,
};
pub use charts::{ChartOptions, PlotReport, render_analysis_plots};
pub use clean::{QualityReport, clean_data, max_na_series, missing_value_report, validate_usage};
pub use config::AppConfig;
pub use error::{
    ChartError, DataError, EvaluationError, FeatureError, MetricsError, PredictError, TrainingError,
};
pub use frame::{Column, Frame};
pub use loader::{WeatherSchema, load_gym_data, load_weather_data};
pub use merge::merge_datasets;
pub use ml::{
    FeatureColumns, FeatureVector, PersistedModel, PersistenceError, PredictorConfig,
    PredictorModel, RegressionMetrics, TrainedModel, calculate_metrics, evaluate_predictions,
    extract_features,
};
pub use pipeline::{
    PredictionReport, data_analysis_pipeline, predict_pipeline, predict_pipeline_with_model,
};
pub use traits::{MockRegressor, Regressor};
pub use transform::{
    Reducer, add_hour_feature, add_sum_minutes_feature, add_weekday_feature,
    aggregate_hourly_usage,
};
