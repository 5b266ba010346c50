use std::path::PathBuf;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Device IDs present in the Hietaniemi outdoor gym export.
pub const DEFAULT_DEVICE_COLUMNS: [&str; 8] = ["19", "20", "21", "22", "23", "24", "25", "26"];

pub const DEFAULT_GYM_DATA_PATH: &str = "data/raw/hietaniemi_gym.csv";
pub const DEFAULT_WEATHER_DATA_PATH: &str = "data/raw/kaisaniemi_weather.csv";
pub const DEFAULT_MODEL_PATH: &str = "artifacts/hietaniemi_gym/0.0.1/models/model.json";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub columns: ColumnsConfig,
    pub weather: WeatherFieldsConfig,
    pub plots: PlotConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub gym_data_path: PathBuf,
    pub weather_data_path: PathBuf,
    pub model_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            gym_data_path: PathBuf::from(DEFAULT_GYM_DATA_PATH),
            weather_data_path: PathBuf::from(DEFAULT_WEATHER_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// Column names shared by the loaders, transforms, charts and feature extraction.
#[derive(Debug, Deserialize, Clone)]
pub struct ColumnsConfig {
    pub time_col: String,
    pub device_columns: Vec<String>,
    pub temperature_col: String,
    pub precipitation_col: String,
    pub snow_depth_col: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            time_col: "time".to_string(),
            device_columns: DEFAULT_DEVICE_COLUMNS.iter().map(|d| d.to_string()).collect(),
            temperature_col: "Air temperature (degC)".to_string(),
            precipitation_col: "Precipitation amount (mm)".to_string(),
            snow_depth_col: "Snow depth (cm)".to_string(),
        }
    }
}

impl ColumnsConfig {
    /// Weather measurements read from the weather CSV.
    pub fn weather_measurements(&self) -> Vec<String> {
        vec![
            self.precipitation_col.clone(),
            self.snow_depth_col.clone(),
            self.temperature_col.clone(),
        ]
    }
}

/// Header names of the date parts in the weather CSV.
#[derive(Debug, Deserialize, Clone)]
pub struct WeatherFieldsConfig {
    pub year_col: String,
    pub month_col: String,
    pub day_col: String,
    pub hour_col: String,
}

impl Default for WeatherFieldsConfig {
    fn default() -> Self {
        Self {
            year_col: "Year".to_string(),
            month_col: "Month".to_string(),
            day_col: "Day".to_string(),
            hour_col: "Hour".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlotConfig {
    pub output_dir: PathBuf,
    pub num_bins: usize,
    pub width: u32,
    pub height: u32,
    /// TrueType font used for titles and axis labels.
    pub font_path: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("artifacts/hietaniemi_gym/0.0.1/data/imgs_analysis"),
            num_bins: 20,
            width: 800,
            height: 640,
            font_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            filter: "hietaniemi_gym=debug".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration for the given deployment stage.
    ///
    /// `.env.<stage>` is read first so its values win over the shared `.env`.
    pub fn load(stage: &str) -> Result<Self> {
        // Both files are optional: production sets the variables directly
        let _ = dotenvy::from_filename(format!(".env.{}", stage));
        let _ = dotenvy::dotenv();

        let gym_data_path =
            std::env::var("GYM_DATA_PATH").unwrap_or_else(|_| DEFAULT_GYM_DATA_PATH.to_string());
        let weather_data_path = std::env::var("WEATHER_DATA_PATH")
            .unwrap_or_else(|_| DEFAULT_WEATHER_DATA_PATH.to_string());
        let model_path =
            std::env::var("MODEL_PATH").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());

        let columns = ColumnsConfig::default();
        let weather = WeatherFieldsConfig::default();
        let plots = PlotConfig::default();
        let logging = LoggingConfig::default();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hietaniemi-gym");

        let builder = Config::builder()
            // 1. Defaults
            // Data paths (from the stage environment above)
            .set_default("data.gym_data_path", gym_data_path)?
            .set_default("data.weather_data_path", weather_data_path)?
            .set_default("data.model_path", model_path)?
            // Columns
            .set_default("columns.time_col", columns.time_col)?
            .set_default("columns.device_columns", columns.device_columns)?
            .set_default("columns.temperature_col", columns.temperature_col)?
            .set_default("columns.precipitation_col", columns.precipitation_col)?
            .set_default("columns.snow_depth_col", columns.snow_depth_col)?
            // Weather date parts
            .set_default("weather.year_col", weather.year_col)?
            .set_default("weather.month_col", weather.month_col)?
            .set_default("weather.day_col", weather.day_col)?
            .set_default("weather.hour_col", weather.hour_col)?
            // Plots
            .set_default("plots.output_dir", plots.output_dir.to_string_lossy().to_string())?
            .set_default("plots.num_bins", plots.num_bins as u64)?
            .set_default("plots.width", plots.width as u64)?
            .set_default("plots.height", plots.height as u64)?
            // Logging
            .set_default("logging.log_dir", logging.log_dir.to_string_lossy().to_string())?
            .set_default("logging.filter", logging.filter)?

            // 2. Local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. User config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))

            // 4. Environment variables (HIETANIEMI__PLOTS__NUM_BINS=...)
            .add_source(Environment::with_prefix("HIETANIEMI").separator("__"));

        let s = builder.build()?;
        Ok(s.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Default Value Tests ====================

    #[test]
    fn test_columns_config_defaults() {
        let config = ColumnsConfig::default();
        assert_eq!(config.time_col, "time");
        assert_eq!(config.device_columns.len(), 8);
        assert_eq!(config.device_columns[0], "19");
        assert_eq!(config.device_columns[7], "26");
    }

    #[test]
    fn test_weather_fields_defaults() {
        let config = WeatherFieldsConfig::default();
        assert_eq!(config.year_col, "Year");
        assert_eq!(config.month_col, "Month");
        assert_eq!(config.day_col, "Day");
        assert_eq!(config.hour_col, "Hour");
    }

    #[test]
    fn test_plot_config_defaults() {
        let config = PlotConfig::default();
        assert_eq!(config.num_bins, 20);
        assert!(config.width > 0 && config.height > 0);
        assert!(config.font_path.is_none());
    }

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_weather_measurements_order() {
        let config = ColumnsConfig::default();
        let measurements = config.weather_measurements();
        assert_eq!(measurements.len(), 3);
        assert_eq!(measurements[0], config.precipitation_col);
        assert_eq!(measurements[2], config.temperature_col);
    }

    // ==================== Config Loading Tests ====================

    #[test]
    fn test_config_load_with_defaults() {
        let result = AppConfig::load("test");
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn test_loaded_config_has_expected_structure() {
        let config = AppConfig::load("test").expect("Config should load");

        assert!(!config.columns.time_col.is_empty());
        assert!(!config.columns.device_columns.is_empty());
        assert!(config.plots.num_bins > 0);
        assert!(!config.weather.hour_col.is_empty());
    }

    // ==================== Environment Variable Override Tests ====================

    /// Helper to safely set and remove environment variables in tests.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        // SAFETY: Test environment, the keys are unique to each test
        unsafe {
            std::env::set_var(key, value);
        }
        let result = f();
        unsafe {
            std::env::remove_var(key);
        }
        result
    }

    #[test]
    fn test_env_var_overrides_num_bins() {
        let config = with_env_var("HIETANIEMI__PLOTS__NUM_BINS", "7", || {
            AppConfig::load("test").expect("Config should load")
        });

        assert_eq!(config.plots.num_bins, 7);
    }

    #[test]
    fn test_env_var_overrides_weather_hour_column() {
        let config = with_env_var("HIETANIEMI__WEATHER__HOUR_COL", "Time", || {
            AppConfig::load("test").expect("Config should load")
        });

        assert_eq!(config.weather.hour_col, "Time");
    }
}
