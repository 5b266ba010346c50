//! Charts relating total gym usage to the weather.

use std::path::PathBuf;

use super::render::{self, BarSeries, Labels};
use super::{ChartOptions, finish};
use crate::analysis::{BinStats, bin_statistics, scatter_points};
use crate::error::ChartError;
use crate::frame::Frame;
use crate::transform::SUM_MINUTES_COL;

pub const USAGE_VS_TEMPERATURE_FILE: &str = "gym_usage_vs_temperature.png";
pub const USAGE_VS_PRECIPITATION_FILE: &str = "gym_usage_vs_precipitation.png";
pub const MEAN_USAGE_VS_TEMPERATURE_FILE: &str = "mean_gym_usage_vs_temperature.png";
pub const MEAN_USAGE_VS_PRECIPITATION_FILE: &str = "mean_usage_vs_precipitation.png";
pub const SAMPLE_COUNT_VS_TEMPERATURE_FILE: &str = "sample_count_vs_temperature.png";

pub fn plot_gym_usage_vs_temperature(
    frame: &Frame,
    temperature_col: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    let labels = Labels {
        title: "Gym usage vs temperature",
        x_desc: "Temperature (°C)",
        y_desc: "Total minutes",
    };
    finish(
        "usage vs temperature",
        draw_scatter(frame, temperature_col, &labels, false, USAGE_VS_TEMPERATURE_FILE, options),
    )
}

/// Log-scaled precipitation axis; dry hours have no place on it and are left out.
pub fn plot_gym_usage_vs_precipitation(
    frame: &Frame,
    precipitation_col: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    let labels = Labels {
        title: "Gym usage vs precipitation",
        x_desc: "Precipitation (mm, log scale)",
        y_desc: "Total minutes",
    };
    finish(
        "usage vs precipitation",
        draw_scatter(frame, precipitation_col, &labels, true, USAGE_VS_PRECIPITATION_FILE, options),
    )
}

fn draw_scatter(
    frame: &Frame,
    x_col: &str,
    labels: &Labels,
    log_x: bool,
    file_name: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    let mut points = scatter_points(frame, x_col, SUM_MINUTES_COL)?;
    if log_x {
        let before = points.len();
        points.retain(|(x, _)| *x > 0.0);
        if points.len() < before {
            tracing::debug!(
                "Skipped {} non-positive '{}' values on log axis",
                before - points.len(),
                x_col
            );
        }
    }
    if points.is_empty() {
        return Err(ChartError::EmptyData(format!("no '{}' values to plot", x_col)));
    }

    options.draw(file_name, |canvas| render::scatter(canvas, labels, &points, log_x))
}

/// Binned mean usage over temperature with one standard deviation error bars.
pub fn plot_mean_gym_usage_vs_temperature(
    frame: &Frame,
    temperature_col: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    let labels = Labels {
        title: "Mean gym usage vs temperature",
        x_desc: "Temperature (°C)",
        y_desc: "Mean total minutes",
    };
    finish(
        "mean usage vs temperature",
        draw_binned_means(frame, temperature_col, &labels, MEAN_USAGE_VS_TEMPERATURE_FILE, options),
    )
}

/// Binned mean usage over precipitation with one standard deviation error bars.
pub fn plot_mean_gym_usage_vs_precipitation(
    frame: &Frame,
    precipitation_col: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    let labels = Labels {
        title: "Mean gym usage vs precipitation",
        x_desc: "Precipitation (mm)",
        y_desc: "Mean total minutes",
    };
    finish(
        "mean usage vs precipitation",
        draw_binned_means(frame, precipitation_col, &labels, MEAN_USAGE_VS_PRECIPITATION_FILE, options),
    )
}

fn binned(frame: &Frame, bin_col: &str, options: &ChartOptions) -> Result<Vec<BinStats>, ChartError> {
    let bins = bin_statistics(frame, bin_col, SUM_MINUTES_COL, options.num_bins)?;
    if bins.is_empty() {
        return Err(ChartError::EmptyData(format!("no '{}' values to bin", bin_col)));
    }
    Ok(bins)
}

fn draw_binned_means(
    frame: &Frame,
    bin_col: &str,
    labels: &Labels,
    file_name: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    let bins = binned(frame, bin_col, options)?;
    options.draw(file_name, |canvas| render::binned_means(canvas, labels, &bins))
}

/// Number of hourly samples in each temperature bin.
pub fn plot_sample_count_vs_temperature(
    frame: &Frame,
    temperature_col: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    finish(
        "sample count vs temperature",
        draw_sample_count(frame, temperature_col, options),
    )
}

fn draw_sample_count(
    frame: &Frame,
    temperature_col: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    let bins = binned(frame, temperature_col, options)?;
    let categories: Vec<String> = bins.iter().map(|b| format!("{:.1}", b.center())).collect();
    let series = [BarSeries {
        label: "Samples".to_string(),
        values: bins.iter().map(|b| Some(b.count as f64)).collect(),
    }];

    let labels = Labels {
        title: "Sample count vs temperature",
        x_desc: "Temperature bin center (°C)",
        y_desc: "Samples",
    };
    options.draw(SAMPLE_COUNT_VS_TEMPERATURE_FILE, |canvas| {
        render::grouped_bars(canvas, &labels, &categories, &series)
    })
}
