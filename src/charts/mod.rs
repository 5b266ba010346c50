//! PNG charts of gym usage and weather.
//!
//! Every chart function computes its aggregation, draws it with plotters and
//! writes the PNG under the configured output directory, returning the path.
//! Titles and axis labels need a TrueType font; when none is available the
//! charts are still written, without text.

pub mod device_usage;
mod render;
pub mod weather_impact;

use std::path::PathBuf;

pub use device_usage::{
    plot_device_usage_weekday_weekend_comparison, plot_mean_usage_per_hour,
    plot_total_device_usage,
};
pub use weather_impact::{
    plot_gym_usage_vs_precipitation, plot_gym_usage_vs_temperature,
    plot_mean_gym_usage_vs_precipitation, plot_mean_gym_usage_vs_temperature,
    plot_sample_count_vs_temperature,
};

use crate::analysis::categorize_day;
use crate::config::{ColumnsConfig, PlotConfig};
use crate::error::ChartError;
use crate::frame::Frame;
use render::{Canvas, DrawResult};

/// Output location and drawing parameters shared by all charts.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub output_dir: PathBuf,
    pub size: (u32, u32),
    pub num_bins: usize,
    /// Draw titles, axis labels and legends
    pub text: bool,
}

impl ChartOptions {
    /// Build options from config, registering the chart font on first use.
    pub fn from_config(plots: &PlotConfig) -> Self {
        Self {
            output_dir: plots.output_dir.clone(),
            size: (plots.width, plots.height),
            num_bins: plots.num_bins,
            text: render::text_enabled(plots.font_path.as_deref()),
        }
    }

    /// Create the output directory, then draw `file_name` into it.
    fn draw<F>(&self, file_name: &str, draw: F) -> Result<PathBuf, ChartError>
    where
        F: FnOnce(&Canvas) -> DrawResult,
    {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(ChartError::Render(format!(
                "invalid chart size {}x{}",
                self.size.0, self.size.1
            )));
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ChartError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(file_name);
        let canvas = Canvas {
            path: &path,
            size: self.size,
            text: self.text,
        };
        draw(&canvas).map_err(|e| ChartError::Render(e.to_string()))?;
        Ok(path)
    }
}

/// Log the outcome of one chart.
fn finish(chart: &str, result: Result<PathBuf, ChartError>) -> Result<PathBuf, ChartError> {
    match &result {
        Ok(path) => tracing::info!("Saved {} chart to {}", chart, path.display()),
        Err(e) => tracing::error!("Failed to plot {}: {}", chart, e),
    }
    result
}

/// Outcome of a full chart run.
#[derive(Debug, Default)]
pub struct PlotReport {
    pub written: Vec<PathBuf>,
    /// Chart name and the reason it failed
    pub failed: Vec<(String, ChartError)>,
}

impl PlotReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, chart: &str, result: Result<PathBuf, ChartError>) {
        match result {
            Ok(path) => self.written.push(path),
            Err(e) => self.failed.push((chart.to_string(), e)),
        }
    }
}

/// Draw all eight analysis charts, continuing past individual failures.
pub fn render_analysis_plots(
    frame: &Frame,
    columns: &ColumnsConfig,
    options: &ChartOptions,
) -> PlotReport {
    let devices = &columns.device_columns;
    let mut report = PlotReport::default();

    report.record(
        "total_device_usage",
        plot_total_device_usage(frame, devices, options),
    );
    report.record(
        "mean_usage_per_hour",
        plot_mean_usage_per_hour(frame, devices, options),
    );
    report.record(
        "weekday_weekend_comparison",
        plot_device_usage_weekday_weekend_comparison(frame, devices, categorize_day, options),
    );
    report.record(
        "gym_usage_vs_temperature",
        plot_gym_usage_vs_temperature(frame, &columns.temperature_col, options),
    );
    report.record(
        "gym_usage_vs_precipitation",
        plot_gym_usage_vs_precipitation(frame, &columns.precipitation_col, options),
    );
    report.record(
        "mean_gym_usage_vs_temperature",
        plot_mean_gym_usage_vs_temperature(frame, &columns.temperature_col, options),
    );
    report.record(
        "mean_usage_vs_precipitation",
        plot_mean_gym_usage_vs_precipitation(frame, &columns.precipitation_col, options),
    );
    report.record(
        "sample_count_vs_temperature",
        plot_sample_count_vs_temperature(frame, &columns.temperature_col, options),
    );

    if report.is_complete() {
        tracing::info!(
            "All {} charts written to {}",
            report.written.len(),
            options.output_dir.display()
        );
    } else {
        tracing::warn!(
            "{} of {} charts failed",
            report.failed.len(),
            report.failed.len() + report.written.len()
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    use std::cell::Cell;

    use super::*;
    use crate::analysis::DayType;
    use crate::frame::Column;
    use crate::transform::SUM_MINUTES_COL;

    fn options(dir: &TempDir) -> ChartOptions {
        ChartOptions {
            output_dir: dir.path().join("imgs"),
            size: (320, 240),
            num_bins: 4,
            text: false,
        }
    }

    fn columns() -> ColumnsConfig {
        ColumnsConfig {
            device_columns: vec!["19".to_string(), "20".to_string()],
            ..ColumnsConfig::default()
        }
    }

    fn enriched_frame() -> Frame {
        let start = Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap();
        let n = 72;
        let times = (0..n).map(|h| start + Duration::hours(h)).collect();
        let cols = columns();
        let a: Vec<f64> = (0..n).map(|h| (h % 24) as f64).collect();
        let b: Vec<f64> = (0..n).map(|h| (h % 5) as f64).collect();
        Frame::from_parts(
            "time",
            times,
            vec![
                Column::complete(cols.temperature_col.clone(), (0..n).map(|h| (h % 12) as f64 - 4.0)),
                Column::complete(cols.precipitation_col.clone(), (0..n).map(|h| (h % 3) as f64 * 0.4)),
                Column::complete("19", a.clone()),
                Column::complete("20", b.clone()),
                Column::complete(SUM_MINUTES_COL, a.iter().zip(&b).map(|(x, y)| x + y)),
            ],
        )
        .unwrap()
    }

    fn assert_png(path: &std::path::Path, size: (u32, u32)) {
        let image = image::open(path).expect("chart should be a readable PNG");
        assert_eq!((image.width(), image.height()), size);
    }

    // ==================== Chart Output Tests ====================

    #[test]
    fn test_render_analysis_plots_writes_all_charts() {
        let dir = TempDir::new().unwrap();
        let options = options(&dir);

        let report = render_analysis_plots(&enriched_frame(), &columns(), &options);

        assert!(report.is_complete(), "{:?}", report.failed);
        assert_eq!(report.written.len(), 8);
        for path in &report.written {
            assert!(path.starts_with(&options.output_dir));
            assert_png(path, options.size);
        }
    }

    #[test]
    fn test_default_file_names() {
        let dir = TempDir::new().unwrap();
        let options = options(&dir);
        let frame = enriched_frame();

        let path = plot_total_device_usage(&frame, &columns().device_columns, &options).unwrap();
        assert_eq!(path, options.output_dir.join("total_device_usage.png"));

        let path =
            plot_sample_count_vs_temperature(&frame, &columns().temperature_col, &options).unwrap();
        assert_eq!(path, options.output_dir.join("sample_count_vs_temperature.png"));
    }

    #[test]
    fn test_precipitation_scatter_without_rain_is_empty() {
        let dir = TempDir::new().unwrap();
        let cols = columns();
        let frame = enriched_frame()
            .with_column(cols.precipitation_col.clone(), vec![Some(0.0); 72])
            .unwrap();

        let result = plot_gym_usage_vs_precipitation(&frame, &cols.precipitation_col, &options(&dir));
        assert!(matches!(result, Err(ChartError::EmptyData(_))));
    }

    #[test]
    fn test_missing_sum_minutes_is_data_error() {
        let dir = TempDir::new().unwrap();
        let frame = Frame::from_parts(
            "time",
            vec![Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()],
            vec![Column::complete("temp", [1.0])],
        )
        .unwrap();

        let result = plot_gym_usage_vs_temperature(&frame, "temp", &options(&dir));
        assert!(matches!(result, Err(ChartError::Data(_))));
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let cols = ColumnsConfig {
            temperature_col: "missing temperature".to_string(),
            ..columns()
        };

        let report = render_analysis_plots(&enriched_frame(), &cols, &options(&dir));

        // The three temperature charts fail, the rest are still written
        assert_eq!(report.failed.len(), 3);
        assert_eq!(report.written.len(), 5);
    }

    #[test]
    fn test_empty_frame_reports_every_chart() {
        let dir = TempDir::new().unwrap();
        let frame = Frame::from_parts(
            "time",
            vec![],
            enriched_frame()
                .columns()
                .iter()
                .map(|c| Column::new(c.name.clone(), vec![]))
                .collect(),
        )
        .unwrap();

        let report = render_analysis_plots(&frame, &columns(), &options(&dir));
        assert_eq!(report.failed.len(), 8);
        assert!(
            report
                .failed
                .iter()
                .all(|(_, e)| matches!(e, ChartError::EmptyData(_)))
        );
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        let options = ChartOptions {
            size: (0, 240),
            ..options(&dir)
        };

        let result = plot_total_device_usage(&enriched_frame(), &columns().device_columns, &options);
        assert!(matches!(result, Err(ChartError::Render(_))));
    }

    // ==================== Day Categorization Tests ====================

    #[test]
    fn test_weekday_weekend_chart_uses_given_categorizer() {
        let dir = TempDir::new().unwrap();
        let calls = Cell::new(0);
        // Only Fridays count, as weekend
        let fridays_only = |day: u32| {
            calls.set(calls.get() + 1);
            (day == 4).then_some(DayType::Weekend)
        };

        let path = plot_device_usage_weekday_weekend_comparison(
            &enriched_frame(),
            &columns().device_columns,
            fridays_only,
            &options(&dir),
        )
        .unwrap();

        assert_eq!(calls.get(), 72);
        assert_eq!(path, options(&dir).output_dir.join("weekday_weekend_comparison.png"));
        assert_png(&path, options(&dir).size);
    }

    #[test]
    fn test_weekday_weekend_chart_without_categorized_days() {
        let dir = TempDir::new().unwrap();

        let result = plot_device_usage_weekday_weekend_comparison(
            &enriched_frame(),
            &columns().device_columns,
            |_| None,
            &options(&dir),
        );
        assert!(matches!(result, Err(ChartError::EmptyData(_))));
    }
}
