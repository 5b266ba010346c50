//! Per-device usage charts.

use std::path::PathBuf;

use super::render::{self, BarSeries, Labels};
use super::{ChartOptions, finish};
use crate::analysis::{self, DayType, mean_usage_per_hour, total_usage_per_device};
use crate::error::ChartError;
use crate::frame::Frame;

pub const TOTAL_DEVICE_USAGE_FILE: &str = "total_device_usage.png";
pub const MEAN_USAGE_PER_HOUR_FILE: &str = "mean_usage_per_hour.png";
pub const WEEKDAY_WEEKEND_FILE: &str = "weekday_weekend_comparison.png";

/// Bar chart of total minutes per device.
pub fn plot_total_device_usage(
    frame: &Frame,
    devices: &[String],
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    finish("total device usage", draw_total_device_usage(frame, devices, options))
}

fn draw_total_device_usage(
    frame: &Frame,
    devices: &[String],
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    if frame.is_empty() || devices.is_empty() {
        return Err(ChartError::EmptyData("total device usage".to_string()));
    }
    let totals = total_usage_per_device(frame, devices)?;
    let series = [BarSeries {
        label: "Total minutes".to_string(),
        values: totals.iter().map(|(_, total)| Some(*total)).collect(),
    }];

    let labels = Labels {
        title: "Total usage per device",
        x_desc: "Device",
        y_desc: "Minutes",
    };
    options.draw(TOTAL_DEVICE_USAGE_FILE, |canvas| {
        render::grouped_bars(canvas, &labels, devices, &series)
    })
}

/// Grouped bar chart of mean usage per device for each hour of the day.
pub fn plot_mean_usage_per_hour(
    frame: &Frame,
    devices: &[String],
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    finish("mean usage per hour", draw_mean_usage_per_hour(frame, devices, options))
}

fn draw_mean_usage_per_hour(
    frame: &Frame,
    devices: &[String],
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    if frame.is_empty() || devices.is_empty() {
        return Err(ChartError::EmptyData("mean usage per hour".to_string()));
    }
    let series: Vec<BarSeries> = mean_usage_per_hour(frame, devices)?
        .into_iter()
        .map(|usage| BarSeries {
            label: usage.device,
            values: usage.means,
        })
        .collect();
    let hours: Vec<String> = (0..analysis::HOURS_PER_DAY).map(|h| h.to_string()).collect();

    let labels = Labels {
        title: "Mean usage per hour",
        x_desc: "Hour of day",
        y_desc: "Mean minutes",
    };
    options.draw(MEAN_USAGE_PER_HOUR_FILE, |canvas| {
        render::grouped_bars(canvas, &labels, &hours, &series)
    })
}

/// Grouped bar chart comparing weekday and weekend mean usage per device.
///
/// `categorize` maps a weekday (Monday=0) to its day type, as in
/// `analysis::categorize_day`.
pub fn plot_device_usage_weekday_weekend_comparison<F>(
    frame: &Frame,
    devices: &[String],
    categorize: F,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError>
where
    F: Fn(u32) -> Option<DayType>,
{
    finish(
        "weekday/weekend comparison",
        draw_weekday_weekend_comparison(frame, devices, categorize, options),
    )
}

fn draw_weekday_weekend_comparison<F>(
    frame: &Frame,
    devices: &[String],
    categorize: F,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError>
where
    F: Fn(u32) -> Option<DayType>,
{
    if frame.is_empty() || devices.is_empty() {
        return Err(ChartError::EmptyData("weekday/weekend comparison".to_string()));
    }
    let usage = analysis::weekday_weekend_usage(frame, devices, categorize)?;
    if usage.iter().all(|u| u.weekday.is_none() && u.weekend.is_none()) {
        return Err(ChartError::EmptyData("no categorized days to compare".to_string()));
    }
    let series: Vec<BarSeries> = [DayType::Weekday, DayType::Weekend]
        .into_iter()
        .map(|day_type| BarSeries {
            label: day_type.label().to_string(),
            values: usage
                .iter()
                .map(|u| match day_type {
                    DayType::Weekday => u.weekday,
                    DayType::Weekend => u.weekend,
                })
                .collect(),
        })
        .collect();

    let labels = Labels {
        title: "Device usage: weekday vs weekend",
        x_desc: "Device",
        y_desc: "Mean minutes",
    };
    options.draw(WEEKDAY_WEEKEND_FILE, |canvas| {
        render::grouped_bars(canvas, &labels, devices, &series)
    })
}
