use chrono::{Datelike, Timelike};

use crate::error::DataError;
use crate::frame::Frame;

pub const HOURS_PER_DAY: usize = 24;

// ==================== Day Categories ====================

/// Part of the week a day falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayType {
    /// Monday to Friday
    Weekday,
    /// Saturday and Sunday
    Weekend,
}

impl DayType {
    pub fn label(&self) -> &'static str {
        match self {
            DayType::Weekday => "Weekday",
            DayType::Weekend => "Weekend",
        }
    }
}

/// Categorize a weekday index (Monday=0 .. Sunday=6).
pub fn categorize_day(weekday: u32) -> Option<DayType> {
    match weekday {
        0..=4 => Some(DayType::Weekday),
        5 | 6 => Some(DayType::Weekend),
        _ => None,
    }
}

// ==================== Aggregation Types ====================

/// Mean usage of one device on weekdays and on weekends.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTypeUsage {
    pub device: String,
    /// None when the frame has no weekday rows for this device
    pub weekday: Option<f64>,
    /// None when the frame has no weekend rows for this device
    pub weekend: Option<f64>,
}

/// Mean usage of one device for each hour of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyDeviceUsage {
    pub device: String,
    /// Indexed by hour (0-23); None for hours without readings
    pub means: Vec<Option<f64>>,
}

/// Summary of one equal-width bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinStats {
    /// Inclusive lower edge
    pub left: f64,
    /// Exclusive upper edge (inclusive for the last bin)
    pub right: f64,
    pub count: usize,
    /// None for an empty bin
    pub mean: Option<f64>,
    /// Sample standard deviation; None with fewer than two samples
    pub std: Option<f64>,
}

impl BinStats {
    pub fn center(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

// ==================== Aggregations ====================

/// Total minutes recorded by each device, in the given order.
pub fn total_usage_per_device(
    frame: &Frame,
    devices: &[String],
) -> Result<Vec<(String, f64)>, DataError> {
    devices
        .iter()
        .map(|device| {
            let total = frame.values(device)?.iter().flatten().sum();
            Ok((device.clone(), total))
        })
        .collect()
}

/// Mean usage per device for each hour of the day.
///
/// Always returns 24 buckets per device; the hour comes from the timestamp.
pub fn mean_usage_per_hour(
    frame: &Frame,
    devices: &[String],
) -> Result<Vec<HourlyDeviceUsage>, DataError> {
    let hours: Vec<usize> = frame.times().iter().map(|t| t.hour() as usize).collect();

    devices
        .iter()
        .map(|device| {
            let values = frame.values(device)?;
            let mut sums = [0.0; HOURS_PER_DAY];
            let mut counts = [0usize; HOURS_PER_DAY];
            for (hour, value) in hours.iter().zip(values) {
                if let Some(v) = value {
                    sums[*hour] += v;
                    counts[*hour] += 1;
                }
            }
            let means = sums
                .iter()
                .zip(counts)
                .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                .collect();
            Ok(HourlyDeviceUsage {
                device: device.clone(),
                means,
            })
        })
        .collect()
}

/// Mean usage per device for weekdays and weekends.
///
/// `categorize` maps the timestamp's weekday (Monday=0) to a day type; rows
/// it returns `None` for are ignored.
pub fn weekday_weekend_usage<F>(
    frame: &Frame,
    devices: &[String],
    categorize: F,
) -> Result<Vec<DayTypeUsage>, DataError>
where
    F: Fn(u32) -> Option<DayType>,
{
    let day_types: Vec<Option<DayType>> = frame
        .times()
        .iter()
        .map(|t| categorize(t.weekday().num_days_from_monday()))
        .collect();

    devices
        .iter()
        .map(|device| {
            let values = frame.values(device)?;
            let mean_for = |wanted: DayType| {
                let selected: Vec<f64> = day_types
                    .iter()
                    .zip(values)
                    .filter(|(day_type, _)| **day_type == Some(wanted))
                    .filter_map(|(_, v)| *v)
                    .collect();
                mean(&selected)
            };
            Ok(DayTypeUsage {
                device: device.clone(),
                weekday: mean_for(DayType::Weekday),
                weekend: mean_for(DayType::Weekend),
            })
        })
        .collect()
}

/// Rows where both `x_col` and `y_col` are present, as (x, y) pairs.
pub fn scatter_points(frame: &Frame, x_col: &str, y_col: &str) -> Result<Vec<(f64, f64)>, DataError> {
    let xs = frame.values(x_col)?;
    let ys = frame.values(y_col)?;
    Ok(xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect())
}

/// Split `bin_col` into `num_bins` equal-width bins and summarize `value_col` in each.
///
/// Bins cover [min, max] of the present values; empty bins are kept. A column
/// with a single distinct value yields one bin. No data yields no bins.
pub fn bin_statistics(
    frame: &Frame,
    bin_col: &str,
    value_col: &str,
    num_bins: usize,
) -> Result<Vec<BinStats>, DataError> {
    if num_bins == 0 {
        return Err(DataError::InvalidBinCount);
    }
    let points = scatter_points(frame, bin_col, value_col)?;
    let Some((min, max)) = range(points.iter().map(|(x, _)| *x)) else {
        return Ok(Vec::new());
    };

    let num_bins = if max > min { num_bins } else { 1 };
    let width = (max - min) / num_bins as f64;

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); num_bins];
    for (x, y) in points {
        let index = if width > 0.0 {
            (((x - min) / width).floor() as usize).min(num_bins - 1)
        } else {
            0
        };
        members[index].push(y);
    }

    let bins = members
        .iter()
        .enumerate()
        .map(|(i, values)| {
            let left = min + i as f64 * width;
            let right = if i + 1 == num_bins {
                max
            } else {
                min + (i + 1) as f64 * width
            };
            BinStats {
                left,
                right,
                count: values.len(),
                mean: mean(values),
                std: sample_std(values),
            }
        })
        .collect();
    Ok(bins)
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::frame::Column;

    /// 2020-01-06 was a Monday.
    fn monday_at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 6, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn devices() -> Vec<String> {
        vec!["19".to_string(), "20".to_string()]
    }

    fn usage_frame() -> Frame {
        // Monday 08:00, Monday 09:00, Saturday 08:00
        Frame::from_parts(
            "time",
            vec![monday_at(8), monday_at(9), monday_at(5 * 24 + 8)],
            vec![
                Column::new("19", vec![Some(10.0), Some(20.0), None]),
                Column::complete("20", [1.0, 2.0, 6.0]),
                Column::complete("temp", [-5.0, 0.0, 5.0]),
            ],
        )
        .unwrap()
    }

    // ==================== categorize_day Tests ====================

    #[test]
    fn test_categorize_day_weekdays() {
        for day in 0..=4 {
            assert_eq!(categorize_day(day), Some(DayType::Weekday));
        }
    }

    #[test]
    fn test_categorize_day_weekend() {
        assert_eq!(categorize_day(5), Some(DayType::Weekend));
        assert_eq!(categorize_day(6), Some(DayType::Weekend));
    }

    #[test]
    fn test_categorize_day_out_of_range() {
        assert_eq!(categorize_day(7), None);
        assert_eq!(categorize_day(u32::MAX), None);
    }

    // ==================== Device Aggregation Tests ====================

    #[test]
    fn test_total_usage_per_device_skips_missing() {
        let totals = total_usage_per_device(&usage_frame(), &devices()).unwrap();
        assert_eq!(
            totals,
            vec![("19".to_string(), 30.0), ("20".to_string(), 9.0)]
        );
    }

    #[test]
    fn test_total_usage_unknown_device() {
        let result = total_usage_per_device(&usage_frame(), &["99".to_string()]);
        assert!(matches!(result, Err(DataError::MissingColumn(_))));
    }

    #[test]
    fn test_mean_usage_per_hour_has_24_buckets() {
        let usage = mean_usage_per_hour(&usage_frame(), &devices()).unwrap();

        assert_eq!(usage.len(), 2);
        assert!(usage.iter().all(|u| u.means.len() == HOURS_PER_DAY));
        // Device 20 at 08:00: Monday 1.0 and Saturday 6.0
        assert_eq!(usage[1].means[8], Some(3.5));
        assert_eq!(usage[0].means[8], Some(10.0));
        assert_eq!(usage[0].means[0], None);
    }

    #[test]
    fn test_weekday_weekend_usage() {
        let usage = weekday_weekend_usage(&usage_frame(), &devices(), categorize_day).unwrap();

        assert_eq!(usage[0].weekday, Some(15.0));
        assert_eq!(usage[0].weekend, None);
        assert_eq!(usage[1].weekday, Some(1.5));
        assert_eq!(usage[1].weekend, Some(6.0));
    }

    #[test]
    fn test_weekday_weekend_usage_custom_categorization() {
        let everything_weekend = |_: u32| Some(DayType::Weekend);
        let usage = weekday_weekend_usage(&usage_frame(), &devices(), everything_weekend).unwrap();

        assert_eq!(usage[1].weekday, None);
        assert_eq!(usage[1].weekend, Some(3.0));
    }

    #[test]
    fn test_scatter_points_drops_incomplete_rows() {
        let points = scatter_points(&usage_frame(), "temp", "19").unwrap();
        assert_eq!(points, vec![(-5.0, 10.0), (0.0, 20.0)]);
    }

    // ==================== bin_statistics Tests ====================

    fn binned_frame(xs: &[f64], ys: &[f64]) -> Frame {
        let times = (0..xs.len()).map(|i| monday_at(i as i64)).collect();
        Frame::from_parts(
            "time",
            times,
            vec![
                Column::complete("x", xs.iter().copied()),
                Column::complete("y", ys.iter().copied()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bin_statistics_equal_width() {
        let frame = binned_frame(&[0.0, 1.0, 2.0, 3.0, 4.0], &[10.0, 20.0, 30.0, 40.0, 50.0]);
        let bins = bin_statistics(&frame, "x", "y", 2).unwrap();

        assert_eq!(bins.len(), 2);
        assert_relative_eq!(bins[0].left, 0.0);
        assert_relative_eq!(bins[0].right, 2.0);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[0].mean, Some(15.0));
        // Max lands in the last bin
        assert_eq!(bins[1].count, 3);
        assert_eq!(bins[1].mean, Some(40.0));
        assert_relative_eq!(bins[1].std.unwrap(), 10.0);
    }

    #[test]
    fn test_bin_statistics_keeps_empty_bins() {
        let frame = binned_frame(&[0.0, 0.1, 10.0], &[1.0, 1.0, 5.0]);
        let bins = bin_statistics(&frame, "x", "y", 4).unwrap();

        assert_eq!(bins.len(), 4);
        assert_eq!(bins[1].count, 0);
        assert_eq!(bins[1].mean, None);
        assert_eq!(bins[1].std, None);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_bin_statistics_single_sample_has_no_std() {
        let frame = binned_frame(&[0.0, 10.0], &[1.0, 2.0]);
        let bins = bin_statistics(&frame, "x", "y", 2).unwrap();
        assert!(bins.iter().all(|b| b.count == 1 && b.std.is_none()));
    }

    #[test]
    fn test_bin_statistics_constant_column() {
        let frame = binned_frame(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]);
        let bins = bin_statistics(&frame, "x", "y", 5).unwrap();

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[0].mean, Some(2.0));
    }

    #[test]
    fn test_bin_statistics_zero_bins_is_error() {
        let frame = binned_frame(&[1.0], &[1.0]);
        assert!(matches!(
            bin_statistics(&frame, "x", "y", 0),
            Err(DataError::InvalidBinCount)
        ));
    }

    #[test]
    fn test_bin_statistics_no_data() {
        let frame = binned_frame(&[], &[]);
        assert!(bin_statistics(&frame, "x", "y", 3).unwrap().is_empty());
    }

    // ==================== Property-Based Tests ====================

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn categorize_day_covers_week(day in 0u32..100) {
                let category = categorize_day(day);
                prop_assert_eq!(category.is_some(), day <= 6);
                if day <= 4 {
                    prop_assert_eq!(category, Some(DayType::Weekday));
                }
            }

            #[test]
            fn single_bin_summarizes_whole_column(
                points in prop::collection::vec((-30.0f64..30.0, 0.0f64..120.0), 1..50)
            ) {
                let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
                let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
                let bins = bin_statistics(&binned_frame(&xs, &ys), "x", "y", 1).unwrap();

                prop_assert_eq!(bins.len(), 1);
                let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
                let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                prop_assert_eq!(bins[0].left, min);
                prop_assert_eq!(bins[0].right, max);
                prop_assert_eq!(bins[0].count, ys.len());
                let expected = ys.iter().sum::<f64>() / ys.len() as f64;
                prop_assert!((bins[0].mean.unwrap() - expected).abs() < 1e-9);
            }

            #[test]
            fn bins_account_for_every_point(
                xs in prop::collection::vec(-100.0f64..100.0, 1..80),
                num_bins in 1usize..30
            ) {
                let ys = vec![1.0; xs.len()];
                let bins = bin_statistics(&binned_frame(&xs, &ys), "x", "y", num_bins).unwrap();
                prop_assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), xs.len());
            }
        }
    }
}
