//! Shared plotters drawing routines and text font setup.

use std::error::Error;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use crate::analysis::BinStats;

pub(crate) type DrawResult = Result<(), Box<dyn Error>>;

const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const SERIES_COLORS: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

static TEXT_FONT: OnceLock<bool> = OnceLock::new();

/// Register a TrueType font for chart text, once per process.
///
/// Returns false when no font could be loaded; charts then skip all text.
pub(crate) fn text_enabled(font_path: Option<&Path>) -> bool {
    *TEXT_FONT.get_or_init(|| register_text_font(font_path))
}

fn register_text_font(font_path: Option<&Path>) -> bool {
    let candidates = font_path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // plotters keeps registered fonts for the life of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                tracing::debug!("Chart font: {}", path.display());
                return true;
            }
            Err(_) => tracing::warn!("Ignoring font {}: invalid font data", path.display()),
        }
    }

    tracing::warn!("No TrueType font found, charts are rendered without titles or labels");
    false
}

/// Where and how large a chart is drawn.
pub(crate) struct Canvas<'a> {
    pub path: &'a Path,
    pub size: (u32, u32),
    pub text: bool,
}

pub(crate) struct Labels<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

/// One bar per category, or missing.
pub(crate) struct BarSeries {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

fn chart_builder<'a, 'b, DB: DrawingBackend>(
    root: &'a DrawingArea<DB, Shift>,
    canvas: &Canvas,
    labels: &Labels,
) -> ChartBuilder<'a, 'b, DB> {
    let mut builder = ChartBuilder::on(root);
    builder.margin(15);
    if canvas.text {
        builder
            .caption(labels.title, (FONT_FAMILY, 26))
            .x_label_area_size(45)
            .y_label_area_size(60);
    }
    builder
}

fn padded(lo: f64, hi: f64) -> Range<f64> {
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Bars grouped by category, one colour per series.
pub(crate) fn grouped_bars(
    canvas: &Canvas,
    labels: &Labels,
    categories: &[String],
    series: &[BarSeries],
) -> DrawResult {
    let root = BitMapBackend::new(canvas.path, canvas.size).into_drawing_area();
    root.fill(&WHITE)?;

    let top = series
        .iter()
        .flat_map(|s| s.values.iter().flatten())
        .fold(0.0f64, |acc, v| acc.max(*v));
    let top = if top > 0.0 { top * 1.1 } else { 1.0 };
    let x_range = -0.5..(categories.len() as f64 - 0.5);

    let mut chart = chart_builder(&root, canvas, labels).build_cartesian_2d(x_range, 0.0..top)?;

    let category_label = |x: &f64| {
        let index = x.round();
        if (x - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        categories.get(index as usize).cloned().unwrap_or_default()
    };
    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh();
    if canvas.text {
        mesh.x_labels(categories.len())
            .x_label_formatter(&category_label)
            .x_desc(labels.x_desc)
            .y_desc(labels.y_desc);
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    let group_width = 0.8;
    let bar_width = group_width / series.len().max(1) as f64;
    for (j, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[j % SERIES_COLORS.len()];
        let bars = s.values.iter().enumerate().filter_map(|(i, v)| {
            let v = (*v)?;
            let x0 = i as f64 - group_width / 2.0 + j as f64 * bar_width;
            Some(Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], color.filled()))
        });
        chart
            .draw_series(bars)?
            .label(s.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    if canvas.text && series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Scatter plot; with `log_x`, points with non-positive x are left out.
pub(crate) fn scatter(canvas: &Canvas, labels: &Labels, points: &[(f64, f64)], log_x: bool) -> DrawResult {
    let root = BitMapBackend::new(canvas.path, canvas.size).into_drawing_area();
    root.fill(&WHITE)?;

    let style = SERIES_COLORS[0].mix(0.5).filled();
    let (y_lo, y_hi) = bounds(points.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));

    if log_x {
        let placeable: Vec<(f64, f64)> = points.iter().copied().filter(|p| p.0 > 0.0).collect();
        let (x_lo, x_hi) = bounds(placeable.iter().map(|p| p.0)).unwrap_or((0.1, 1.0));
        let x_range = if x_hi > x_lo { x_lo..x_hi } else { (x_lo / 2.0)..(x_hi * 2.0) };

        let mut chart = chart_builder(&root, canvas, labels)
            .build_cartesian_2d(x_range.log_scale(), padded(y_lo, y_hi))?;
        let mut mesh = chart.configure_mesh();
        if canvas.text {
            mesh.x_desc(labels.x_desc).y_desc(labels.y_desc);
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw()?;
        chart.draw_series(placeable.iter().map(|p| Circle::new(*p, 3, style)))?;
    } else {
        let (x_lo, x_hi) = bounds(points.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));

        let mut chart = chart_builder(&root, canvas, labels)
            .build_cartesian_2d(padded(x_lo, x_hi), padded(y_lo, y_hi))?;
        let mut mesh = chart.configure_mesh();
        if canvas.text {
            mesh.x_desc(labels.x_desc).y_desc(labels.y_desc);
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw()?;
        chart.draw_series(points.iter().map(|p| Circle::new(*p, 3, style)))?;
    }

    root.present()?;
    Ok(())
}

/// Bin means joined by a line, with one standard deviation error bars.
pub(crate) fn binned_means(canvas: &Canvas, labels: &Labels, bins: &[BinStats]) -> DrawResult {
    let root = BitMapBackend::new(canvas.path, canvas.size).into_drawing_area();
    root.fill(&WHITE)?;

    // (center, mean, std) of the non-empty bins
    let means: Vec<(f64, f64, f64)> = bins
        .iter()
        .filter_map(|b| Some((b.center(), b.mean?, b.std.unwrap_or(0.0))))
        .collect();

    let (x_lo, x_hi) = bounds(bins.iter().flat_map(|b| [b.left, b.right])).unwrap_or((0.0, 1.0));
    let (y_lo, y_hi) = bounds(means.iter().flat_map(|(_, m, s)| [m - s, m + s])).unwrap_or((0.0, 1.0));

    let mut chart = chart_builder(&root, canvas, labels)
        .build_cartesian_2d(padded(x_lo, x_hi), padded(y_lo, y_hi))?;
    let mut mesh = chart.configure_mesh();
    if canvas.text {
        mesh.x_desc(labels.x_desc).y_desc(labels.y_desc);
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    let color = SERIES_COLORS[0];
    chart.draw_series(means.iter().map(|(x, m, s)| {
        ErrorBar::new_vertical(*x, m - s, *m, m + s, color.filled(), 8)
    }))?;
    chart.draw_series(LineSeries::new(means.iter().map(|(x, m, _)| (*x, *m)), color))?;

    root.present()?;
    Ok(())
}
