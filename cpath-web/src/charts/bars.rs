//! Per-stage bar charts and the career-length histogram

use plotters::prelude::*;
use std::collections::BTreeMap;

use super::{format_value, Chart, ChartError, ChartOptions, Scale, CHART_HEIGHT, CHART_WIDTH};
use crate::db::Snapshot;
use crate::vocab::Stage;

const BAR_COLOR: RGBColor = RGBColor(0, 102, 204);

/// Log-axis headroom below the smallest bar, in decades (about log10 2)
const LOG_FLOOR_MARGIN: f64 = 0.3;

/// Labels and values ready to plot, in display order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl BarSeries {
    fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Years spent per stage
pub fn render_stage_years(snapshot: &Snapshot, options: &ChartOptions) -> Result<Chart, ChartError> {
    let (title, y_desc) = match options.scale {
        Scale::Total => ("Total years per stage", "Years"),
        Scale::Mean => ("Mean years per stage", "Years per stint"),
        Scale::Share => ("Share of all years per stage", "% of years"),
    };
    let series = stage_years_series(snapshot, options);
    render_bar_chart(title, y_desc, &series, options.log)
}

/// Where careers currently end
pub fn render_last_stage(snapshot: &Snapshot, options: &ChartOptions) -> Result<Chart, ChartError> {
    let (title, y_desc) = match options.scale {
        Scale::Share => ("Share of careers by last stage", "% of careers"),
        Scale::Total | Scale::Mean => ("Careers by last stage", "Careers"),
    };
    let series = last_stage_series(snapshot, options);
    render_bar_chart(title, y_desc, &series, options.log)
}

/// Histogram of total career length
pub fn render_career_length(
    snapshot: &Snapshot,
    options: &ChartOptions,
    bucket_width: u32,
) -> Result<Chart, ChartError> {
    let (title, y_desc) = match options.scale {
        Scale::Share => ("Career length distribution", "% of careers"),
        Scale::Total | Scale::Mean => ("Career length distribution", "Careers"),
    };
    let series = career_length_series(snapshot, options, bucket_width);
    render_bar_chart(title, y_desc, &series, options.log)
}

pub fn stage_years_series(snapshot: &Snapshot, options: &ChartOptions) -> BarSeries {
    let kept = kept_stages(&snapshot.stage_years, options);

    let values: Vec<(Stage, f64)> = match options.scale {
        Scale::Total => kept,
        Scale::Mean => kept
            .into_iter()
            .filter_map(|(stage, years)| {
                let visits = snapshot
                    .stage_timed_visits
                    .get(&stage)
                    .copied()
                    .unwrap_or(0.0);
                (visits > 0.0).then(|| (stage, years / visits))
            })
            .collect(),
        Scale::Share => as_percentages(kept),
    };

    sorted_series(values)
}

pub fn last_stage_series(snapshot: &Snapshot, options: &ChartOptions) -> BarSeries {
    let kept = kept_stages(&snapshot.last_stage, options);
    let values = match options.scale {
        Scale::Share => as_percentages(kept),
        Scale::Total | Scale::Mean => kept,
    };
    sorted_series(values)
}

/// Buckets in ascending order, labelled `lo-hi`
pub fn career_length_series(snapshot: &Snapshot, options: &ChartOptions, bucket_width: u32) -> BarSeries {
    let total: f64 = snapshot.career_length.values().filter(|v| **v > 0.0).sum();

    let mut series = BarSeries::default();
    for (&bucket, &count) in &snapshot.career_length {
        if count <= 0.0 {
            continue;
        }
        let value = match options.scale {
            Scale::Share => count / total * 100.0,
            Scale::Total | Scale::Mean => count,
        };
        series.push(bucket_label(bucket, bucket_width), value);
    }
    series
}

fn bucket_label(lower: u32, width: u32) -> String {
    if width <= 1 {
        lower.to_string()
    } else {
        format!("{}-{}", lower, lower.saturating_add(width - 1))
    }
}

/// Stage values with dropped and non-positive entries removed
fn kept_stages(map: &BTreeMap<Stage, f64>, options: &ChartOptions) -> Vec<(Stage, f64)> {
    map.iter()
        .filter(|(stage, value)| **value > 0.0 && !options.drop.contains(*stage))
        .map(|(&stage, &value)| (stage, value))
        .collect()
}

fn as_percentages(values: Vec<(Stage, f64)>) -> Vec<(Stage, f64)> {
    let total: f64 = values.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    values
        .into_iter()
        .map(|(stage, v)| (stage, v / total * 100.0))
        .collect()
}

/// Descending by value, ties in canonical stage order
fn sorted_series(mut values: Vec<(Stage, f64)>) -> BarSeries {
    values.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut series = BarSeries::default();
    for (stage, value) in values {
        series.push(stage.as_str(), value);
    }
    series
}

/// Bar chart over categorical labels
///
/// With `log` set, bars are drawn as log10 of the value from a floor below
/// the smallest bar, so values of 1 or less stay visible, and the axis
/// labels show the original magnitudes.
fn render_bar_chart(title: &str, y_desc: &str, series: &BarSeries, log: bool) -> Result<Chart, ChartError> {
    if series.is_empty() {
        return placeholder(title);
    }

    let heights: Vec<f64> = if log {
        series.values.iter().map(|v| v.max(f64::MIN_POSITIVE).log10()).collect()
    } else {
        series.values.clone()
    };
    let max_height = heights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = if log {
        let min_height = heights.iter().copied().fold(f64::INFINITY, f64::min);
        let floor = (min_height - LOG_FLOOR_MARGIN).min(-LOG_FLOOR_MARGIN);
        (floor, (max_height + 0.1).max(1.0))
    } else {
        (0.0, (max_height * 1.1).max(f64::MIN_POSITIVE))
    };

    let n = series.labels.len();
    let x_label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => series.labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    let y_label = |y: &f64| {
        if log {
            format_value(10f64.powf(*y))
        } else {
            format_value(*y)
        }
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(90)
            .y_label_area_size(60)
            .build_cartesian_2d((0..n).into_segmented(), y_min..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&x_label)
            .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
            .y_label_formatter(&y_label)
            .y_desc(y_desc)
            .draw()?;

        chart.draw_series(heights.iter().enumerate().map(|(i, &h)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), y_min), (SegmentValue::Exact(i + 1), h)],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 4, 4);
            bar
        }))?;

        root.present()?;
    }

    Ok(Chart {
        title: title.to_string(),
        svg,
    })
}

/// Titled empty chart shown before any data exists
pub(crate) fn placeholder(title: &str) -> Result<Chart, ChartError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let body = root.titled(title, ("sans-serif", 24))?;
        let (w, h) = body.dim_in_pixel();
        body.draw(&Text::new(
            "No data yet",
            (w as i32 / 2 - 45, h as i32 / 2),
            ("sans-serif", 18).into_font().color(&BLACK),
        ))?;
        root.present()?;
    }

    Ok(Chart {
        title: title.to_string(),
        svg,
    })
}
