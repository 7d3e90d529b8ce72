//! Static chart renderers.
//!
//! Each chart turns one `TabularResult` into a PNG under the charts directory.
//! Data shaping (sorting, capping, binning, slice geometry) lives in small
//! pure functions so it can be checked without decoding images; the drawing
//! itself goes through plotters.

use std::f64::consts::PI;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

use super::cap::{cap_by_percentile, cap_numeric, DISPLAY_PERCENTILE};
use super::ReportOutput;
use crate::db::{TabularResult, Value};
use crate::error::{ReportError, Result};

pub(super) const CHART_FONT: &str = "sans-serif";

/// Matplotlib's default blue, used for single-series charts.
pub(super) const SERIES_COLOR: RGBColor = RGBColor(31, 119, 180);

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Identifiers longer than this are shortened on bar labels.
const LABEL_ABBREVIATION_THRESHOLD: usize = 10;

/// What a chart draws and which columns it reads.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    /// Share of a total per category.
    Pie {
        category: &'static str,
        value: &'static str,
    },
    /// Vertical bars in received order, with abbreviated identifiers.
    Bar {
        label: &'static str,
        value: &'static str,
    },
    /// Horizontal bars sorted by `metric` then `tie_break`, best on top.
    RankedBar {
        category: &'static str,
        metric: &'static str,
        tie_break: &'static str,
    },
    /// Value over calendar time, capped for display into `capped` (a derived column).
    Line {
        time: &'static str,
        value: &'static str,
        capped: &'static str,
    },
    /// Distribution of one numeric column in equal-width bins.
    Histogram { value: &'static str, bins: usize },
    /// Point cloud of two numeric columns; `x` is capped for display only.
    Scatter { x: &'static str, y: &'static str },
}

/// One step of the chart pipeline: the query to run and how to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDefinition {
    /// Two-digit prefix of the output file.
    pub sequence: u8,
    /// Catalog query name, also used as the file stem.
    pub query: &'static str,
    /// Sheet label in the export workbook.
    pub label: &'static str,
    /// Chart type shown in the progress line.
    pub kind_name: &'static str,
    /// What the chart shows, for the progress line.
    pub meaning: &'static str,
    pub title: &'static str,
    pub x_desc: &'static str,
    pub y_desc: &'static str,
    /// Result columns to read as timestamps.
    pub date_columns: &'static [&'static str],
    pub kind: ChartKind,
}

impl ChartDefinition {
    /// File name of the rendered image, e.g. `04_line_daily_revenue.png`.
    pub fn file_name(&self) -> String {
        format!("{:02}_{}.png", self.sequence, self.query)
    }
}

/// Renders `result` according to `def` into `charts_dir`.
///
/// The returned output carries the result to export: unchanged for most
/// charts, sorted for ranked bars, and extended with the capped column for
/// line charts.
pub fn render_chart(
    def: &ChartDefinition,
    result: TabularResult,
    charts_dir: &Path,
) -> Result<ReportOutput> {
    if result.is_empty() {
        return Err(ReportError::render(format!(
            "{} chart '{}' needs at least one row",
            def.kind_name, def.query
        )));
    }

    let path = chart_path(def, charts_dir);
    let to_render_error =
        |e: anyhow::Error| ReportError::render(format!("{}: {e:#}", path.display()));

    let result = match &def.kind {
        ChartKind::Pie { category, value } => {
            let labels = display_strings(&result, category)?;
            let values = numbers(&result, value)?;
            let slices = pie_slices(labels, &values)?;
            draw_pie(&path, def, &slices).map_err(to_render_error)?;
            result
        }
        ChartKind::Bar { label, value } => {
            let labels: Vec<String> = display_strings(&result, label)?
                .iter()
                .map(|l| abbreviate_label(l))
                .collect();
            let values: Vec<f64> = numbers(&result, value)?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            draw_vertical_bars(&path, def, &labels, &values).map_err(to_render_error)?;
            result
        }
        ChartKind::RankedBar {
            category,
            metric,
            tie_break,
        } => {
            let order = ranked_order(&numbers(&result, metric)?, &numbers(&result, tie_break)?);
            let sorted = result.reordered(&order);
            let bars = RankedBars {
                labels: display_strings(&sorted, category)?,
                scores: numbers(&sorted, metric)?,
                counts: numbers(&sorted, tie_break)?,
            };
            draw_ranked_bars(&path, def, &bars).map_err(to_render_error)?;
            sorted
        }
        ChartKind::Line {
            time,
            value,
            capped,
        } => {
            let capped_values = cap_by_percentile(&result.column(value)?, DISPLAY_PERCENTILE);
            let points: Vec<(f64, f64)> = result
                .column(time)?
                .into_iter()
                .zip(&capped_values)
                .filter_map(|(t, v)| Some((day_number(t)?, (*v)?)))
                .collect();
            if points.is_empty() {
                return Err(ReportError::render(format!(
                    "line chart '{}' has no rows with both '{time}' and '{value}'",
                    def.query
                )));
            }
            draw_line(&path, def, &points).map_err(to_render_error)?;

            let derived = capped_values.into_iter().map(Value::from).collect();
            result.with_column(capped, derived)?
        }
        ChartKind::Histogram { value, bins } => {
            let present: Vec<Option<f64>> =
                numbers(&result, value)?.into_iter().flatten().map(Some).collect();
            let capped: Vec<f64> = cap_numeric(present, DISPLAY_PERCENTILE)
                .into_iter()
                .flatten()
                .collect();
            let bins = histogram_bins(&capped, *bins);
            if bins.is_empty() {
                return Err(ReportError::render(format!(
                    "histogram '{}' has no numeric values in '{value}'",
                    def.query
                )));
            }
            draw_histogram(&path, def, &bins).map_err(to_render_error)?;
            result
        }
        ChartKind::Scatter { x, y } => {
            let xs = cap_by_percentile(&result.column(x)?, DISPLAY_PERCENTILE);
            let ys = numbers(&result, y)?;
            let points: Vec<(f64, f64)> = xs
                .into_iter()
                .zip(ys)
                .filter_map(|(x, y)| Some((x?, y?)))
                .collect();
            if points.is_empty() {
                return Err(ReportError::render(format!(
                    "scatter chart '{}' has no rows with both '{x}' and '{y}'",
                    def.query
                )));
            }
            draw_scatter(&path, def, &points).map_err(to_render_error)?;
            result
        }
    };

    debug!("Wrote {}", path.display());

    Ok(ReportOutput {
        label: def.label.to_string(),
        artifact: Some(path),
        result,
    })
}

fn display_strings(result: &TabularResult, column: &str) -> Result<Vec<String>> {
    Ok(result
        .column(column)?
        .into_iter()
        .map(Value::to_display_string)
        .collect())
}

fn numbers(result: &TabularResult, column: &str) -> Result<Vec<Option<f64>>> {
    Ok(result
        .column(column)?
        .into_iter()
        .map(Value::as_f64)
        .collect())
}

/// Days since the Unix epoch, for plotting timestamps on a linear axis.
fn day_number(value: &Value) -> Option<f64> {
    value
        .as_timestamp()
        .map(|ts| ts.and_utc().timestamp() as f64 / SECONDS_PER_DAY)
}

fn format_day(day: f64) -> String {
    DateTime::from_timestamp((day * SECONDS_PER_DAY).round() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Shortens long identifiers to `first 6 chars + "…" + last 4 chars`.
///
/// The result is decorative only; two identifiers may shorten to the same label.
pub fn abbreviate_label(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= LABEL_ABBREVIATION_THRESHOLD {
        return id.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// One pie slice with its share of the total and its angular extent.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    /// Share of the total, in percent.
    pub percent: f64,
    /// Radians, measured clockwise from 12 o'clock on screen.
    pub start_angle: f64,
    pub end_angle: f64,
}

/// Computes pie slices in received order.
///
/// Missing and negative values count as zero. Fails if nothing is left to draw.
pub fn pie_slices(labels: Vec<String>, values: &[Option<f64>]) -> Result<Vec<PieSlice>> {
    let values: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0).max(0.0)).collect();
    let total: f64 = values.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return Err(ReportError::render("pie chart needs a positive total"));
    }

    let mut angle = -PI / 2.0;
    Ok(labels
        .into_iter()
        .zip(values)
        .map(|(label, value)| {
            let fraction = value / total;
            let start_angle = angle;
            angle += fraction * 2.0 * PI;
            PieSlice {
                label,
                value,
                percent: fraction * 100.0,
                start_angle,
                end_angle: angle,
            }
        })
        .collect())
}

/// Row order for a ranked chart: `primary` descending, then `secondary`
/// descending. Missing values sort last; ties keep their received order.
pub fn ranked_order(primary: &[Option<f64>], secondary: &[Option<f64>]) -> Vec<usize> {
    let key = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();
    let mut order: Vec<usize> = (0..primary.len()).collect();
    order.sort_by(|&a, &b| {
        descending(key(primary, a), key(primary, b))
            .then_with(|| descending(key(secondary, a), key(secondary, b)))
    });
    order
}

fn descending(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One histogram bucket, `[start, end)` except the last which includes `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Buckets `values` into `bins` equal-width bins spanning their range.
///
/// A single distinct value produces one unit-wide bin holding every value.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for v in finite {
        let index = (((v - min) / width).floor() as usize).min(bins - 1);
        out[index].count += 1;
    }

    out
}

/// Axis range covering `values`, always including zero, with headroom on top.
fn value_axis(values: impl IntoIterator<Item = f64>, headroom: f64) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if max == min {
        return min..min + 1.0;
    }
    min..max * headroom
}

/// Axis range spanning `values` with a margin on both sides.
fn span_axis(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let margin = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - margin)..(max + margin)
}

/// Discrete axis with one segment per bar.
///
/// plotters treats an integer range as inclusive and segments it into
/// `end - start + 1` slots, so `count` bars need `0..count - 1`. A single bar
/// keeps two slots because a one-point range collapses to zero width.
pub(super) fn slot_axis(count: usize) -> Range<i32> {
    0..(count as i32 - 1).max(1)
}

pub(super) fn segment_label(value: &SegmentValue<i32>, labels: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .cloned()
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Slice label, e.g. `"health_beauty (12.3%)"`.
fn slice_caption(slice: &PieSlice) -> String {
    format!("{} ({:.1}%)", slice.label, slice.percent)
}

fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 + (radius * angle.sin()).round() as i32,
    )
}

fn draw_pie(path: &Path, def: &ChartDefinition, slices: &[PieSlice]) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, (900, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(def.title, (CHART_FONT, 22))?;

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.33;
    let centered = Pos::new(HPos::Center, VPos::Center);

    for (i, slice) in slices.iter().enumerate() {
        let sweep = slice.end_angle - slice.start_angle;
        let steps = ((sweep.to_degrees()).ceil() as usize).max(1);
        let mut outline = vec![center];
        outline.extend((0..=steps).map(|s| {
            polar(
                center,
                radius,
                slice.start_angle + sweep * s as f64 / steps as f64,
            )
        }));
        root.draw(&Polygon::new(outline, Palette99::pick(i).filled()))?;

        let middle = (slice.start_angle + slice.end_angle) / 2.0;
        root.draw(&Text::new(
            slice_caption(slice),
            polar(center, radius * 1.18, middle),
            TextStyle::from((CHART_FONT, 14).into_font()).pos(centered),
        ))?;
    }

    root.present()?;
    Ok(())
}

fn draw_vertical_bars(
    path: &Path,
    def: &ChartDefinition,
    labels: &[String],
    values: &[f64],
) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, (1100, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(def.title, (CHART_FONT, 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(slot_axis(values.len()).into_segmented(), value_axis(values.iter().copied(), 1.05))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(values.len())
        .x_label_formatter(&|v| segment_label(v, labels))
        .x_desc(def.x_desc)
        .y_desc(def.y_desc)
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
            SERIES_COLOR.filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;

    root.present()?;
    Ok(())
}

struct RankedBars {
    labels: Vec<String>,
    scores: Vec<Option<f64>>,
    counts: Vec<Option<f64>>,
}

fn draw_ranked_bars(path: &Path, def: &ChartDefinition, bars: &RankedBars) -> anyhow::Result<()> {
    let rows = bars.labels.len();
    let height = (rows as u32 * 45 + 160).max(400);
    let root = BitMapBackend::new(path, (1000, height)).into_drawing_area();
    root.fill(&WHITE)?;

    // Rank 0 sits in the top segment.
    let position = |rank: usize| (rows - 1 - rank) as i32;
    let label_for = |pos: usize| bars.labels.get(rows - 1 - pos).cloned().unwrap_or_default();
    let scores: Vec<f64> = bars.scores.iter().map(|s| s.unwrap_or(0.0)).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(def.title, (CHART_FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(220)
        .build_cartesian_2d(
            value_axis(scores.iter().copied(), 1.2),
            slot_axis(rows).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(rows)
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(pos) if *pos >= 0 && (*pos as usize) < rows => {
                label_for(*pos as usize)
            }
            _ => String::new(),
        })
        .x_desc(def.x_desc)
        .y_desc(def.y_desc)
        .draw()?;

    chart.draw_series(scores.iter().enumerate().map(|(rank, &score)| {
        let pos = position(rank);
        let mut bar = Rectangle::new(
            [(0.0, SegmentValue::Exact(pos)), (score, SegmentValue::Exact(pos + 1))],
            SERIES_COLOR.filled(),
        );
        bar.set_margin(5, 5, 0, 0);
        bar
    }))?;

    let annotation = TextStyle::from((CHART_FONT, 12).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
    chart.draw_series(scores.iter().enumerate().map(|(rank, &score)| {
        let count = bars.counts[rank].map(|n| n.round() as i64).unwrap_or(0);
        Text::new(
            format!("  {score:.2} ({count})"),
            (score, SegmentValue::CenterOf(position(rank))),
            annotation.clone(),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn draw_line(path: &Path, def: &ChartDefinition, points: &[(f64, f64)]) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, (1100, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(def.title, (CHART_FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(
            span_axis(points.iter().map(|p| p.0)),
            value_axis(points.iter().map(|p| p.1), 1.05),
        )?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|day| format_day(*day))
        .x_desc(def.x_desc)
        .y_desc(def.y_desc)
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), SERIES_COLOR.stroke_width(1)))?;
    chart.draw_series(
        points
            .iter()
            .map(|&point| Circle::new(point, 3, SERIES_COLOR.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn draw_histogram(path: &Path, def: &ChartDefinition, bins: &[HistogramBin]) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_range = bins.first().map(|b| b.start).unwrap_or(0.0)..bins.last().map(|b| b.end).unwrap_or(1.0);
    let mut chart = ChartBuilder::on(&root)
        .caption(def.title, (CHART_FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, value_axis(bins.iter().map(|b| b.count as f64), 1.05))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(def.x_desc)
        .y_desc(def.y_desc)
        .draw()?;

    chart.draw_series(bins.iter().map(|bin| {
        let mut bar = Rectangle::new(
            [(bin.start, 0.0), (bin.end, bin.count as f64)],
            SERIES_COLOR.filled(),
        );
        bar.set_margin(0, 0, 1, 1);
        bar
    }))?;

    root.present()?;
    Ok(())
}

fn draw_scatter(path: &Path, def: &ChartDefinition, points: &[(f64, f64)]) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(def.title, (CHART_FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(
            span_axis(points.iter().map(|p| p.0)),
            span_axis(points.iter().map(|p| p.1)),
        )?;

    chart
        .configure_mesh()
        .x_desc(def.x_desc)
        .y_desc(def.y_desc)
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&point| Circle::new(point, 4, SERIES_COLOR.mix(0.7).filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Path of a chart image for `def` under `charts_dir`.
pub fn chart_path(def: &ChartDefinition, charts_dir: &Path) -> PathBuf {
    charts_dir.join(def.file_name())
}
