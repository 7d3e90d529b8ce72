//! Interactive time-slider chart.
//!
//! Each frame (one per distinct month) is drawn as an SVG bar chart with
//! plotters and inlined into a single HTML page; a range slider picks the
//! visible frame. The y scale is fixed across frames so they stay comparable.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Stdio};

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use tracing::{debug, info};

use super::charts::{segment_label, slot_axis, CHART_FONT, SERIES_COLOR};
use super::ReportOutput;
use crate::db::{TabularResult, Value};
use crate::error::{ReportError, Result};

const FRAME_LABEL_FORMAT: &str = "%Y-%m";
const FRAME_SIZE: (u32, u32) = (900, 500);

/// Query and columns of the time-slider chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSliderDefinition {
    pub query: &'static str,
    /// Sheet label when the result is exported.
    pub label: &'static str,
    /// File stem of the HTML page.
    pub file_stem: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub value: &'static str,
    /// Timestamp column; each distinct value is one frame.
    pub frame: &'static str,
    pub date_columns: &'static [&'static str],
}

impl TimeSliderDefinition {
    pub fn file_name(&self) -> String {
        format!("{}.html", self.file_stem)
    }
}

/// One bar in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePoint {
    pub frame: usize,
    pub frame_label: String,
    pub category: String,
    pub value: f64,
}

/// Maps rows to frames numbered by ascending frame value.
///
/// Rows without a frame timestamp or a numeric value are dropped.
pub fn frame_points(def: &TimeSliderDefinition, result: &TabularResult) -> Result<(Vec<String>, Vec<FramePoint>)> {
    let frames = result.column(def.frame)?;
    let categories = result.column(def.category)?;
    let values = result.column(def.value)?;

    let distinct: BTreeSet<_> = frames.iter().filter_map(|v| v.as_timestamp()).collect();
    let ordered: Vec<_> = distinct.into_iter().collect();
    let labels: Vec<String> = ordered
        .iter()
        .map(|ts| ts.format(FRAME_LABEL_FORMAT).to_string())
        .collect();

    let points = frames
        .iter()
        .zip(categories)
        .zip(values)
        .filter_map(|((frame, category), value)| {
            let ts = frame.as_timestamp()?;
            let index = ordered.binary_search(&ts).ok()?;
            Some(FramePoint {
                frame: index,
                frame_label: labels[index].clone(),
                category: Value::to_display_string(category),
                value: value.as_f64()?,
            })
        })
        .collect();

    Ok((labels, points))
}

/// Bars of each frame, largest value first.
pub fn frame_bars(frame_count: usize, points: &[FramePoint]) -> Vec<Vec<(String, f64)>> {
    let mut frames = vec![Vec::new(); frame_count];
    for point in points {
        if let Some(bars) = frames.get_mut(point.frame) {
            bars.push((point.category.clone(), point.value));
        }
    }
    for bars in &mut frames {
        bars.sort_by(|a: &(String, f64), b| b.1.total_cmp(&a.1));
    }
    frames
}

/// Draws one frame as an SVG bar chart with a y axis fixed at `0..y_max`.
pub fn frame_svg(
    def: &TimeSliderDefinition,
    frame_label: &str,
    bars: &[(String, f64)],
    y_max: f64,
) -> anyhow::Result<String> {
    let labels: Vec<String> = bars.iter().map(|(category, _)| category.clone()).collect();
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, FRAME_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{} ({frame_label})", def.title), (CHART_FONT, 20))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(slot_axis(bars.len()).into_segmented(), 0.0..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len().max(1))
            .x_label_formatter(&|v| segment_label(v, &labels))
            .x_desc(def.category)
            .y_desc(def.value)
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                SERIES_COLOR.filled(),
            );
            bar.set_margin(0, 0, 6, 6);
            bar
        }))?;

        root.present()?;
    }
    Ok(svg)
}

/// Upper bound of the shared y axis.
fn shared_y_max(points: &[FramePoint]) -> f64 {
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

/// Builds a standalone page: every frame is inlined as SVG and a range input
/// shows one frame at a time. The page loads nothing from the network.
pub fn html_document(
    title: &str,
    slider_name: &str,
    frame_labels: &[String],
    frame_svgs: &[String],
) -> String {
    let frames: String = frame_svgs
        .iter()
        .enumerate()
        .map(|(i, svg)| {
            let hidden = if i == 0 { "" } else { " hidden" };
            format!("<div class=\"frame\"{hidden}>\n{svg}\n</div>\n")
        })
        .collect();

    // A literal "</" would end the script element early.
    let labels = serde_json::to_string(frame_labels)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/");
    let first = frame_labels.first().map(String::as_str).unwrap_or_default();

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ font-family: sans-serif; margin: 24px; }}
    #controls {{ margin-bottom: 12px; }}
    #frame {{ width: 600px; vertical-align: middle; }}
  </style>
</head>
<body>
<div id="controls">
  <label for="frame">{slider_name}</label>
  <input id="frame" type="range" min="0" max="{last}" step="1" value="0">
  <output id="frame-label" for="frame">{first}</output>
</div>
{frames}<script>
  const labels = {labels};
  const frames = document.querySelectorAll("body > .frame");
  const slider = document.getElementById("frame");
  const output = document.getElementById("frame-label");
  slider.addEventListener("input", () => {{
    const current = Number(slider.value);
    frames.forEach((frame, i) => {{ frame.hidden = i !== current; }});
    output.value = labels[current];
  }});
</script>
</body>
</html>
"##,
        title = escape_html(title),
        slider_name = escape_html(slider_name),
        last = frame_svgs.len().saturating_sub(1),
        first = escape_html(first),
    )
}

/// Renders the time slider.
///
/// Without `show` the page is written to `charts_dir`. With `show` it is written
/// to the temp directory and opened in the platform viewer.
pub fn render_time_slider(
    def: &TimeSliderDefinition,
    result: TabularResult,
    charts_dir: &Path,
    show: bool,
) -> Result<ReportOutput> {
    let (labels, points) = frame_points(def, &result)?;
    if points.is_empty() {
        return Err(ReportError::render(format!(
            "time slider '{}' has no rows with a '{}' and a numeric '{}'",
            def.query, def.frame, def.value
        )));
    }

    let y_max = shared_y_max(&points);
    let svgs = frame_bars(labels.len(), &points)
        .iter()
        .zip(&labels)
        .map(|(bars, label)| frame_svg(def, label, bars, y_max))
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(|e| ReportError::render(format!("time slider '{}': {e:#}", def.query)))?;

    let page = html_document(def.title, def.frame, &labels, &svgs);
    let dir = if show { std::env::temp_dir() } else { charts_dir.to_path_buf() };
    let path = dir.join(def.file_name());
    std::fs::write(&path, page)?;
    debug!("Wrote {} ({} frames)", path.display(), labels.len());

    if show {
        open_in_viewer(&path)?;
        info!("Opened {}", path.display());
    }

    Ok(ReportOutput {
        label: def.label.to_string(),
        artifact: Some(path),
        result,
    })
}

fn viewer_command(path: &Path) -> Command {
    #[cfg(target_os = "macos")]
    let command = {
        let mut c = Command::new("open");
        c.arg(path);
        c
    };

    #[cfg(target_os = "windows")]
    let command = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let command = {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    };

    command
}

fn open_in_viewer(path: &Path) -> Result<()> {
    viewer_command(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            ReportError::render(format!("cannot open a viewer for {}: {e}", path.display()))
        })?;
    Ok(())
}
