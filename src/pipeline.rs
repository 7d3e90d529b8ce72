//! Pipeline drivers.
//!
//! The chart pipeline runs the fixed chart steps in order, reports one line per
//! step, and exports every collected result to a single workbook. The checks
//! driver prints the built-in check queries as console tables.

use std::io::Write;

use tracing::{info, warn};

use crate::config::OutputConfig;
use crate::error::Result;
use crate::query::QueryExecutor;
use crate::report::interactive::TimeSliderDefinition;
use crate::report::{
    export_workbook, render_chart, render_table, render_time_slider, ChartDefinition, ChartKind,
    ExportSummary, ExportWorkbook, ReportOutput, TableStyle,
};

/// Default name of the exported workbook.
pub const EXPORT_FILE_NAME: &str = "analytics_export.xlsx";

/// The six static charts, in pipeline order.
pub fn default_chart_steps() -> Vec<ChartDefinition> {
    vec![
        ChartDefinition {
            sequence: 1,
            query: "pie_revenue_by_category",
            label: "Pie",
            kind_name: "Pie",
            meaning: "Delivered revenue share by category",
            title: "Revenue share by product category (delivered, top-10+Other)",
            x_desc: "",
            y_desc: "",
            date_columns: &[],
            kind: ChartKind::Pie {
                category: "category",
                value: "revenue",
            },
        },
        ChartDefinition {
            sequence: 2,
            query: "bar_top_sellers_by_revenue",
            label: "Bar",
            kind_name: "Bar",
            meaning: "Top sellers by revenue",
            title: "Top 10 sellers by delivered revenue",
            x_desc: "Seller (ID abridged)",
            y_desc: "Revenue",
            date_columns: &[],
            kind: ChartKind::Bar {
                label: "seller_id",
                value: "revenue",
            },
        },
        ChartDefinition {
            sequence: 3,
            query: "barh_avg_review_by_category",
            label: "BarH",
            kind_name: "BarH",
            meaning: "Avg review score by category (top-20)",
            title: "Average review by category (≥50 reviews), top-20",
            x_desc: "Average review score",
            y_desc: "Category",
            date_columns: &[],
            kind: ChartKind::RankedBar {
                category: "category",
                metric: "avg_score",
                tie_break: "n_reviews",
            },
        },
        ChartDefinition {
            sequence: 4,
            query: "line_daily_revenue",
            label: "Line",
            kind_name: "Line",
            meaning: "Daily delivered revenue (capped)",
            title: "Daily delivered revenue (99th percentile capped)",
            x_desc: "Day",
            y_desc: "Revenue",
            date_columns: &["day"],
            kind: ChartKind::Line {
                time: "day",
                value: "revenue",
                capped: "revenue_capped",
            },
        },
        ChartDefinition {
            sequence: 5,
            query: "hist_order_value",
            label: "Hist",
            kind_name: "Histogram",
            meaning: "Order value distribution (≤99th pct)",
            title: "Distribution of order value (delivered, ≤99th pct)",
            x_desc: "Order value",
            y_desc: "Count",
            date_columns: &[],
            kind: ChartKind::Histogram {
                value: "order_value",
                bins: 30,
            },
        },
        ChartDefinition {
            sequence: 6,
            query: "scatter_price_vs_review",
            label: "Scatter",
            kind_name: "Scatter",
            meaning: "Price vs. review score by product (≤99th pct)",
            title: "Avg item price vs. average review (product-level)",
            x_desc: "Average item price (≤99th pct)",
            y_desc: "Average review score",
            date_columns: &[],
            kind: ChartKind::Scatter {
                x: "avg_price",
                y: "avg_review",
            },
        },
    ]
}

/// The monthly revenue-by-country slider.
pub fn time_slider_definition() -> TimeSliderDefinition {
    TimeSliderDefinition {
        query: "timeslider_monthly_revenue_by_country",
        label: "TimeSlider",
        file_stem: "timeslider_revenue_by_country",
        title: "Monthly delivered revenue by country",
        category: "country",
        value: "revenue",
        frame: "month",
        date_columns: &["month"],
    }
}

/// Progress line printed after each step.
pub fn report_line(rows: usize, kind: &str, meaning: &str) -> String {
    format!("{rows} rows → {kind}: {meaning}")
}

/// Runs chart steps against one executor and writes into the configured directories.
pub struct ReportPipeline<'a> {
    executor: QueryExecutor<'a>,
    output: &'a OutputConfig,
}

impl<'a> ReportPipeline<'a> {
    pub fn new(executor: QueryExecutor<'a>, output: &'a OutputConfig) -> Self {
        Self { executor, output }
    }

    /// Runs `steps` in order and exports their results to `export_file`.
    ///
    /// The first failing step aborts the run; nothing is exported then.
    pub async fn run<W: Write>(
        &self,
        steps: &[ChartDefinition],
        export_file: &str,
        out: &mut W,
    ) -> Result<ExportSummary> {
        self.output.ensure_dirs()?;

        let mut workbook = ExportWorkbook::new();
        for step in steps {
            let output = self.run_step(step).await?;
            writeln!(out, "{}", report_line(output.result.len(), step.kind_name, step.meaning))?;
            workbook.insert(output.label, output.result);
        }

        let path = self.output.exports_dir.join(export_file);
        let summary = export_workbook(&workbook, &path)?;
        writeln!(out, "{}", summary.message())?;
        info!("Exported {} sheets to {}", summary.sheets, path.display());
        Ok(summary)
    }

    async fn run_step(&self, step: &ChartDefinition) -> Result<ReportOutput> {
        info!("Rendering {} ({})", step.file_name(), step.query);
        let result = self.executor.fetch(step.query, step.date_columns).await?;
        render_chart(step, result, &self.output.charts_dir)
    }

    /// Renders the interactive time slider; see [`render_time_slider`] for `show`.
    pub async fn run_time_slider<W: Write>(&self, show: bool, out: &mut W) -> Result<ReportOutput> {
        let def = time_slider_definition();
        if !show {
            std::fs::create_dir_all(&self.output.charts_dir)?;
        }

        let result = self.executor.fetch(def.query, def.date_columns).await?;
        let output = render_time_slider(&def, result, &self.output.charts_dir, show)?;
        writeln!(out, "{}", report_line(output.result.len(), def.label, def.title))?;
        Ok(output)
    }
}

/// Runs the catalog's entries (restricted to `only` when non-empty) and prints
/// each result under a `=== NAME ===` header.
///
/// Returns the number of checks run. A failing check aborts the remaining ones.
pub async fn run_checks<W: Write>(
    executor: &QueryExecutor<'_>,
    only: &[String],
    style: TableStyle,
    out: &mut W,
) -> Result<usize> {
    let catalog = executor.catalog();
    for unknown in catalog.unknown_names(only) {
        warn!("Unknown check '{unknown}', skipping");
    }

    let selected = catalog.select(only);
    for entry in &selected {
        writeln!(out, "\n=== {} ===", entry.name)?;
        let result = executor.execute(&entry.sql, &[]).await?;
        render_table(&result, style, out)?;
    }

    Ok(selected.len())
}
