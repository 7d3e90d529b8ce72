//! Report rendering: charts, console tables, the interactive viewer and the
//! spreadsheet export.

pub mod cap;
pub mod charts;
pub mod console;
pub mod interactive;
pub mod spreadsheet;

use std::path::PathBuf;

use crate::db::TabularResult;

pub use charts::{render_chart, ChartDefinition, ChartKind};
pub use console::{render_table, TableStyle};
pub use interactive::{render_time_slider, TimeSliderDefinition};
pub use spreadsheet::{export_workbook, ExportSummary};

/// What a renderer produced for one pipeline step.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// Sheet label for the export.
    pub label: String,
    /// File written by the renderer, if any.
    pub artifact: Option<PathBuf>,
    /// Data to export, possibly with derived columns.
    pub result: TabularResult,
}

/// Ordered collection of labelled results destined for one workbook.
///
/// Labels are unique; adding a label again replaces its result in place.
#[derive(Debug, Clone, Default)]
pub struct ExportWorkbook {
    sheets: Vec<(String, TabularResult)>,
}

impl ExportWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, result: TabularResult) {
        let label = label.into();
        match self.sheets.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = result,
            None => self.sheets.push((label, result)),
        }
    }

    pub fn sheets(&self) -> &[(String, TabularResult)] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Total data rows across all sheets.
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|(_, r)| r.len()).sum()
    }
}
