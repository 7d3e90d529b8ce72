//! Spreadsheet export.
//!
//! Writes every collected result to its own sheet of one `.xlsx` workbook.
//! Each sheet gets frozen header and first column, an autofilter over the used
//! range, and a red-yellow-green colour scale on its numeric columns.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, ConditionalFormat3ColorScale, Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use super::ExportWorkbook;
use crate::db::{TabularResult, Value};
use crate::error::{ReportError, Result};

/// Rows inspected when deciding whether a column is numeric.
pub const NUMERIC_SAMPLE_ROWS: usize = 40;

/// Numeric cells needed within the sample for a column to get a colour scale.
pub const NUMERIC_MIN_CELLS: usize = 3;

const SCALE_MIN_COLOR: u32 = 0xAA0000;
const SCALE_MID_COLOR: u32 = 0xFFFF00;
const SCALE_MAX_COLOR: u32 = 0x00AA00;

const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub sheets: usize,
    pub rows: usize,
}

impl ExportSummary {
    /// Completion line, e.g. `Created file analytics_export.xlsx, 6 sheets, 1234 rows`.
    pub fn message(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        format!("Created file {name}, {} sheets, {} rows", self.sheets, self.rows)
    }
}

/// Indices of the columns that get a colour scale.
///
/// A column qualifies when at least [`NUMERIC_MIN_CELLS`] of its first
/// [`NUMERIC_SAMPLE_ROWS`] data cells hold numbers.
pub fn numeric_columns(result: &TabularResult) -> Vec<usize> {
    (0..result.columns().len())
        .filter(|&col| {
            result
                .rows()
                .iter()
                .take(NUMERIC_SAMPLE_ROWS)
                .filter(|row| row.get(col).is_some_and(Value::is_numeric))
                .count()
                >= NUMERIC_MIN_CELLS
        })
        .collect()
}

/// Writes `workbook` to `path`, one sheet per label in insertion order.
pub fn export_workbook(workbook: &ExportWorkbook, path: &Path) -> Result<ExportSummary> {
    let mut book = Workbook::new();
    let datetime = Format::new().set_num_format(DATETIME_NUM_FORMAT);

    for (label, result) in workbook.sheets() {
        let sheet = book.add_worksheet();
        sheet
            .set_name(label)
            .map_err(|e| ReportError::export(format!("invalid sheet name '{label}': {e}")))?;
        write_sheet(sheet, result, &datetime)
            .map_err(|e| ReportError::export(format!("sheet '{label}': {e}")))?;
        debug!("Sheet '{label}': {} rows", result.len());
    }

    book.save(path)
        .map_err(|e| ReportError::export(format!("cannot write {}: {e}", path.display())))?;

    Ok(ExportSummary {
        path: path.to_path_buf(),
        sheets: workbook.len(),
        rows: workbook.total_rows(),
    })
}

fn write_sheet(sheet: &mut Worksheet, result: &TabularResult, datetime: &Format) -> std::result::Result<(), XlsxError> {
    let column_count = result.columns().len();
    if column_count == 0 {
        return Ok(());
    }

    for (col, name) in result.column_names().into_iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }

    for (i, row) in result.rows().iter().enumerate() {
        let row_index = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            write_cell(sheet, row_index, col as u16, value, datetime)?;
        }
    }

    let last_row = result.len() as u32;
    let last_col = (column_count - 1) as u16;

    sheet.set_freeze_panes(1, 1)?;
    sheet.autofilter(0, 0, last_row, last_col)?;

    if last_row > 0 {
        let scale = ConditionalFormat3ColorScale::new()
            .set_minimum_color(Color::RGB(SCALE_MIN_COLOR))
            .set_midpoint_color(Color::RGB(SCALE_MID_COLOR))
            .set_maximum_color(Color::RGB(SCALE_MAX_COLOR));
        for col in numeric_columns(result) {
            let col = col as u16;
            sheet.add_conditional_format(1, col, last_row, col, &scale)?;
        }
    }

    sheet.autofit();
    Ok(())
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    datetime: &Format,
) -> std::result::Result<(), XlsxError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Int(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        Value::Float(f) if f.is_finite() => {
            sheet.write_number(row, col, *f)?;
        }
        Value::Float(_) => {}
        Value::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        Value::Timestamp(ts) => {
            sheet.write_datetime_with_format(row, col, ts, datetime)?;
        }
    }
    Ok(())
}
