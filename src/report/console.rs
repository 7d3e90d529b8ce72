//! Console table rendering.

use std::io::Write;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};

use crate::db::{TabularResult, Value};
use crate::error::Result;

/// Printed instead of a table when a result has no rows.
pub const NO_ROWS_PLACEHOLDER: &str = "(no rows)";

/// How tables are drawn on the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// Box-drawn table.
    #[default]
    Boxed,
    /// Pipe-separated columns padded to their widest cell.
    Plain,
}

/// Writes `result` as a table followed by a blank line.
pub fn render_table<W: Write>(result: &TabularResult, style: TableStyle, out: &mut W) -> Result<()> {
    if result.is_empty() {
        writeln!(out, "{NO_ROWS_PLACEHOLDER}")?;
        writeln!(out)?;
        return Ok(());
    }

    match style {
        TableStyle::Boxed => writeln!(out, "{}", boxed_table(result))?,
        TableStyle::Plain => write_plain(result, out)?,
    }
    writeln!(out)?;
    Ok(())
}

fn boxed_table(result: &TabularResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(result.column_names().into_iter().map(Cell::new));
    for row in result.rows() {
        table.add_row(row.iter().map(|v| Cell::new(Value::to_display_string(v))));
    }
    table
}

fn write_plain<W: Write>(result: &TabularResult, out: &mut W) -> std::io::Result<()> {
    let headers = result.column_names();
    let cells: Vec<Vec<String>> = result
        .rows()
        .iter()
        .map(|row| row.iter().map(Value::to_display_string).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .fold(h.chars().count(), usize::max)
        })
        .collect();

    let pad = |text: &str, width: usize| format!("{text:<width$}");

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();
    writeln!(out, "{}", header_line.join(" | "))?;

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("-+-"))?;

    for row in &cells {
        let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect();
        writeln!(out, "{}", line.join(" | "))?;
    }
    Ok(())
}
