//! Spreadsheet export tests.
//!
//! Opens the written workbook as a zip archive and inspects the sheet XML.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use fecom_reports::db::{TabularResult, Value};
use fecom_reports::report::{export_workbook, ExportWorkbook};

pub fn read_entry(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

fn revenue_by_category() -> TabularResult {
    TabularResult::new(
        vec!["category", "revenue"],
        vec![
            vec![Value::from("toys"), Value::Float(10.0)],
            vec![Value::from("books"), Value::Float(5.5)],
        ],
    )
    .unwrap()
}

#[test]
fn test_header_freeze_and_autofilter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analytics_export.xlsx");

    let mut workbook = ExportWorkbook::new();
    workbook.insert("Pie", revenue_by_category());
    let summary = export_workbook(&workbook, &path).unwrap();

    assert_eq!(
        summary.message(),
        "Created file analytics_export.xlsx, 1 sheets, 2 rows"
    );

    let sheet = read_entry(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<autoFilter ref="A1:B3"/>"#));
    assert!(sheet.contains(r#"topLeftCell="B2""#));
    // Only two numeric values: no colour scale.
    assert!(!sheet.contains("colorScale"));

    let book = read_entry(&path, "xl/workbook.xml");
    assert!(book.contains(r#"name="Pie""#));
}

#[test]
fn test_colour_scale_on_numeric_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let day = |d: u32| {
        Value::Timestamp(
            NaiveDate::from_ymd_opt(2018, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    };
    let daily = TabularResult::new(
        vec!["day", "revenue"],
        vec![
            vec![day(1), Value::Float(100.0)],
            vec![day(2), Value::Float(250.0)],
            vec![day(3), Value::Null],
            vec![day(4), Value::Float(75.25)],
        ],
    )
    .unwrap();

    let mut workbook = ExportWorkbook::new();
    workbook.insert("Line", daily);
    export_workbook(&workbook, &path).unwrap();

    let sheet = read_entry(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("colorScale"));
    assert!(sheet.contains(r#"sqref="B2:B5""#));
    assert!(sheet.contains("FFAA0000"));
    assert!(sheet.contains("FFFFFF00"));
    assert!(sheet.contains("FF00AA00"));
    // The timestamp column is not numeric.
    assert!(!sheet.contains(r#"sqref="A2:A5""#));
}

#[test]
fn test_sheets_follow_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let mut workbook = ExportWorkbook::new();
    workbook.insert("Scatter", revenue_by_category());
    workbook.insert("Bar", revenue_by_category());
    let summary = export_workbook(&workbook, &path).unwrap();

    assert_eq!(summary.sheets, 2);
    assert_eq!(summary.rows, 4);

    let book = read_entry(&path, "xl/workbook.xml");
    let scatter = book.find(r#"name="Scatter""#).unwrap();
    let bar = book.find(r#"name="Bar""#).unwrap();
    assert!(scatter < bar);
}
