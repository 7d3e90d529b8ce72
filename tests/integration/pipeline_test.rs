//! Pipeline driver tests against the mock database client.

use super::export_test::read_entry;
use fecom_reports::catalog::QueryCatalog;
use fecom_reports::config::OutputConfig;
use fecom_reports::db::{FailingDatabaseClient, MockDatabaseClient, TabularResult, Value};
use fecom_reports::error::ReportError;
use fecom_reports::pipeline::{
    default_chart_steps, run_checks, time_slider_definition, ReportPipeline, EXPORT_FILE_NAME,
};
use fecom_reports::query::QueryExecutor;
use fecom_reports::report::TableStyle;
use tempfile::TempDir;

fn output_in(dir: &TempDir) -> OutputConfig {
    OutputConfig {
        charts_dir: dir.path().join("charts"),
        exports_dir: dir.path().join("exports"),
        queries: dir.path().join("queries.sql"),
    }
}

#[tokio::test]
async fn test_checks_print_named_tables() {
    let db = MockDatabaseClient::new().with_result(
        "SELECT 1 AS one;",
        TabularResult::new(vec!["one"], vec![vec![Value::Int(1)]]).unwrap(),
    );
    let catalog = QueryCatalog::from_pairs("test", [("Q", "SELECT 1 AS one;")]);
    let executor = QueryExecutor::new(&db, &catalog);

    let mut out = Vec::new();
    let ran = run_checks(&executor, &[], TableStyle::Boxed, &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(ran, 1);
    assert!(text.starts_with("\n=== Q ===\n"));
    assert!(text.contains("one"));
    assert!(text.contains('1'));
}

#[tokio::test]
async fn test_checks_empty_result_prints_placeholder() {
    let db = MockDatabaseClient::new().with_result(
        "SELECT x FROM t WHERE false",
        TabularResult::new(vec!["x"], Vec::new()).unwrap(),
    );
    let catalog = QueryCatalog::from_pairs("test", [("EMPTY", "SELECT x FROM t WHERE false")]);
    let executor = QueryExecutor::new(&db, &catalog);

    let mut out = Vec::new();
    run_checks(&executor, &[], TableStyle::Plain, &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "\n=== EMPTY ===\n(no rows)\n\n");
}

#[tokio::test]
async fn test_checks_stop_at_first_error() {
    let db = FailingDatabaseClient::new("relation \"orders\" does not exist");
    let catalog =
        QueryCatalog::from_pairs("test", [("A", "SELECT * FROM orders"), ("B", "SELECT 2")]);
    let executor = QueryExecutor::new(&db, &catalog);

    let mut out = Vec::new();
    let err = run_checks(&executor, &[], TableStyle::Plain, &mut out)
        .await
        .unwrap_err();

    let text = String::from_utf8(out).unwrap();
    assert!(matches!(err, ReportError::Query(_)));
    assert!(text.contains("=== A ==="));
    assert!(!text.contains("=== B ==="));
}

#[tokio::test]
async fn test_chart_failure_exports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_in(&dir);
    let db = FailingDatabaseClient::new("connection reset");
    let steps = default_chart_steps();
    let pairs: Vec<(&str, &str)> = steps.iter().map(|s| (s.query, "SELECT 1")).collect();
    let catalog = QueryCatalog::from_pairs("test", pairs);

    let pipeline = ReportPipeline::new(QueryExecutor::new(&db, &catalog), &output);
    let mut out = Vec::new();
    let err = pipeline.run(&steps, EXPORT_FILE_NAME, &mut out).await.unwrap_err();

    assert!(matches!(err, ReportError::Query(_)));
    assert!(out.is_empty());
    assert!(!output.exports_dir.join(EXPORT_FILE_NAME).exists());
    // Output directories are still created up front.
    assert!(output.charts_dir.is_dir());
}

#[tokio::test]
async fn test_unknown_chart_query_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_in(&dir);
    let db = MockDatabaseClient::new();
    let catalog = QueryCatalog::from_pairs("queries.sql", [("something_else", "SELECT 1")]);

    let pipeline = ReportPipeline::new(QueryExecutor::new(&db, &catalog), &output);
    let mut out = Vec::new();
    let err = pipeline
        .run(&default_chart_steps(), EXPORT_FILE_NAME, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::QueryNotFound { ref name, .. } if name == "pie_revenue_by_category"));
    assert_eq!(db.executed_count(), 0);
}

#[tokio::test]
async fn test_time_slider_writes_page() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_in(&dir);
    let def = time_slider_definition();

    let sql = "SELECT country, revenue, month FROM monthly";
    let raw = TabularResult::new(
        vec!["country", "revenue", "month"],
        vec![
            vec![Value::from("SP"), Value::Float(120.0), Value::from("2018-01-01")],
            vec![Value::from("RJ"), Value::Float(80.5), Value::from("2018-01-01")],
            vec![Value::from("SP"), Value::Float(140.0), Value::from("2018-02-01")],
        ],
    )
    .unwrap();
    let db = MockDatabaseClient::new().with_result(sql, raw);
    let catalog = QueryCatalog::from_pairs("test", [(def.query, sql)]);

    let pipeline = ReportPipeline::new(QueryExecutor::new(&db, &catalog), &output);
    let mut out = Vec::new();
    let rendered = pipeline.run_time_slider(false, &mut out).await.unwrap();

    let path = rendered.artifact.unwrap();
    assert_eq!(path, output.charts_dir.join("timeslider_revenue_by_country.html"));
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("2018-02"));
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "3 rows → TimeSlider: Monthly delivered revenue by country\n"
    );
}

fn chart_results() -> Vec<(&'static str, TabularResult)> {
    let text = |s: &str| Value::from(s);
    vec![
        (
            "pie_revenue_by_category",
            TabularResult::new(
                vec!["category", "revenue"],
                vec![
                    vec![text("health_beauty"), Value::Float(1200.0)],
                    vec![text("toys"), Value::Float(800.0)],
                    vec![text("Other"), Value::Float(400.0)],
                ],
            )
            .unwrap(),
        ),
        (
            "bar_top_sellers_by_revenue",
            TabularResult::new(
                vec!["seller_id", "revenue"],
                vec![
                    vec![text("4869f7a5dfa277a7dca6462dcf3b52b2"), Value::Float(2290.5)],
                    vec![text("53243585a1d6dc2643021fd1853d8905"), Value::Float(2010.0)],
                    vec![text("short"), Value::Float(150.25)],
                ],
            )
            .unwrap(),
        ),
        (
            "barh_avg_review_by_category",
            TabularResult::new(
                vec!["category", "avg_score", "n_reviews"],
                vec![
                    vec![text("ranked_low"), Value::Float(3.9), Value::Int(300)],
                    vec![text("ranked_top"), Value::Float(4.6), Value::Int(80)],
                    vec![text("ranked_mid"), Value::Float(4.2), Value::Int(120)],
                ],
            )
            .unwrap(),
        ),
        (
            "line_daily_revenue",
            TabularResult::new(
                vec!["day", "revenue"],
                vec![
                    vec![text("2018-01-01"), Value::Float(100.0)],
                    vec![text("2018-01-02"), Value::Float(140.0)],
                    vec![text("2018-01-03"), Value::Float(90.0)],
                    vec![text("2018-01-04"), Value::Float(5000.0)],
                    vec![text("2018-01-05"), Value::Float(120.0)],
                ],
            )
            .unwrap(),
        ),
        (
            "hist_order_value",
            TabularResult::new(
                vec!["order_id", "order_value"],
                (1..=6)
                    .map(|i| vec![text(&format!("o{i}")), Value::Float(f64::from(i) * 25.0)])
                    .collect(),
            )
            .unwrap(),
        ),
        (
            "scatter_price_vs_review",
            TabularResult::new(
                vec!["product_id", "avg_price", "avg_review"],
                vec![
                    vec![text("p1"), Value::Float(19.9), Value::Float(4.5)],
                    vec![text("p2"), Value::Float(120.0), Value::Float(3.0)],
                    vec![text("p3"), Value::Float(55.0), Value::Null],
                    vec![text("p4"), Value::Float(75.5), Value::Float(5.0)],
                ],
            )
            .unwrap(),
        ),
    ]
}

#[tokio::test]
async fn test_chart_pipeline_writes_charts_and_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_in(&dir);

    let results = chart_results();
    let sql: Vec<(&str, String)> = results
        .iter()
        .map(|(query, _)| (*query, format!("SELECT * FROM {query}")))
        .collect();
    let db = results
        .into_iter()
        .zip(&sql)
        .fold(MockDatabaseClient::new(), |db, ((_, result), (_, sql))| {
            db.with_result(sql, result)
        });
    let catalog = QueryCatalog::from_pairs("test", sql.iter().map(|(q, s)| (*q, s.as_str())));

    let steps = default_chart_steps();
    let pipeline = ReportPipeline::new(QueryExecutor::new(&db, &catalog), &output);
    let mut out = Vec::new();
    let summary = pipeline.run(&steps, EXPORT_FILE_NAME, &mut out).await.unwrap();

    assert_eq!(summary.sheets, 6);
    assert_eq!(summary.rows, 24);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "3 rows → Pie: Delivered revenue share by category\n\
         3 rows → Bar: Top sellers by revenue\n\
         3 rows → BarH: Avg review score by category (top-20)\n\
         5 rows → Line: Daily delivered revenue (capped)\n\
         6 rows → Histogram: Order value distribution (≤99th pct)\n\
         4 rows → Scatter: Price vs. review score by product (≤99th pct)\n\
         Created file analytics_export.xlsx, 6 sheets, 24 rows\n"
    );

    for step in &steps {
        let png = output.charts_dir.join(step.file_name());
        let bytes = std::fs::read(&png).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"), "{} is not a PNG", png.display());
    }
    assert_eq!(db.executed_count(), 6);

    let workbook = output.exports_dir.join(EXPORT_FILE_NAME);
    let book = read_entry(&workbook, "xl/workbook.xml");
    for label in ["Pie", "Bar", "BarH", "Line", "Hist", "Scatter"] {
        assert!(book.contains(&format!(r#"name="{label}""#)), "missing sheet {label}");
    }

    // The line sheet carries the derived capped column next to the original.
    let line = read_entry(&workbook, "xl/worksheets/sheet4.xml");
    assert!(line.contains(r#"<autoFilter ref="A1:C6"/>"#));
    let strings = read_entry(&workbook, "xl/sharedStrings.xml");
    assert!(strings.contains("revenue_capped"));

    // The ranked sheet is exported best first.
    let top = strings.find("ranked_top").unwrap();
    let mid = strings.find("ranked_mid").unwrap();
    let low = strings.find("ranked_low").unwrap();
    assert!(top < mid && mid < low);
}
