//! Checks the shipped query catalog against the chart pipeline.

use std::path::PathBuf;

use fecom_reports::catalog::{builtin, QueryCatalog};
use fecom_reports::pipeline::{default_chart_steps, time_slider_definition};

fn shipped_catalog() -> QueryCatalog {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("queries.sql");
    QueryCatalog::load(&path).unwrap()
}

#[test]
fn test_every_chart_query_is_defined() {
    let catalog = shipped_catalog();
    for step in default_chart_steps() {
        let sql = catalog.resolve(step.query).unwrap();
        assert!(sql.ends_with(';'), "{} is not terminated", step.query);
        assert!(!sql.contains("--"), "{} still has comments", step.query);
    }
    assert!(catalog.get(time_slider_definition().query).is_some());
}

#[test]
fn test_shipped_catalog_has_no_extra_blocks() {
    let catalog = shipped_catalog();
    assert_eq!(catalog.len(), default_chart_steps().len() + 1);
}

#[test]
fn test_builtin_checks_are_ordered() {
    let checks = builtin::checks_catalog();
    let names = checks.names();
    assert_eq!(names.first(), Some(&"B1_LIMIT10"));
    assert!(names.iter().take(4).all(|n| n.starts_with('B')));
    assert!(names.iter().skip(4).all(|n| n.starts_with('Q')));
}
