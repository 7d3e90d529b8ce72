//! Integration tests for fecom-reports.

pub mod catalog_test;
pub mod export_test;
pub mod pipeline_test;
pub mod query_test;
