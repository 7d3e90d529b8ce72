//! fecom-reports: charts, checks and a spreadsheet export over the e-commerce database.
//!
//! This library exposes the core modules for use in the binary and integration tests.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod report;
