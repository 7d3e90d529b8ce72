//! Query execution for the report pipeline.
//!
//! This module isolates SQL execution and result normalization from the
//! renderers and the pipeline driver.

pub mod coerce;
pub mod executor;

pub use executor::QueryExecutor;
