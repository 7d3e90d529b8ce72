//! Mock database clients for testing.
//!
//! Provides in-memory stand-ins that return canned results without a server.

use super::{DatabaseClient, TabularResult, Value};
use crate::error::{ReportError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock database client that returns predefined results.
///
/// Results are registered per SQL text (compared after trimming whitespace
/// and a trailing `;`). Unregistered SELECT statements return a single
/// `result` column echoing the SQL; other statements return an empty result.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    results: HashMap<String, TabularResult>,
    executed: AtomicUsize,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no canned results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the result returned for `sql`.
    pub fn with_result(mut self, sql: &str, result: TabularResult) -> Self {
        self.results.insert(normalize_sql(sql), result);
        self
    }

    /// Number of statements executed so far.
    pub fn executed_count(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

fn normalize_sql(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim().to_string()
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<TabularResult> {
        self.executed.fetch_add(1, Ordering::SeqCst);

        if let Some(result) = self.results.get(&normalize_sql(sql)) {
            return Ok(result.clone());
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            TabularResult::new(
                vec!["result"],
                vec![vec![Value::Text(format!("Mock result for: {}", sql.trim()))]],
            )
        } else {
            Ok(TabularResult::empty())
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose every query fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that fails every query with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<TabularResult> {
        Err(ReportError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
