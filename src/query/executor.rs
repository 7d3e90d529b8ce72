//! Named query execution.
//!
//! Resolves a query name through a catalog, runs the SQL against a database
//! client, and normalizes the column types of the result.

use std::collections::HashSet;
use std::time::Instant;

use tracing::debug;

use super::coerce;
use crate::catalog::QueryCatalog;
use crate::db::{DatabaseClient, TabularResult};
use crate::error::Result;

/// Query executor bound to one database client and one catalog.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
    catalog: &'a QueryCatalog,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(db: &'a dyn DatabaseClient, catalog: &'a QueryCatalog) -> Self {
        Self { db, catalog }
    }

    /// The catalog names are resolved against.
    pub fn catalog(&self) -> &QueryCatalog {
        self.catalog
    }

    /// Resolves `name` in the catalog and executes it.
    pub async fn fetch(&self, name: &str, date_columns: &[&str]) -> Result<TabularResult> {
        let sql = self.catalog.resolve(name)?;
        debug!("Running query '{name}'");
        self.execute(sql, date_columns).await
    }

    /// Executes `sql` and normalizes the result.
    ///
    /// Columns named in `date_columns` are coerced to timestamps regardless of
    /// the type reported by the database.
    pub async fn execute(&self, sql: &str, date_columns: &[&str]) -> Result<TabularResult> {
        let start = Instant::now();
        let raw = self.db.execute_query(sql).await?;
        let date_columns: HashSet<String> = date_columns.iter().map(|c| c.to_string()).collect();
        let result = coerce::normalize(raw, &date_columns)?;

        debug!(
            "Query finished: {} rows x {} columns in {:?}",
            result.len(),
            result.columns().len(),
            start.elapsed()
        );

        Ok(result)
    }
}
