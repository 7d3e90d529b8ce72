//! Database abstraction layer.
//!
//! Provides a trait-based interface for query execution, so that the report
//! pipeline can run against PostgreSQL or an in-memory stand-in.

mod mock;
mod postgres;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use types::{ColumnInfo, ColumnType, Row, TabularResult, Value, TIMESTAMP_DISPLAY_FORMAT};

pub(crate) use types::is_integral;

use crate::config::ConnectionSettings;
use crate::error::Result;
use async_trait::async_trait;

/// Creates a PostgreSQL client for the given settings.
pub async fn connect(settings: &ConnectionSettings) -> Result<Box<dyn DatabaseClient>> {
    let client = PostgresClient::connect(settings).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for database clients.
///
/// All operations are async and return Results with ReportError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a parameterless SQL statement and returns its rows.
    ///
    /// Any server-side resource used by the call is released before it returns,
    /// on success and on failure.
    async fn execute_query(&self, sql: &str) -> Result<TabularResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
