//! Query execution integration tests.
//!
//! Runs real SQL through the Postgres client and the executor.

use fecom_reports::catalog::QueryCatalog;
use fecom_reports::config::ConnectionConfig;
use fecom_reports::db::{ColumnType, DatabaseClient, PostgresClient, Value};
use fecom_reports::error::ReportError;
use fecom_reports::query::QueryExecutor;

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a test client.
async fn get_test_client() -> Option<PostgresClient> {
    let url = get_test_database_url()?;
    let settings = ConnectionConfig::from_connection_string(&url)
        .ok()?
        .resolve()
        .ok()?;
    PostgresClient::connect(&settings).await.ok()
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 as num, 'hello' as greeting")
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["num", "greeting"]);
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows()[0][0], Value::Int(1));
    assert_eq!(result.rows()[0][1], Value::from("hello"));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 AS a, 'x' AS b WHERE false")
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.column_names(), vec!["a", "b"]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_numeric_and_dates_are_normalized() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let catalog = QueryCatalog::from_pairs(
        "test",
        [(
            "typed",
            "SELECT 12.50::numeric AS revenue, '2018-01-02'::text AS day, NULL::int AS missing",
        )],
    );
    let executor = QueryExecutor::new(&client, &catalog);
    let result = executor.fetch("typed", &["day"]).await.unwrap();

    assert_eq!(result.columns()[0].kind, ColumnType::Float);
    assert_eq!(result.columns()[1].kind, ColumnType::Timestamp);
    assert_eq!(result.columns()[2].kind, ColumnType::Null);
    assert_eq!(result.rows()[0][0], Value::Float(12.5));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sql_error_is_query_error() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = client
        .execute_query("SELECT missing_column FROM (SELECT 1) t")
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Query(_)));
    assert!(err.to_string().contains("missing_column"));

    client.close().await.unwrap();
}
