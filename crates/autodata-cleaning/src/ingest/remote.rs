//! Remote sources: JSON HTTP APIs and PostgreSQL queries.

use super::{columns_to_dataframe, records_to_dataframe};
use crate::error::{CleaningError, Result};
use polars::prelude::*;
use serde_json::Value;
use std::time::Duration;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo, ValueRef};
use tracing::{debug, info};

/// Upper bound for one API fetch, connect through body.
pub const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch JSON records from an HTTP endpoint with a GET request.
///
/// A non-success status is reported as [`CleaningError::UpstreamStatus`].
/// The request gives up after [`API_TIMEOUT`].
pub async fn fetch_from_api(url: &str) -> Result<DataFrame> {
    fetch_with_timeout(url, API_TIMEOUT).await
}

async fn fetch_with_timeout(url: &str, timeout: Duration) -> Result<DataFrame> {
    info!("Fetching data from API: {}", url);
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(CleaningError::UpstreamStatus {
            status: status.as_u16(),
        });
    }

    let payload: Value = response.json().await?;
    let df = records_to_dataframe(&payload)?;
    debug!("API returned {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Run a query against a PostgreSQL database and load the result set.
pub async fn load_from_database(db_url: &str, query: &str) -> Result<DataFrame> {
    info!("Loading data from database");
    let mut conn = PgConnection::connect(db_url)
        .await
        .map_err(|e| CleaningError::Database(e.to_string()))?;

    // Column names come from the prepared statement so an empty result keeps them
    let statement = conn
        .prepare(query)
        .await
        .map_err(|e| CleaningError::Database(e.to_string()))?;
    let names: Vec<String> = statement
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();

    let rows = statement
        .query()
        .fetch_all(&mut conn)
        .await
        .map_err(|e| CleaningError::Database(e.to_string()))?;

    if let Err(e) = conn.close().await {
        debug!("Closing database connection failed: {}", e);
    }

    debug!("Query returned {} rows x {} columns", rows.len(), names.len());
    rows_to_dataframe(names, &rows)
}

fn rows_to_dataframe(names: Vec<String>, rows: &[PgRow]) -> Result<DataFrame> {
    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
    for row in rows {
        for (i, column) in columns.iter_mut().enumerate() {
            column.push(decode_cell(row, i));
        }
    }
    columns_to_dataframe(names, columns)
}

/// Decode one cell by its PostgreSQL type; undecodable values become null.
fn decode_cell(row: &PgRow, i: usize) -> Value {
    let is_null = row.try_get_raw(i).map(|v| v.is_null()).unwrap_or(true);
    if is_null {
        return Value::Null;
    }

    let type_name = row.columns()[i].type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "INT2" => row.try_get::<i16, _>(i).ok().map(Value::from),
        "INT4" => row.try_get::<i32, _>(i).ok().map(Value::from),
        "INT8" => row.try_get::<i64, _>(i).ok().map(Value::from),
        "FLOAT4" => row
            .try_get::<f32, _>(i)
            .ok()
            .and_then(|v| serde_json::Number::from_f64(f64::from(v)).map(Value::Number)),
        "FLOAT8" => row
            .try_get::<f64, _>(i)
            .ok()
            .and_then(|v| serde_json::Number::from_f64(v).map(Value::Number)),
        "BOOL" => row.try_get::<bool, _>(i).ok().map(Value::Bool),
        "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(i)
            .ok()
            .map(|v| Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(i)
            .ok()
            .map(|v| Value::String(v.to_rfc3339())),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(i)
            .ok()
            .map(|v| Value::String(v.format("%Y-%m-%d").to_string())),
        "JSON" | "JSONB" => row
            .try_get::<Value, _>(i)
            .ok()
            .map(|v| Value::String(v.to_string())),
        _ => row.try_get::<String, _>(i).ok().map(Value::String),
    };

    decoded.unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_empty_result_keeps_column_names() {
        let names = vec!["id".to_string(), "email".to_string()];
        let df = rows_to_dataframe(names, &[]).unwrap();
        assert_eq!(df.shape(), (0, 2));
        assert_eq!(crate::utils::column_names(&df), vec!["id", "email"]);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_on_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let started = std::time::Instant::now();
        let err = fetch_with_timeout(&format!("http://{}/records", addr), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(err.is_upstream_error());
        assert_eq!(err.error_code(), "HTTP_REQUEST_ERROR");

        server.abort();
    }
}
