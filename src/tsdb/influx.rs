//! InfluxDB 1.x HTTP client

use super::{encode_batch, Point, TimeSeriesStore, TsdbError};
use crate::config::InfluxConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Client for the InfluxDB `/query` and `/write` endpoints
pub struct InfluxClient {
    config: InfluxConfig,
    client: Client,
}

impl InfluxClient {
    pub fn new(config: InfluxConfig) -> Result<Self, TsdbError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Database points are written to by the ingestor
    pub fn database(&self) -> &str {
        &self.config.database
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.config.username, Some(&self.config.password))
    }

    /// Run an InfluxQL statement and return its first result
    async fn query(&self, statement: &str) -> Result<StatementResult, TsdbError> {
        tracing::debug!(statement, "Running InfluxQL");

        let request = self
            .client
            .post(self.endpoint("query"))
            .query(&[("q", statement)]);
        let response = check_status(self.authed(request).send().await?).await?;

        let parsed: QueryResponse = serde_json::from_str(&response.text().await?)?;
        if let Some(error) = parsed.error {
            return Err(TsdbError::Query(error));
        }

        let result = parsed.results.into_iter().next().unwrap_or_default();
        if let Some(error) = result.error {
            return Err(TsdbError::Query(error));
        }
        Ok(result)
    }
}

async fn check_status(response: Response) -> Result<Response, TsdbError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TsdbError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Quote an identifier for InfluxQL
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Series {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl StatementResult {
    /// First column of every row, for single-column listings
    fn first_column(&self) -> Vec<String> {
        self.series
            .iter()
            .flat_map(|s| s.values.iter())
            .filter_map(|row| row.first().and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl TimeSeriesStore for InfluxClient {
    async fn list_databases(&self) -> Result<Vec<String>, TsdbError> {
        Ok(self.query("SHOW DATABASES").await?.first_column())
    }

    async fn create_database(&self, name: &str) -> Result<(), TsdbError> {
        self.query(&format!("CREATE DATABASE {}", quote_ident(name)))
            .await?;
        Ok(())
    }

    async fn write_points(&self, database: &str, points: &[Point]) -> Result<(), TsdbError> {
        if points.is_empty() {
            tracing::debug!(database, "No points to write");
            return Ok(());
        }

        let request = self
            .client
            .post(self.endpoint("write"))
            .query(&[("db", database), ("precision", "s")])
            .body(encode_batch(points));
        check_status(self.authed(request).send().await?).await?;

        tracing::debug!(database, count = points.len(), "Wrote points");
        Ok(())
    }
}
