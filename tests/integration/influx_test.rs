//! Integration tests for the InfluxDB client and rate ingestion against a fake server

use crate::support::spawn_server;
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tick::config::InfluxConfig;
use tick::exchange::{Exchange, ExchangeError, RawCandle, RawTrade};
use tick::rates::RateIngestor;
use tick::tsdb::{InfluxClient, Point, TimeSeriesStore, TsdbError};

/// "root:root"
const ROOT_AUTH: &str = "Basic cm9vdDpyb290";

#[derive(Default)]
struct FakeInflux {
    databases: Vec<String>,
    creates: usize,
    writes: Vec<(String, String, String)>,
}

type Shared = Arc<Mutex<FakeInflux>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(ROOT_AUTH)
}

async fn query(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let statement = params.get("q").cloned().unwrap_or_default();
    let mut influx = state.lock().unwrap();

    if statement == "SHOW DATABASES" {
        let values: Vec<_> = influx.databases.iter().map(|d| json!([d])).collect();
        return Json(json!({"results": [{"statement_id": 0, "series": [
            {"name": "databases", "columns": ["name"], "values": values}
        ]}]}))
        .into_response();
    }

    if let Some(name) = statement.strip_prefix("CREATE DATABASE ") {
        influx.creates += 1;
        influx.databases.push(name.trim_matches('"').to_string());
        return Json(json!({"results": [{"statement_id": 0}]})).into_response();
    }

    Json(json!({"results": [{"statement_id": 0, "error": format!("unsupported: {}", statement)}]}))
        .into_response()
}

async fn write(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let db = params.get("db").cloned().unwrap_or_default();
    let mut influx = state.lock().unwrap();
    if !influx.databases.contains(&db) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("database not found: \"{}\"", db)})),
        )
            .into_response();
    }

    let precision = params.get("precision").cloned().unwrap_or_default();
    influx.writes.push((db, precision, body));
    StatusCode::NO_CONTENT.into_response()
}

async fn fake_influx(password: &str) -> (InfluxClient, Shared) {
    let state: Shared = Arc::new(Mutex::new(FakeInflux {
        databases: vec!["_internal".to_string()],
        ..Default::default()
    }));
    let app = Router::new()
        .route("/query", post(query))
        .route("/write", post(write))
        .with_state(state.clone());
    let url = spawn_server(app).await;

    let client = InfluxClient::new(InfluxConfig {
        url,
        password: password.to_string(),
        ..Default::default()
    })
    .unwrap();
    (client, state)
}

struct FixedRates;

#[async_trait]
impl Exchange for FixedRates {
    async fn fetch_trades(&self, _product_id: &str) -> Result<Vec<RawTrade>, ExchangeError> {
        Ok(vec![])
    }

    async fn fetch_historic_rates(
        &self,
        _product_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _granularity: Duration,
    ) -> Result<Vec<RawCandle>, ExchangeError> {
        Ok(vec![
            vec![json!(1620000000), json!(10.0), json!(12.0), json!(11.0), json!(11.5), json!(500)],
            vec![json!(1620000010), json!(11.0), json!(11.8), json!(11.5), json!(11.6), json!(42.5)],
        ])
    }
}

#[tokio::test]
async fn test_list_and_create_databases() {
    let (client, state) = fake_influx("root").await;

    assert_eq!(client.list_databases().await.unwrap(), vec!["_internal"]);
    assert!(client.ensure_database("rates").await.unwrap());
    assert!(!client.ensure_database("rates").await.unwrap());

    assert_eq!(state.lock().unwrap().creates, 1);
    assert_eq!(
        client.list_databases().await.unwrap(),
        vec!["_internal", "rates"]
    );
}

#[tokio::test]
async fn test_write_points() {
    let (client, state) = fake_influx("root").await;
    client.create_database("rates").await.unwrap();

    let point = Point::new("rates", Utc.timestamp_opt(1620000000, 0).unwrap())
        .tag("prod_id", "BTC-USD")
        .field("close", dec!(11.5));
    client.write_points("rates", &[point]).await.unwrap();

    let influx = state.lock().unwrap();
    assert_eq!(influx.writes.len(), 1);
    assert_eq!(influx.writes[0].1, "s");
    assert_eq!(influx.writes[0].2, "rates,prod_id=BTC-USD close=11.5 1620000000");
}

#[tokio::test]
async fn test_empty_write_is_skipped() {
    let (client, state) = fake_influx("root").await;

    client.write_points("missing", &[]).await.unwrap();
    assert!(state.lock().unwrap().writes.is_empty());
}

#[tokio::test]
async fn test_write_to_missing_database_fails() {
    let (client, _) = fake_influx("root").await;

    let point = Point::new("rates", Utc::now()).field("close", dec!(1));
    let err = client.write_points("missing", &[point]).await.unwrap_err();
    assert!(matches!(err, TsdbError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_bad_credentials() {
    let (client, _) = fake_influx("wrong").await;

    let err = client.list_databases().await.unwrap_err();
    assert!(matches!(err, TsdbError::Status { status: 401, .. }));
}

#[tokio::test]
async fn test_ingest_creates_database_once_and_writes() {
    let (client, state) = fake_influx("root").await;
    let ingestor = RateIngestor::new(
        Arc::new(FixedRates),
        Arc::new(client),
        "rates",
        Duration::from_secs(60),
        Duration::from_secs(10),
    );

    assert_eq!(ingestor.ingest_recent_rates("BTC-USD").await.unwrap(), 2);
    assert_eq!(ingestor.ingest_recent_rates("BTC-USD").await.unwrap(), 2);

    let influx = state.lock().unwrap();
    assert_eq!(influx.creates, 1);
    assert_eq!(influx.writes.len(), 2);

    let lines: Vec<&str> = influx.writes[0].2.lines().collect();
    assert_eq!(
        lines,
        vec![
            "rates,prod_id=BTC-USD close=11.5,high=12,low=10,open=11,volume=500 1620000000",
            "rates,prod_id=BTC-USD close=11.6,high=11.8,low=11,open=11.5,volume=42.5 1620000010",
        ]
    );
}
