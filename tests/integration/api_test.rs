//! Integration tests for the HTTP API

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tick::api;
use tick::exchange::{Exchange, ExchangeError, RawCandle, RawTrade};
use tick::feed::TradeFeed;
use tick::offset::{MemoryOffsetStore, OffsetStore};
use tower::ServiceExt;

struct FixedTrades;

#[async_trait]
impl Exchange for FixedTrades {
    async fn fetch_trades(&self, product_id: &str) -> Result<Vec<RawTrade>, ExchangeError> {
        if product_id != "BTC-USD" {
            return Err(ExchangeError::Status {
                status: 404,
                message: "NotFound".to_string(),
            });
        }

        let trades = json!([
            {"time": "2024-01-15T10:00:02Z", "trade_id": 7, "price": "42000.50", "size": "0.25", "side": "sell"},
            {"time": "2024-01-15T10:00:01Z", "trade_id": 6, "price": "42000.00", "size": "1", "side": "buy"},
            {"time": "2024-01-15T10:00:00Z", "trade_id": 5, "price": "41999.99", "size": "0.5", "side": "buy"}
        ]);
        Ok(serde_json::from_value(trades).unwrap())
    }

    async fn fetch_historic_rates(
        &self,
        _product_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _granularity: Duration,
    ) -> Result<Vec<RawCandle>, ExchangeError> {
        Ok(vec![])
    }
}

fn app() -> (Router, Arc<MemoryOffsetStore>) {
    let offsets = Arc::new(MemoryOffsetStore::new());
    let feed = Arc::new(TradeFeed::new(Arc::new(FixedTrades), offsets.clone()));
    (api::router(feed), offsets)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_feed_returns_new_trades() {
    let (app, offsets) = app();

    let (status, body) = get(&app, "/feed/?prod_id=BTC-USD").await;
    assert_eq!(status, StatusCode::OK);

    let trades = body.as_array().unwrap();
    assert_eq!(trades.len(), 3);
    assert_eq!(trades[0]["trade_id"], json!(7));
    assert_eq!(trades[0]["price"], json!(42000.5));
    assert_eq!(trades[0]["size"], json!(0.25));
    assert_eq!(trades[0]["side"], json!("sell"));
    assert_eq!(trades[0]["time"], json!("2024-01-15T10:00:02Z"));
    assert_eq!(trades[0]["prod_id"], json!("BTC-USD"));
    assert_eq!(offsets.get_offset("BTC-USD").await.unwrap(), 7);
}

#[tokio::test]
async fn test_feed_second_request_is_empty() {
    let (app, _) = app();

    let (_, first) = get(&app, "/feed/?prod_id=BTC-USD").await;
    assert_eq!(first.as_array().unwrap().len(), 3);

    let (status, second) = get(&app, "/feed/?prod_id=BTC-USD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, json!([]));
}

#[tokio::test]
async fn test_feed_respects_stored_offset() {
    let (app, offsets) = app();
    offsets.set_offset("BTC-USD", 5).await.unwrap();

    let (_, body) = get(&app, "/feed?prod_id=BTC-USD").await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["trade_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![7, 6]);
}

#[tokio::test]
async fn test_feed_missing_prod_id() {
    let (app, _) = app();

    let (status, body) = get(&app, "/feed/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("BAD_REQUEST"));

    let (status, _) = get(&app, "/feed/?prod_id=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_feed_unknown_product() {
    let (app, offsets) = app();

    let (status, body) = get(&app, "/feed/?prod_id=DOGE-XYZ").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], json!("UPSTREAM_ERROR"));
    assert_eq!(
        offsets.get_offset("DOGE-XYZ").await.unwrap(),
        tick::offset::NO_OFFSET
    );
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
}
