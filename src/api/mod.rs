//! HTTP API
//!
//! - `GET /feed/?prod_id=<id>`: trades newer than the last delivered one
//! - `GET /health`: liveness probe

mod error;

pub use error::ApiError;

use crate::exchange::Trade;
use crate::feed::TradeFeed;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<TradeFeed>,
}

/// Build the API router
pub fn router(feed: Arc<TradeFeed>) -> Router {
    Router::new()
        .route("/feed/", get(trades))
        .route("/feed", get(trades))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { feed })
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    prod_id: Option<String>,
}

async fn trades(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    let product_id = query
        .prod_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing prod_id query parameter".to_string()))?;

    let trades = state.feed.new_trades(&product_id).await?;
    Ok(Json(trades))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server_time": chrono::Utc::now().timestamp_millis(),
    }))
}
