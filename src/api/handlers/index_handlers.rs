use super::ApiError;
use crate::api::ApiState;
use crate::database::RebalanceOperations;
use crate::types::{filter_by_window, HealthResponse, HistoryQuery, IndexEntry};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::Utc;
use serde_json::{Map, Value};

/// Single dispatch point for the per-variant read endpoints. Every
/// variant exposes three slugs: `{index}`, `{index}-current-price` and
/// `{index}-rebalance`.
pub async fn get_index_data(
    Path(slug): Path<String>,
    Query(params): Query<HistoryQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ApiError> {
    if let Some(name) = slug.strip_suffix("-current-price") {
        current_price(&state, name).await
    } else if let Some(name) = slug.strip_suffix("-rebalance") {
        rebalance_history(&state, name).await
    } else {
        price_history(&state, &slug, params.day).await
    }
}

async fn price_history(
    state: &ApiState,
    name: &str,
    day: Option<i64>,
) -> Result<Json<Value>, ApiError> {
    let policy = state
        .policy(name)
        .ok_or_else(|| ApiError::not_found(format!("unknown index: {}", name)))?;

    let series = load_series(state, &policy.name).await?;
    let entries = match day {
        Some(days) => filter_by_window(&series, days, Utc::now()),
        None => series,
    };

    let mut body = Map::new();
    body.insert(
        format!("{}_data", policy.name),
        serde_json::to_value(entries).map_err(|e| ApiError::internal(e.to_string()))?,
    );
    Ok(Json(Value::Object(body)))
}

async fn current_price(state: &ApiState, name: &str) -> Result<Json<Value>, ApiError> {
    let policy = state
        .policy(name)
        .ok_or_else(|| ApiError::not_found(format!("unknown index: {}", name)))?;

    let series = load_series(state, &policy.name).await?;
    match series.into_iter().next() {
        Some(latest) => {
            serde_json::to_value(latest)
                .map(Json)
                .map_err(|e| ApiError::internal(e.to_string()))
        }
        None => Err(ApiError::not_found(format!(
            "no price data available for {}",
            policy.name
        ))),
    }
}

async fn rebalance_history(state: &ApiState, name: &str) -> Result<Json<Value>, ApiError> {
    let policy = state
        .policy(name)
        .ok_or_else(|| ApiError::not_found(format!("unknown index: {}", name)))?;

    match RebalanceOperations::load_series(state.database.pool(), &policy.name).await {
        Ok(entries) => {
            let body = serde_json::json!({ "rebalanceData": entries });
            Ok(Json(body))
        }
        Err(e) => {
            tracing::error!("failed to read rebalance history for {}: {}", policy.name, e);
            Err(e.into())
        }
    }
}

/// Cached snapshot or single-flight store read.
async fn load_series(state: &ApiState, name: &str) -> Result<Vec<IndexEntry>, ApiError> {
    state
        .cache
        .read_through(state.database.pool(), name)
        .await
        .map_err(|e| {
            tracing::error!("failed to read history for {}: {}", name, e);
            e.into()
        })
}

pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        indexes: state.policies.iter().map(|p| p.name.clone()).collect(),
    })
}
