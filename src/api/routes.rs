use super::{handlers, ApiState};
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        // {index}, {index}-current-price and {index}-rebalance are all
        // single path segments, dispatched inside the handler
        .route(
            "/:slug",
            get(handlers::get_index_data).fallback(handlers::method_not_allowed),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SeriesCache;
    use crate::database::Database;
    use crate::index::IndexPolicy;
    use crate::types::{CoinQuote, IndexEntry};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    // Lazily-connected pool pointing nowhere: any handler path that
    // touches the store errors, so cache-served responses prove no
    // store read happened.
    fn test_state(cache: SeriesCache) -> ApiState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@localhost:1/none")
            .unwrap();
        ApiState::new(
            Arc::new(Database::new(pool)),
            Arc::new(cache),
            Arc::new(IndexPolicy::builtin()),
        )
    }

    fn entry_at(ts: chrono::DateTime<Utc>, price: i64) -> IndexEntry {
        IndexEntry {
            timestamp: ts,
            index_price: Decimal::from(price),
            constituents: vec![CoinQuote {
                id: 1,
                name: "Uniswap".to_string(),
                symbol: "UNI".to_string(),
                price: Decimal::from(price),
                token_address: None,
                chain: None,
            }],
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_is_rejected_with_json_405() {
        let app = create_router(test_state(SeriesCache::new(Duration::from_secs(60))));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/defi")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_unknown_index_is_404_with_error_body() {
        let app = create_router(test_state(SeriesCache::new(Duration::from_secs(60))));

        let response = app
            .oneshot(Request::builder().uri("/doge2").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("unknown index"));
    }

    #[tokio::test]
    async fn test_day_window_filters_cached_history() {
        let now = Utc::now();
        let cache = SeriesCache::new(Duration::from_secs(60));
        cache
            .put(
                "defi",
                vec![
                    entry_at(now, 30),
                    entry_at(now - chrono::Duration::days(2), 20),
                    entry_at(now - chrono::Duration::days(10), 10),
                ],
            )
            .await;
        let app = create_router(test_state(cache));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/defi?day=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let entries = body["defi_data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_omitted_day_returns_full_history() {
        let now = Utc::now();
        let cache = SeriesCache::new(Duration::from_secs(60));
        cache
            .put(
                "defi",
                vec![
                    entry_at(now, 30),
                    entry_at(now - chrono::Duration::days(2), 20),
                    entry_at(now - chrono::Duration::days(10), 10),
                ],
            )
            .await;
        let app = create_router(test_state(cache));

        let response = app
            .oneshot(Request::builder().uri("/defi").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["defi_data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_current_price_serves_newest_cached_entry() {
        let now = Utc::now();
        let cache = SeriesCache::new(Duration::from_secs(60));
        cache
            .put(
                "top",
                vec![
                    entry_at(now, 42),
                    entry_at(now - chrono::Duration::hours(1), 41),
                ],
            )
            .await;
        let app = create_router(test_state(cache));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/top-current-price")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["indexPrice"], "42");
        assert_eq!(body["constituents"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_current_price_on_empty_series_is_404() {
        let cache = SeriesCache::new(Duration::from_secs(60));
        cache.put("top", vec![]).await;
        let app = create_router(test_state(cache));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/top-current-price")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("no price data"));
    }

    #[tokio::test]
    async fn test_store_failure_is_500_with_error_body() {
        // empty cache forces a read-through against the unreachable pool
        let app = create_router(test_state(SeriesCache::new(Duration::from_secs(60))));

        let response = app
            .oneshot(Request::builder().uri("/meme").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn test_health_lists_configured_indexes() {
        let app = create_router(test_state(SeriesCache::new(Duration::from_secs(60))));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let indexes = body["indexes"].as_array().unwrap();
        assert!(indexes.iter().any(|v| v == "defi"));
        assert!(indexes.iter().any(|v| v == "top"));
    }
}
