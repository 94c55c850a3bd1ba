//! 应用层：共享状态与路由

pub mod product;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::error;

use crate::core::middleware::request_logging_middleware;
use product::{handler, ProductRepository, ProductService};

#[derive(Clone)]
pub struct AppState {
    pub product_service: ProductService,
}

impl AppState {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            product_service: ProductService::new(repository),
        }
    }
}

/// 健康检查：存储可达返回 200，否则 503
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let repository = state.product_service.repository();

    let result = match repository.ping().await {
        Ok(()) => repository.count().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(count) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "storage": repository.kind(),
                "products": count,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "storage": repository.kind(),
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            )
        }
    }
}

/// 产品 API 路由
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/products",
            get(handler::list_products).post(handler::create_product),
        )
        .route(
            "/api/products/search-by-price-range",
            get(handler::search_by_price_range),
        )
        .route("/api/products/low-stock", get(handler::low_stock))
        .route("/api/products/statistics", get(handler::statistics))
        .route(
            "/api/products/:id",
            get(handler::get_product)
                .put(handler::replace_product)
                .delete(handler::delete_product),
        )
}

/// 创建完整路由（含中间件）
pub fn create_routes(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(product_routes())
        // 按顺序应用，最后添加的在最外层
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
