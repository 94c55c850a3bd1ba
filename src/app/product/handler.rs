//! 产品 HTTP 处理器

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::model::{Product, ProductPayload, StatisticsReport};
use super::query::ProductFilter;
use crate::app::AppState;
use crate::core::{error::CoreError, response::ApiResponse};

/// 价格区间查询参数，两端都必须提供
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeQuery {
    pub min_price: Decimal,
    pub max_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

fn path_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, CoreError> {
    path.map(|Path(id)| id)
        .map_err(|e| CoreError::BadRequest(format!("Invalid product id: {}", e.body_text())))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, CoreError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| CoreError::BadRequest(e.body_text()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, CoreError> {
    body.map(|Json(b)| b)
        .map_err(|e| CoreError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))
}

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Product>>>, CoreError> {
    let filter = query_params(query)?;
    let products = state.product_service.list_products(&filter).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<Product>>, CoreError> {
    let id = path_id(path)?;
    let product = state.product_service.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<Response, CoreError> {
    let payload = json_body(body)?;
    let product = state.product_service.create_product(payload).await?;
    let location = format!("/api/products/{}", product.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ApiResponse::success(product)),
    )
        .into_response())
}

/// PUT /api/products/:id
pub async fn replace_product(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<StatusCode, CoreError> {
    let id = path_id(path)?;
    let payload = json_body(body)?;
    state.product_service.replace_product(id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, CoreError> {
    let id = path_id(path)?;
    state.product_service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/products/search-by-price-range
pub async fn search_by_price_range(
    State(state): State<AppState>,
    query: Result<Query<PriceRangeQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Product>>>, CoreError> {
    let range = query_params(query)?;
    let products = state
        .product_service
        .search_by_price_range(range.min_price, range.max_price)
        .await?;
    Ok(Json(ApiResponse::success(products)))
}

/// GET /api/products/low-stock
pub async fn low_stock(
    State(state): State<AppState>,
    query: Result<Query<LowStockQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Product>>>, CoreError> {
    let params = query_params(query)?;
    let products = state.product_service.low_stock(params.threshold).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// GET /api/products/statistics
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatisticsReport>>, CoreError> {
    let report = state.product_service.statistics().await?;
    Ok(Json(ApiResponse::success(report)))
}
