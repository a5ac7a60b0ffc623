//! Catalog endpoints
//!
//! Reads are public and cached. Mutations invalidate the cache and enqueue
//! an index-sync message AFTER their own write has committed — indexing is
//! never part of the store's transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Category, Product, ProductCreate, ProductStatus, ProductUpdate};
use shared::queue::IndexAction;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::cache::DEFAULT_TTL;
use crate::db::{self, products};
use crate::db::products::{ProductListFilter, SortField};
use crate::search::SearchHit;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<serde_json::Value> {
    let status = match &query.status {
        Some(s) => ProductStatus::from_db(s)
            .ok_or_else(|| AppError::validation(format!("Unknown product status: {s}")))?,
        None => ProductStatus::Available,
    };
    let sort_by = match &query.sort_by {
        Some(s) => SortField::parse(s)
            .ok_or_else(|| AppError::validation(format!("Unknown sort field: {s}")))?,
        None => SortField::Name,
    };
    let descending = matches!(query.order.as_deref(), Some("DESC") | Some("desc"));

    let (page, limit, offset) = db::page_params(query.page, query.limit);
    let filter = ProductListFilter {
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
        status,
        sort_by,
        descending,
    };

    let cache_key = format!(
        "products:page{page}:limit{limit}:cat{}:min{}:max{}:status{}:sort{:?}{}",
        filter.category.as_deref().unwrap_or("-"),
        filter.min_price.unwrap_or_default(),
        filter.max_price.unwrap_or_default(),
        filter.status.as_db(),
        filter.sort_by,
        if descending { ":desc" } else { ":asc" },
    );
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json(cached));
    }

    let result = products::list_products(&state.pool, &filter, page, limit, offset)
        .await
        .map_err(super::internal)?;

    let value = serde_json::to_value(&result).map_err(super::internal)?;
    state.cache.set(cache_key, value.clone(), DEFAULT_TTL);
    Ok(Json(value))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let cache_key = format!("product:{product_id}");
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json(cached));
    }

    let product = products::get_product(&state.pool, product_id)
        .await
        .map_err(super::internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    let value = serde_json::to_value(&product).map_err(super::internal)?;
    state.cache.set(cache_key, value.clone(), DEFAULT_TTL);
    Ok(Json(value))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub products: Vec<SearchHit>,
    pub total: usize,
}

pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<serde_json::Value> {
    let text = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::SearchQueryMissing))?;
    let limit = query.limit.unwrap_or(20).min(100);

    let cache_key = format!("search:{text}:limit{limit}");
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json(cached));
    }

    let products = state.search.search(text, limit);
    let response = SearchResponse {
        total: products.len(),
        products,
    };

    let value = serde_json::to_value(&response).map_err(super::internal)?;
    state.cache.set(cache_key, value.clone(), DEFAULT_TTL);
    Ok(Json(value))
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    const CACHE_KEY: &str = "categories:all";
    if let Some(cached) = state.cache.get(CACHE_KEY) {
        return Ok(Json(cached));
    }

    let categories: Vec<Category> = products::list_categories(&state.pool)
        .await
        .map_err(super::internal)?;

    let value = serde_json::to_value(&categories).map_err(super::internal)?;
    state.cache.set(CACHE_KEY, value.clone(), DEFAULT_TTL);
    Ok(Json(value))
}

/// Drop every cached view that a product mutation can invalidate
fn invalidate_product_cache(state: &AppState) {
    for pattern in ["products:*", "product:*", "categories:*", "search:*"] {
        state.cache.invalidate_pattern(pattern);
    }
}

/// Enqueue the post-commit index sync; the mutation itself has already
/// succeeded, so a queue failure only delays convergence
async fn queue_index_sync(state: &AppState, action: IndexAction, product_id: Uuid) {
    if let Err(e) = state.queue.enqueue_index_sync(action, product_id).await {
        tracing::error!(product_id = %product_id, error = %e, "Failed to enqueue index sync");
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Json(data): Json<ProductCreate>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    if data.price < Decimal::ZERO {
        return Err(AppError::validation("Price must not be negative"));
    }

    let product = products::create_product(&state.pool, &data).await?;

    invalidate_product_cache(&state);
    queue_index_sync(&state, IndexAction::Index, product.id).await;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(product_id): Path<Uuid>,
    Json(data): Json<ProductUpdate>,
) -> ApiResult<Product> {
    if data.price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::validation("Price must not be negative"));
    }

    let product = products::update_product(&state.pool, product_id, &data).await?;

    invalidate_product_cache(&state);
    queue_index_sync(&state, IndexAction::Update, product.id).await;

    Ok(Json(product))
}

#[derive(Serialize)]
pub struct DeleteProductResponse {
    pub message: &'static str,
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<DeleteProductResponse> {
    products::delete_product(&state.pool, product_id).await?;

    invalidate_product_cache(&state);
    queue_index_sync(&state, IndexAction::Delete, product_id).await;

    Ok(Json(DeleteProductResponse {
        message: "Product deleted successfully",
    }))
}
