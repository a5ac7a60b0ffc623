//! Cart endpoints

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;
use shared::error::AppError;
use shared::models::{AddCartItemRequest, CartView, UpdateCartItemRequest};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::carts;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Serialize)]
pub struct CartResponse {
    pub cart: CartView,
}

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<CartResponse> {
    let cart = carts::get_cart_view(&state.pool, user.user_id).await?;
    Ok(Json(CartResponse { cart }))
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AddCartItemRequest>,
) -> ApiResult<CartResponse> {
    let quantity = req.quantity.unwrap_or(1);
    let cart = carts::add_item(&state.pool, user.user_id, req.product_id, quantity).await?;
    Ok(Json(CartResponse { cart }))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<Uuid>,
    Json(req): Json<UpdateCartItemRequest>,
) -> ApiResult<CartResponse> {
    let cart = carts::update_item(&state.pool, user.user_id, item_id, req.quantity).await?;
    Ok(Json(CartResponse { cart }))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<Uuid>,
) -> ApiResult<CartResponse> {
    let cart = carts::remove_item(&state.pool, user.user_id, item_id).await?;
    Ok(Json(CartResponse { cart }))
}

#[derive(Serialize)]
pub struct ClearCartResponse {
    pub message: &'static str,
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<ClearCartResponse> {
    carts::clear_cart(&state.pool, user.user_id).await?;
    Ok(Json(ClearCartResponse {
        message: "Cart cleared successfully",
    }))
}
