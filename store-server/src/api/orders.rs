//! Order endpoints: checkout, history, cancellation

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{OrderStatus, OrderWithItems, Paginated};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::{self, checkout, orders};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order: OrderWithItems,
    pub message: &'static str,
}

/// The settlement message is enqueued only after the checkout transaction
/// has committed; the response always carries a `pending` order because
/// settlement is asynchronous from the client's perspective.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    let order = checkout::checkout(&state.pool, user.user_id).await?;

    state.queue.enqueue_settlement(order.order.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order,
            message: "Order placed successfully",
        }),
    ))
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Paginated<OrderWithItems>> {
    let status = match &query.status {
        Some(s) => Some(OrderStatus::from_db(s).ok_or_else(|| {
            AppError::validation(format!("Unknown order status: {s}"))
        })?),
        None => None,
    };

    let (page, limit, offset) = db::page_params(query.page, query.limit);
    let result = orders::list_orders(&state.pool, user.user_id, page, limit, offset, status)
        .await
        .map_err(super::internal)?;
    Ok(Json(result))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<OrderWithItems> {
    let order = orders::find_order(&state.pool, order_id, user.user_id)
        .await
        .map_err(super::internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(order))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub order: OrderWithItems,
    pub message: &'static str,
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<CancelResponse> {
    let order = orders::cancel_order(&state.pool, order_id, user.user_id).await?;
    Ok(Json(CancelResponse {
        order,
        message: "Order cancelled successfully",
    }))
}
