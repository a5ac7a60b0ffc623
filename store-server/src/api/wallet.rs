//! Wallet endpoints

use axum::extract::{Query, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::wallet::{AddMoneyRequest, DeductMoneyRequest, WalletView};
use shared::models::{Paginated, WalletTransaction};

use crate::auth::CurrentUser;
use crate::db::{self, wallets};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

const RECENT_TRANSACTIONS: i64 = 10;

pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<WalletView> {
    let wallet = wallets::get_wallet(&state.pool, user.user_id)
        .await
        .map_err(super::internal)?
        .ok_or_else(|| AppError::new(ErrorCode::WalletNotFound))?;

    let transactions = wallets::recent_transactions(&state.pool, wallet.id, RECENT_TRANSACTIONS)
        .await
        .map_err(super::internal)?;

    Ok(Json(WalletView {
        wallet,
        transactions,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub message: &'static str,
    pub balance: Decimal,
    pub transaction: WalletTransaction,
}

/// Creates the wallet on first top-up
pub async fn add_money(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AddMoneyRequest>,
) -> ApiResult<BalanceResponse> {
    if req.amount <= Decimal::ZERO {
        return Err(AppError::invalid_amount());
    }

    let (balance, transaction) = wallets::credit(
        &state.pool,
        user.user_id,
        req.amount,
        "Money added to wallet",
    )
    .await?;

    Ok(Json(BalanceResponse {
        message: "Money added successfully",
        balance,
        transaction,
    }))
}

pub async fn deduct_money(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<DeductMoneyRequest>,
) -> ApiResult<BalanceResponse> {
    if req.amount <= Decimal::ZERO {
        return Err(AppError::invalid_amount());
    }

    let description = req.description.as_deref().unwrap_or("Purchase payment");
    let (balance, transaction) =
        wallets::deduct(&state.pool, user.user_id, req.amount, description).await?;

    Ok(Json(BalanceResponse {
        message: "Payment successful",
        balance,
        transaction,
    }))
}

#[derive(Deserialize)]
pub struct ListTransactionsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Paginated<WalletTransaction>> {
    let wallet = wallets::get_wallet(&state.pool, user.user_id)
        .await
        .map_err(super::internal)?
        .ok_or_else(|| AppError::new(ErrorCode::WalletNotFound))?;

    let (page, limit, offset) = db::page_params(query.page, query.limit);
    let (transactions, total) = wallets::list_transactions(&state.pool, wallet.id, limit, offset)
        .await
        .map_err(super::internal)?;

    Ok(Json(Paginated::new(transactions, page, limit, total)))
}
