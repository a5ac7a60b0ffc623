//! Ledger store — wallets and wallet transactions
//!
//! The balance column is only ever touched by [`adjust_balance`], an atomic
//! increment guarded against going negative, and every adjustment happens in
//! the same transaction as the status change of the ledger entry that
//! authorizes it. A debit transaction reaches `completed` only in the atomic
//! unit that decrements the balance.

use rust_decimal::Decimal;
use shared::error::AppError;
use shared::models::{TransactionStatus, TransactionType, Wallet, WalletTransaction};
use shared::util::now_millis;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::ServiceResult;

/// Fetch a user's wallet
pub async fn get_wallet(pool: &PgPool, user_id: Uuid) -> Result<Option<Wallet>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Fetch a user's wallet inside a caller-owned transaction (no lock)
pub async fn find_wallet(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Wallet>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

/// Fetch a user's wallet with an exclusive row lock
pub async fn lock_wallet(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Wallet>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

/// Get the user's wallet, creating an empty one on first use
pub async fn get_or_create_wallet(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Wallet, sqlx::Error> {
    let now = now_millis();
    sqlx::query(
        "INSERT INTO wallets (id, user_id, balance, created_at, updated_at) \
         VALUES ($1, $2, 0, $3, $3) \
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await
}

/// Record a ledger entry against a wallet
pub async fn record_transaction(
    conn: &mut PgConnection,
    wallet_id: Uuid,
    amount: Decimal,
    tx_type: TransactionType,
    status: TransactionStatus,
    description: &str,
    order_id: Option<Uuid>,
) -> Result<WalletTransaction, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO wallet_transactions \
             (id, wallet_id, order_id, amount, type, status, description, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(wallet_id)
    .bind(order_id)
    .bind(amount)
    .bind(tx_type.as_db())
    .bind(status.as_db())
    .bind(description)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Atomically apply `delta` to the balance.
///
/// Returns the new balance, or `None` when the adjustment would drive the
/// balance negative (the row is left untouched). This is the only code path
/// that writes the balance column.
pub async fn adjust_balance(
    conn: &mut PgConnection,
    wallet_id: Uuid,
    delta: Decimal,
) -> Result<Option<Decimal>, sqlx::Error> {
    let row: Option<(Decimal,)> = sqlx::query_as(
        "UPDATE wallets SET balance = balance + $2, updated_at = $3 \
         WHERE id = $1 AND balance + $2 >= 0 \
         RETURNING balance",
    )
    .bind(wallet_id)
    .bind(delta)
    .bind(now_millis())
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|r| r.0))
}

/// Move a ledger entry to a new status
pub async fn set_transaction_status(
    conn: &mut PgConnection,
    transaction_id: Uuid,
    status: TransactionStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE wallet_transactions SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(transaction_id)
        .bind(status.as_db())
        .bind(now_millis())
        .execute(conn)
        .await?;
    Ok(())
}

/// Credit a wallet: completed credit entry + balance increment, one atomic unit.
/// Creates the wallet on first top-up.
pub async fn credit(
    pool: &PgPool,
    user_id: Uuid,
    amount: Decimal,
    description: &str,
) -> ServiceResult<(Decimal, WalletTransaction)> {
    let mut tx = pool.begin().await?;

    let wallet = get_or_create_wallet(&mut tx, user_id).await?;
    let entry = record_transaction(
        &mut tx,
        wallet.id,
        amount,
        TransactionType::Credit,
        TransactionStatus::Completed,
        description,
        None,
    )
    .await?;
    let balance = adjust_balance(&mut tx, wallet.id, amount)
        .await?
        .ok_or_else(|| AppError::invalid_amount())?;

    tx.commit().await?;
    Ok((balance, entry))
}

/// Debit a wallet: completed debit entry + guarded balance decrement, one
/// atomic unit. Fails with `InsufficientFunds` (and rolls back the entry)
/// when the balance cannot cover the amount.
pub async fn deduct(
    pool: &PgPool,
    user_id: Uuid,
    amount: Decimal,
    description: &str,
) -> ServiceResult<(Decimal, WalletTransaction)> {
    let mut tx = pool.begin().await?;

    let wallet = lock_wallet(&mut tx, user_id)
        .await?
        .ok_or_else(|| AppError::new(shared::error::ErrorCode::WalletNotFound))?;

    let Some(balance) = adjust_balance(&mut tx, wallet.id, -amount).await? else {
        return Err(AppError::insufficient_funds().into());
    };

    let entry = record_transaction(
        &mut tx,
        wallet.id,
        amount,
        TransactionType::Debit,
        TransactionStatus::Completed,
        description,
        None,
    )
    .await?;

    tx.commit().await?;
    Ok((balance, entry))
}

/// Most recent ledger entries for a wallet
pub async fn recent_transactions(
    pool: &PgPool,
    wallet_id: Uuid,
    limit: i64,
) -> Result<Vec<WalletTransaction>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM wallet_transactions WHERE wallet_id = $1 \
         ORDER BY created_at DESC LIMIT $2",
    )
    .bind(wallet_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Paginated ledger history for a wallet
pub async fn list_transactions(
    pool: &PgPool,
    wallet_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<WalletTransaction>, i64), sqlx::Error> {
    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM wallet_transactions WHERE wallet_id = $1")
            .bind(wallet_id)
            .fetch_one(pool)
            .await?;

    let rows: Vec<WalletTransaction> = sqlx::query_as(
        "SELECT * FROM wallet_transactions WHERE wallet_id = $1 \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(wallet_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}
