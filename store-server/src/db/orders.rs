//! Order store
//!
//! Orders are never deleted, only transitioned. Every status change goes
//! through [`transition`], a guarded compare-and-swap on the expected
//! current status; a concurrent (or duplicate) actor finds zero rows
//! affected and backs off instead of double-processing.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderItem, OrderStatus, OrderWithItems, Paginated, ProductSnapshot};
use shared::models::TransactionStatus;
use shared::util::now_millis;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::wallets;
use crate::error::ServiceResult;

/// Insert a new pending order
pub async fn create_order(
    conn: &mut PgConnection,
    user_id: Uuid,
    cart_id: Uuid,
    total_amount: Decimal,
) -> Result<Order, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO orders \
             (id, user_id, cart_id, status, total_amount, payment_method, created_at, updated_at) \
         VALUES ($1, $2, $3, 'pending', $4, 'wallet', $5, $5) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(cart_id)
    .bind(total_amount)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Link the order to its paying wallet transaction
pub async fn set_transaction_ref(
    conn: &mut PgConnection,
    order_id: Uuid,
    transaction_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET transaction_id = $2, updated_at = $3 WHERE id = $1")
        .bind(order_id)
        .bind(transaction_id)
        .bind(now_millis())
        .execute(conn)
        .await?;
    Ok(())
}

/// Insert an order line item with its product snapshot
pub async fn insert_order_item(
    conn: &mut PgConnection,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
    snapshot: &ProductSnapshot,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO order_items \
             (id, order_id, product_id, quantity, price, product_snapshot, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .bind(sqlx::types::Json(snapshot))
    .bind(now_millis())
    .fetch_one(conn)
    .await
}

/// Fetch an order with an exclusive row lock (settlement path)
pub async fn lock_order(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(conn)
        .await
}

/// Guarded compare-and-swap status transition.
///
/// Returns `false` (no rows touched) when the order's current status no
/// longer matches `from` — the caller observed stale state.
pub async fn transition(
    conn: &mut PgConnection,
    order_id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<bool, sqlx::Error> {
    transition_with_reason(conn, order_id, from, to, None).await
}

/// CAS transition that also records a failure reason
pub async fn transition_with_reason(
    conn: &mut PgConnection,
    order_id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
    reason: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders \
         SET status = $3, failure_reason = COALESCE($4, failure_reason), updated_at = $5 \
         WHERE id = $1 AND status = $2",
    )
    .bind(order_id)
    .bind(from.as_db())
    .bind(to.as_db())
    .bind(reason)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Line items for one order
pub async fn order_items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

/// Fetch one of the user's orders with its items
pub async fn find_order(
    pool: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
) -> Result<Option<OrderWithItems>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    let Some(order) = order else {
        return Ok(None);
    };

    let items = order_items(pool, order.id).await?;
    Ok(Some(OrderWithItems { order, items }))
}

/// Paginated order history for a user, optionally filtered by status
pub async fn list_orders(
    pool: &PgPool,
    user_id: Uuid,
    page: i64,
    limit: i64,
    offset: i64,
    status: Option<OrderStatus>,
) -> Result<Paginated<OrderWithItems>, sqlx::Error> {
    let status_db = status.map(|s| s.as_db());

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)",
    )
    .bind(user_id)
    .bind(status_db)
    .fetch_one(pool)
    .await?;

    let orders: Vec<Order> = sqlx::query_as(
        "SELECT * FROM orders \
         WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) \
         ORDER BY created_at DESC \
         LIMIT $3 OFFSET $4",
    )
    .bind(user_id)
    .bind(status_db)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let all_items: Vec<OrderItem> = sqlx::query_as(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY created_at",
    )
    .bind(&order_ids)
    .fetch_all(pool)
    .await?;

    let items = orders
        .into_iter()
        .map(|order| {
            let items = all_items
                .iter()
                .filter(|i| i.order_id == order.id)
                .cloned()
                .collect();
            OrderWithItems { order, items }
        })
        .collect();

    Ok(Paginated::new(items, page, limit, total))
}

/// User-initiated cancellation — only valid while the order is still pending.
///
/// No refund is needed: a pending order has reserved nothing, its debit
/// transaction is still `pending`. The entry is marked `failed` so the
/// ledger shows the debit never happened.
pub async fn cancel_order(
    pool: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<OrderWithItems> {
    let mut tx = pool.begin().await?;

    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(order) = order else {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    };

    let cancelled = transition(
        &mut tx,
        order.id,
        OrderStatus::Pending,
        OrderStatus::Cancelled,
    )
    .await?;
    if !cancelled {
        return Err(AppError::new(ErrorCode::OrderNotCancellable)
            .with_detail("status", order.status.clone())
            .into());
    }

    if let Some(transaction_id) = order.transaction_id {
        wallets::set_transaction_status(&mut tx, transaction_id, TransactionStatus::Failed).await?;
    }

    tx.commit().await?;

    tracing::info!(order_id = %order_id, "Order cancelled");

    find_order(pool, order_id, user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).into())
}
