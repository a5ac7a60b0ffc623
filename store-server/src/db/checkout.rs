//! Checkout — converts the active cart into a pending order
//!
//! One atomic unit: pending debit transaction, order, snapshot line items,
//! cart flipped to `converted`. The settlement message is enqueued by the
//! caller strictly AFTER this transaction commits, so the queue can never
//! reference an order that failed to exist.
//!
//! The wallet balance here is a pre-check only, not a reservation: two
//! concurrent checkouts can both pass it, and the settlement worker's
//! re-validation under row locks is what decides who actually gets the funds.

use rust_decimal::Decimal;
use shared::error::AppError;
use shared::models::{
    CartStatus, OrderWithItems, ProductSnapshot, TransactionStatus, TransactionType,
};
use shared::util::now_millis;
use sqlx::PgPool;
use uuid::Uuid;

use super::{carts, orders, wallets};
use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
struct CheckoutItemRow {
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
    product_name: String,
    product_description: Option<String>,
    category: Option<String>,
}

/// Validate the active cart, pre-check funds and create a pending order
pub async fn checkout(pool: &PgPool, user_id: Uuid) -> ServiceResult<OrderWithItems> {
    let mut tx = pool.begin().await?;

    // 1. Active cart with items
    let Some(cart) = carts::find_active_cart(&mut tx, user_id).await? else {
        return Err(AppError::cart_empty().into());
    };

    let rows: Vec<CheckoutItemRow> = sqlx::query_as(
        "SELECT ci.product_id, ci.quantity, ci.price, \
                p.name AS product_name, p.description AS product_description, \
                c.name AS category \
         FROM cart_items ci \
         JOIN products p ON p.id = ci.product_id \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE ci.cart_id = $1 \
         ORDER BY ci.created_at",
    )
    .bind(cart.id)
    .fetch_all(&mut *tx)
    .await?;

    if rows.is_empty() {
        return Err(AppError::cart_empty().into());
    }

    // 2. Total from the unit-price snapshots stored on the cart items,
    //    immune to concurrent catalog price edits
    let total: Decimal = rows
        .iter()
        .map(|r| r.price * Decimal::from(r.quantity))
        .sum();

    // 3. Balance pre-check (not a reservation)
    let wallet = wallets::find_wallet(&mut tx, user_id).await?;
    let wallet = match wallet {
        Some(w) if w.balance >= total => w,
        _ => return Err(AppError::insufficient_funds().into()),
    };

    // 4. Order + pending debit + snapshot items + cart converted
    let mut order = orders::create_order(&mut tx, user_id, cart.id, total).await?;

    let entry = wallets::record_transaction(
        &mut tx,
        wallet.id,
        total,
        TransactionType::Debit,
        TransactionStatus::Pending,
        "Order payment",
        Some(order.id),
    )
    .await?;
    orders::set_transaction_ref(&mut tx, order.id, entry.id).await?;
    order.transaction_id = Some(entry.id);

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        let snapshot = ProductSnapshot {
            name: row.product_name.clone(),
            description: row.product_description.clone(),
            category: row.category.clone(),
        };
        let item = orders::insert_order_item(
            &mut tx,
            order.id,
            row.product_id,
            row.quantity,
            row.price,
            &snapshot,
        )
        .await?;
        items.push(item);
    }

    sqlx::query("UPDATE carts SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(cart.id)
        .bind(CartStatus::Converted.as_db())
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user_id,
        total = %total,
        "Order created from cart"
    );

    Ok(OrderWithItems { order, items })
}
