//! Cart store
//!
//! One active cart per user (partial unique index). Item prices are
//! snapshotted at add time; the stored snapshot, not the live catalog
//! price, is what checkout totals against.

use shared::error::{AppError, ErrorCode};
use shared::models::cart::{cart_total, Cart, CartItemDetail, CartView};
use shared::util::now_millis;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::ServiceResult;

/// Fetch the user's active cart, if any
pub async fn find_active_cart(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Cart>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM carts WHERE user_id = $1 AND status = 'active'")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

/// Fetch the user's active cart, creating one on first use.
///
/// The partial unique index makes the insert race-safe: a concurrent insert
/// loses the conflict and both callers read the same row back.
pub async fn get_or_create_active_cart(pool: &PgPool, user_id: Uuid) -> Result<Cart, sqlx::Error> {
    let now = now_millis();
    sqlx::query(
        "INSERT INTO carts (id, user_id, status, created_at, updated_at) \
         VALUES ($1, $2, 'active', $3, $3) \
         ON CONFLICT (user_id) WHERE status = 'active' DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as("SELECT * FROM carts WHERE user_id = $1 AND status = 'active'")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Items of a cart joined with product details
pub async fn cart_items_detail(
    pool: &PgPool,
    cart_id: Uuid,
) -> Result<Vec<CartItemDetail>, sqlx::Error> {
    sqlx::query_as(
        "SELECT ci.id, ci.product_id, ci.quantity, ci.price, \
                p.name AS product_name, p.image AS product_image, c.name AS category \
         FROM cart_items ci \
         JOIN products p ON p.id = ci.product_id \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE ci.cart_id = $1 \
         ORDER BY ci.created_at",
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await
}

/// The user's active cart with items and computed total
pub async fn get_cart_view(pool: &PgPool, user_id: Uuid) -> ServiceResult<CartView> {
    let cart = get_or_create_active_cart(pool, user_id).await?;
    let items = cart_items_detail(pool, cart.id).await?;
    let total = cart_total(&items);
    Ok(CartView { cart, items, total })
}

/// Add a product to the active cart (or bump its quantity).
///
/// Re-adding an existing product refreshes the stored unit-price snapshot to
/// the current catalog price, matching what the user saw when adding.
pub async fn add_item(
    pool: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> ServiceResult<CartView> {
    if quantity < 1 {
        return Err(AppError::new(ErrorCode::InvalidQuantity).into());
    }

    let price: Option<(rust_decimal::Decimal,)> =
        sqlx::query_as("SELECT price FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    let Some((price,)) = price else {
        return Err(AppError::new(ErrorCode::ProductNotFound).into());
    };

    let cart = get_or_create_active_cart(pool, user_id).await?;

    let now = now_millis();
    sqlx::query(
        "INSERT INTO cart_items (id, cart_id, product_id, quantity, price, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $6) \
         ON CONFLICT (cart_id, product_id) DO UPDATE SET \
             quantity = cart_items.quantity + EXCLUDED.quantity, \
             price = EXCLUDED.price, \
             updated_at = EXCLUDED.updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(cart.id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .bind(now)
    .execute(pool)
    .await?;

    get_cart_view(pool, user_id).await
}

/// Change the quantity of an item in the user's active cart
pub async fn update_item(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    quantity: i32,
) -> ServiceResult<CartView> {
    if quantity < 1 {
        return Err(AppError::new(ErrorCode::InvalidQuantity).into());
    }

    let result = sqlx::query(
        "UPDATE cart_items SET quantity = $3, updated_at = $4 \
         WHERE id = $1 AND cart_id IN \
             (SELECT id FROM carts WHERE user_id = $2 AND status = 'active')",
    )
    .bind(item_id)
    .bind(user_id)
    .bind(quantity)
    .bind(now_millis())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::CartItemNotFound).into());
    }

    get_cart_view(pool, user_id).await
}

/// Remove an item from the user's active cart
pub async fn remove_item(pool: &PgPool, user_id: Uuid, item_id: Uuid) -> ServiceResult<CartView> {
    let result = sqlx::query(
        "DELETE FROM cart_items \
         WHERE id = $1 AND cart_id IN \
             (SELECT id FROM carts WHERE user_id = $2 AND status = 'active')",
    )
    .bind(item_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::CartItemNotFound).into());
    }

    get_cart_view(pool, user_id).await
}

/// Remove every item from the user's active cart
pub async fn clear_cart(pool: &PgPool, user_id: Uuid) -> ServiceResult<()> {
    let mut conn = pool.acquire().await?;
    let cart = find_active_cart(&mut conn, user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartNotFound))?;

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(pool)
        .await?;

    Ok(())
}
