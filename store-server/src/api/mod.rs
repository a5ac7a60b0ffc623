//! API routes for store-server

pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod wallet;

use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;
use shared::error::AppError;

/// Map an infrastructure error to an opaque 500, logging the detail
pub(crate) fn internal(e: impl std::fmt::Display) -> AppError {
    tracing::error!(error = %e, "Store operation failed");
    AppError::new(shared::error::ErrorCode::InternalError)
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Catalog reads are public
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/products", get(products::list_products))
        .route("/api/products/search", get(products::search_products))
        .route("/api/products/categories", get(products::list_categories))
        .route("/api/products/{id}", get(products::get_product));

    // Everything that touches a user's cart, orders or wallet — and catalog
    // mutations — requires the auth service's JWT
    let authenticated = Router::new()
        .route("/api/products", post(products::create_product))
        .route(
            "/api/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/api/orders", post(orders::checkout).get(orders::list_orders))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/cancel", post(orders::cancel_order))
        .route("/api/wallet", get(wallet::get_wallet))
        .route("/api/wallet/add", post(wallet::add_money))
        .route("/api/wallet/deduct", post(wallet::deduct_money))
        .route("/api/wallet/transactions", get(wallet::list_transactions))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
