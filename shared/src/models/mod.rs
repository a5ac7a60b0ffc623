//! Domain models shared across the workspace

pub mod cart;
pub mod order;
pub mod product;
pub mod wallet;

// Re-exports
pub use cart::{AddCartItemRequest, Cart, CartItemDetail, CartStatus, CartView, UpdateCartItemRequest};
pub use order::{Order, OrderItem, OrderStatus, OrderWithItems, ProductSnapshot};
pub use product::{Category, Product, ProductCreate, ProductStatus, ProductUpdate, ProductWithCategory};
pub use wallet::{
    AddMoneyRequest, DeductMoneyRequest, TransactionStatus, TransactionType, Wallet,
    WalletTransaction, WalletView,
};

use serde::{Deserialize, Serialize};

/// Paginated response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl<T> Paginated<T> {
    /// Build an envelope from a page of items and the total row count
    pub fn new(items: Vec<T>, page: i64, limit: i64, total_items: i64) -> Self {
        let total_pages = if limit > 0 {
            (total_items + limit - 1) / limit
        } else {
            0
        };
        Self {
            items,
            current_page: page,
            total_pages,
            total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_page_math() {
        let p = Paginated::new(vec![1, 2, 3], 1, 10, 23);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.total_items, 23);

        let p: Paginated<i32> = Paginated::new(vec![], 1, 10, 0);
        assert_eq!(p.total_pages, 0);

        let p = Paginated::new(vec![1], 2, 10, 20);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.current_page, 2);
    }
}
