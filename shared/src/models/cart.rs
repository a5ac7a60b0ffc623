//! Cart Model
//!
//! Each user has at most one `active` cart at a time (enforced by a partial
//! unique index). Checkout flips the cart to `converted`, after which it is
//! immutable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cart lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    Active,
    Converted,
    Abandoned,
}

impl CartStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "converted" => Some(Self::Converted),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Converted => "converted",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Cart entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Cart line item with product details (API shape)
///
/// `price` is the unit-price snapshot taken when the item was added; the
/// checkout total is computed from it, never from the live catalog price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartItemDetail {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub product_name: String,
    pub product_image: Option<String>,
    pub category: Option<String>,
}

impl CartItemDetail {
    /// Line subtotal: unit-price snapshot x quantity
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Active cart with items and computed total (API shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartItemDetail>,
    pub total: Decimal,
}

/// Sum of line subtotals over the price snapshots stored on the items
pub fn cart_total(items: &[CartItemDetail]) -> Decimal {
    items.iter().map(CartItemDetail::subtotal).sum()
}

/// Add-to-cart payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: Option<i32>,
}

/// Update-quantity payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(price: &str, quantity: i32) -> CartItemDetail {
        CartItemDetail {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            price: Decimal::from_str(price).unwrap(),
            product_name: "x".into(),
            product_image: None,
            category: None,
        }
    }

    #[test]
    fn test_cart_total() {
        let items = vec![item("19.99", 2), item("5.00", 3)];
        assert_eq!(cart_total(&items), Decimal::from_str("54.98").unwrap());
    }

    #[test]
    fn test_cart_total_empty() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_subtotal_is_exact_decimal_math() {
        // 0.1 * 3 must be exactly 0.3, not a float approximation
        let i = item("0.10", 3);
        assert_eq!(i.subtotal(), Decimal::from_str("0.30").unwrap());
    }

    #[test]
    fn test_status_db_roundtrip() {
        for s in [CartStatus::Active, CartStatus::Converted, CartStatus::Abandoned] {
            assert_eq!(CartStatus::from_db(s.as_db()), Some(s));
        }
        assert_eq!(CartStatus::from_db("archived"), None);
    }
}
