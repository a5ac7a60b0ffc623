//! Order Model
//!
//! Orders are created from a cart at checkout and settled asynchronously.
//! The status column is a strict state machine; every change goes through a
//! guarded compare-and-swap on the expected current status, which is what
//! makes duplicate settlement deliveries safe.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status
///
/// ```text
/// pending ──> processing ──> completed
///    │             └───────> failed
///    ├──> failed   (settlement rejected: insufficient funds, lost wallet)
///    └──> cancelled (user-initiated, only while still pending)
/// ```
///
/// `completed`, `failed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl OrderStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Is this a terminal status (no further transitions permitted)?
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Is `to` a legal next status from `self`?
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        match (self, to) {
            (Self::Pending, Self::Processing) => true,
            (Self::Pending, Self::Failed) => true,
            (Self::Pending, Self::Cancelled) => true,
            (Self::Processing, Self::Completed) => true,
            (Self::Processing, Self::Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_id: Uuid,
    pub status: String,
    pub total_amount: Decimal,
    pub payment_method: String,
    /// The wallet debit that pays for this order (set at checkout)
    pub transaction_id: Option<Uuid>,
    /// Recorded reason when settlement fails
    pub failure_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Denormalized product data captured at checkout time, so historical
/// orders are unaffected by later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Order line item with its product snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price snapshot carried over from the cart item
    pub price: Decimal,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub product_snapshot: ProductSnapshot,
    pub created_at: i64,
}

/// Order with its line items (API shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_db(s.as_db()), Some(s));
        }
        assert_eq!(OrderStatus::from_db("shipped"), None);
    }

    #[test]
    fn test_legal_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Failed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Failed));
    }

    #[test]
    fn test_illegal_transitions() {
        // Cancellation is only valid while still pending
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));

        // No skipping the settlement step
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));

        // No resurrection
        assert!(!OrderStatus::Failed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        let all = [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(
                    !from.can_transition_to(to),
                    "terminal {from} must not transition to {to}"
                );
            }
        }
    }

    #[test]
    fn test_self_transition_is_illegal() {
        for s in [OrderStatus::Pending, OrderStatus::Processing] {
            assert!(!s.can_transition_to(s));
        }
    }

    #[test]
    fn test_snapshot_serde() {
        let snap = ProductSnapshot {
            name: "Mechanical Keyboard".into(),
            description: Some("Tenkeyless, brown switches".into()),
            category: Some("Electronics".into()),
        };
        let json = serde_json::to_string(&snap).unwrap();
        let parsed: ProductSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snap);
    }
}
