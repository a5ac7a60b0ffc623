//! Durable queue message payloads
//!
//! Wire formats are fixed: settlement messages carry `{"orderId": ...}` and
//! index-sync messages carry `{"action": ..., "productId": ...}`. Consumers
//! re-read authoritative state from the relational store, so payloads stay
//! minimal on purpose.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queue name for order settlement messages
pub const SETTLEMENT_QUEUE: &str = "order_settlement";

/// Queue name for search index sync messages
pub const INDEX_SYNC_QUEUE: &str = "index_sync";

/// Settlement message — enqueued once per order, after checkout commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementMessage {
    pub order_id: Uuid,
}

/// Index sync action kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexAction {
    Index,
    Update,
    Delete,
}

/// Index sync message — enqueued after every product mutation commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSyncMessage {
    pub action: IndexAction,
    pub product_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_wire_format() {
        let msg = SettlementMessage {
            order_id: Uuid::nil(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"orderId":"00000000-0000-0000-0000-000000000000"}"#
        );
    }

    #[test]
    fn test_index_sync_wire_format() {
        let msg = IndexSyncMessage {
            action: IndexAction::Update,
            product_id: Uuid::nil(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""action":"update""#));
        assert!(json.contains(r#""productId""#));

        let parsed: IndexSyncMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_index_action_values() {
        for (action, s) in [
            (IndexAction::Index, "\"index\""),
            (IndexAction::Update, "\"update\""),
            (IndexAction::Delete, "\"delete\""),
        ] {
            assert_eq!(serde_json::to_string(&action).unwrap(), s);
        }
    }
}
