//! Wallet Model
//!
//! One wallet per user, non-negative balance. The balance is never edited
//! directly: every mutation happens through a paired transaction record so
//! the ledger stays auditable — at any settled point,
//! `balance == sum(completed credits) - sum(completed debits)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "credit" => Some(Self::Credit),
            "debit" => Some(Self::Debit),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

/// Ledger entry status — `completed` entries are immutable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Wallet entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Wallet transaction (ledger entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    /// Set on debits that originate from checkout
    pub order_id: Option<Uuid>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "db", sqlx(rename = "type"))]
    pub tx_type: String,
    pub status: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Wallet with recent transactions (API shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    #[serde(flatten)]
    pub wallet: Wallet,
    pub transactions: Vec<WalletTransaction>,
}

/// Top-up payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMoneyRequest {
    pub amount: Decimal,
}

/// Ad-hoc debit payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductMoneyRequest {
    pub amount: Decimal,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_and_status_roundtrip() {
        for t in [TransactionType::Credit, TransactionType::Debit] {
            assert_eq!(TransactionType::from_db(t.as_db()), Some(t));
        }
        for s in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
        ] {
            assert_eq!(TransactionStatus::from_db(s.as_db()), Some(s));
        }
        assert_eq!(TransactionType::from_db("refund"), None);
    }

    #[test]
    fn test_transaction_wire_format_uses_type_key() {
        let tx = WalletTransaction {
            id: Uuid::nil(),
            wallet_id: Uuid::nil(),
            order_id: None,
            amount: Decimal::new(1500, 2),
            tx_type: "debit".into(),
            status: "pending".into(),
            description: "Order payment".into(),
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"type\":\"debit\""));
        assert!(json.contains("\"walletId\""));
    }
}
