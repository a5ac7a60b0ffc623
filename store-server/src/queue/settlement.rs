//! Settlement worker — debits the wallet to finalize pending orders
//!
//! A sequential consumer: one in-flight message per worker process, which
//! bounds contention on hot wallets. Scaling out means running more worker
//! processes; SKIP LOCKED claims and row locks keep them correct against
//! each other.
//!
//! Locks are always taken order row first, then wallet row, so two
//! settlements touching the same wallet cannot deadlock.

use shared::models::{OrderStatus, TransactionStatus, TransactionType};
use shared::queue::{SettlementMessage, SETTLEMENT_QUEUE};
use sqlx::PgPool;
use uuid::Uuid;

use super::{POLL_INTERVAL, SETTLEMENT_MAX_ATTEMPTS, SETTLEMENT_TX_TIMEOUT};
use crate::db::queue::QueueMessage;
use crate::db::{orders, wallets};
use crate::error::ServiceResult;
use crate::state::AppState;

/// Terminal result of one settlement attempt
#[derive(Debug, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Funds debited, order moved to processing
    Settled,
    /// Funds no longer cover the total; order failed, balance untouched
    InsufficientFunds,
    /// No wallet exists for the order's user; order failed
    WalletMissing,
    /// The order row does not exist and never will
    OrderMissing,
    /// Duplicate delivery: the order already left `pending`
    AlreadySettled,
}

/// Long-running settlement consumer loop
pub async fn run(state: AppState) {
    tracing::info!("Settlement worker started");
    loop {
        match state.queue.claim(SETTLEMENT_QUEUE).await {
            Ok(Some(msg)) => handle_message(&state, msg).await,
            Ok(None) => tokio::time::sleep(POLL_INTERVAL).await,
            Err(e) => {
                tracing::error!(error = %e, "Settlement claim failed");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }
}

async fn handle_message(state: &AppState, msg: QueueMessage) {
    let parsed: SettlementMessage = match serde_json::from_value(msg.payload.clone()) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(message_id = msg.id, error = %e, "Unparseable settlement payload, dead-lettering");
            log_queue_result(state.queue.bury(msg.id).await);
            return;
        }
    };

    let order_id = parsed.order_id;
    tracing::info!(order_id = %order_id, attempt = msg.attempts + 1, "Processing settlement");

    let result = tokio::time::timeout(SETTLEMENT_TX_TIMEOUT, settle_order(&state.pool, order_id)).await;

    match result {
        Ok(Ok(outcome)) => {
            match &outcome {
                SettlementOutcome::Settled => {
                    tracing::info!(order_id = %order_id, "Order settled")
                }
                SettlementOutcome::InsufficientFunds => {
                    tracing::warn!(order_id = %order_id, "Settlement rejected: insufficient funds")
                }
                SettlementOutcome::WalletMissing => {
                    tracing::warn!(order_id = %order_id, "Settlement rejected: wallet not found")
                }
                SettlementOutcome::OrderMissing => {
                    tracing::error!(order_id = %order_id, "Order not found, dropping message")
                }
                SettlementOutcome::AlreadySettled => {
                    tracing::info!(order_id = %order_id, "Order already settled, duplicate delivery")
                }
            }
            log_queue_result(state.queue.ack(msg.id).await);
        }
        Ok(Err(e)) => {
            tracing::error!(order_id = %order_id, error = %e, "Settlement failed, will retry");
            retry_or_bury(state, &msg).await;
        }
        Err(_) => {
            tracing::error!(order_id = %order_id, "Settlement transaction timed out, will retry");
            retry_or_bury(state, &msg).await;
        }
    }
}

/// `attempts` counts failed deliveries; the delivery that just failed makes
/// one more
fn retries_exhausted(attempts: i32) -> bool {
    attempts + 1 >= SETTLEMENT_MAX_ATTEMPTS
}

/// Redeliver with backoff, or dead-letter once the attempt budget is spent
async fn retry_or_bury(state: &AppState, msg: &QueueMessage) {
    if retries_exhausted(msg.attempts) {
        tracing::error!(
            message_id = msg.id,
            attempts = msg.attempts + 1,
            "Settlement retries exhausted, dead-lettering"
        );
        log_queue_result(state.queue.bury(msg.id).await);
    } else {
        log_queue_result(state.queue.nack(msg.id).await);
    }
}

fn log_queue_result(result: Result<(), sqlx::Error>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Queue operation failed");
    }
}

/// Settle one order inside a single transactional scope.
///
/// Terminal business failures (insufficient funds, missing wallet) commit
/// their order transition and are acknowledged; only infrastructure errors
/// bubble up as `Err` for redelivery. Duplicate deliveries fall out of the
/// status guard as `AlreadySettled`.
pub async fn settle_order(pool: &PgPool, order_id: Uuid) -> ServiceResult<SettlementOutcome> {
    let mut tx = pool.begin().await?;

    // Lock order first, then wallet
    let Some(order) = orders::lock_order(&mut tx, order_id).await? else {
        return Ok(SettlementOutcome::OrderMissing);
    };

    if OrderStatus::from_db(&order.status) != Some(OrderStatus::Pending) {
        return Ok(SettlementOutcome::AlreadySettled);
    }

    let Some(wallet) = wallets::lock_wallet(&mut tx, order.user_id).await? else {
        fail_order(&mut tx, &order, "Wallet not found").await?;
        tx.commit().await?;
        return Ok(SettlementOutcome::WalletMissing);
    };

    // Re-validate under the lock: funds may have moved since the
    // checkout-time pre-check
    if wallet.balance < order.total_amount
        || wallets::adjust_balance(&mut tx, wallet.id, -order.total_amount)
            .await?
            .is_none()
    {
        fail_order(&mut tx, &order, "Insufficient wallet balance").await?;
        tx.commit().await?;
        return Ok(SettlementOutcome::InsufficientFunds);
    }

    // The debit is authorized: complete the pending ledger entry in the same
    // atomic unit as the balance decrement
    match order.transaction_id {
        Some(transaction_id) => {
            wallets::set_transaction_status(&mut tx, transaction_id, TransactionStatus::Completed)
                .await?;
        }
        None => {
            let entry = wallets::record_transaction(
                &mut tx,
                wallet.id,
                order.total_amount,
                TransactionType::Debit,
                TransactionStatus::Completed,
                "Order payment",
                Some(order.id),
            )
            .await?;
            orders::set_transaction_ref(&mut tx, order.id, entry.id).await?;
        }
    }

    let moved = orders::transition(
        &mut tx,
        order.id,
        OrderStatus::Pending,
        OrderStatus::Processing,
    )
    .await?;
    if !moved {
        return Err(shared::error::AppError::stale_state("order left pending during settlement").into());
    }

    tx.commit().await?;
    Ok(SettlementOutcome::Settled)
}

/// Terminal business failure: order -> failed with reason, pending ledger
/// entry marked failed, balance untouched
async fn fail_order(
    tx: &mut sqlx::PgConnection,
    order: &shared::models::Order,
    reason: &str,
) -> Result<(), sqlx::Error> {
    orders::transition_with_reason(
        tx,
        order.id,
        OrderStatus::Pending,
        OrderStatus::Failed,
        Some(reason),
    )
    .await?;
    if let Some(transaction_id) = order.transaction_id {
        wallets::set_transaction_status(tx, transaction_id, TransactionStatus::Failed).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget_boundary() {
        // A fresh message can always fail at least once more
        assert!(!retries_exhausted(0));
        // One attempt left before the cap: this failure is the last
        assert!(retries_exhausted(SETTLEMENT_MAX_ATTEMPTS - 1));
        assert!(!retries_exhausted(SETTLEMENT_MAX_ATTEMPTS - 2));
    }

    #[test]
    fn test_duplicate_delivery_is_detected_by_status_guard() {
        // The worker treats any non-pending status as AlreadySettled; the
        // state machine guarantees those states never return to pending
        for status in ["processing", "completed", "failed", "cancelled"] {
            let parsed = OrderStatus::from_db(status).unwrap();
            assert_ne!(parsed, OrderStatus::Pending);
            assert!(!parsed.can_transition_to(OrderStatus::Pending));
        }
    }
}
