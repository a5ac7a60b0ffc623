//! Durable queue service and consumer workers
//!
//! `QueueService` is the single owned handle to the durable queue — it is
//! constructed with the connection pool, lives in `AppState`, and is passed
//! to the orchestrator and workers explicitly. Its lifecycle is the pool's
//! lifecycle; there is no ambient channel singleton to reconnect.

pub mod index_sync;
pub mod settlement;

use shared::queue::{
    IndexAction, IndexSyncMessage, SettlementMessage, INDEX_SYNC_QUEUE, SETTLEMENT_QUEUE,
};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::db::queue::{self as queue_db, QueueMessage};
use crate::error::ServiceResult;

/// Lease window for a claimed message; a crashed consumer's message becomes
/// deliverable again once this expires
pub const CLAIM_LEASE_MS: i64 = 60_000;

/// Idle poll interval for consumer loops
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed redelivery backoff after a failed delivery
pub const RETRY_BACKOFF_MS: i64 = 5_000;

/// Settlement deliveries before a message is dead-lettered
pub const SETTLEMENT_MAX_ATTEMPTS: i32 = 5;

/// Bound on a settlement transactional scope
pub const SETTLEMENT_TX_TIMEOUT: Duration = Duration::from_secs(30);

/// Owned handle to the durable queue
#[derive(Clone)]
pub struct QueueService {
    pool: PgPool,
}

impl QueueService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a settlement message for a committed order
    pub async fn enqueue_settlement(&self, order_id: Uuid) -> ServiceResult<()> {
        let payload = serde_json::to_value(SettlementMessage { order_id })?;
        let mut conn = self.pool.acquire().await?;
        let id = queue_db::enqueue(&mut conn, SETTLEMENT_QUEUE, &payload).await?;
        tracing::debug!(order_id = %order_id, message_id = id, "Settlement message enqueued");
        Ok(())
    }

    /// Enqueue an index-sync message for a committed product mutation
    pub async fn enqueue_index_sync(
        &self,
        action: IndexAction,
        product_id: Uuid,
    ) -> ServiceResult<()> {
        let payload = serde_json::to_value(IndexSyncMessage { action, product_id })?;
        let mut conn = self.pool.acquire().await?;
        let id = queue_db::enqueue(&mut conn, INDEX_SYNC_QUEUE, &payload).await?;
        tracing::debug!(product_id = %product_id, message_id = id, "Index sync message enqueued");
        Ok(())
    }

    /// Claim the next due message from a queue, if any
    pub async fn claim(&self, queue: &str) -> Result<Option<QueueMessage>, sqlx::Error> {
        queue_db::claim(&self.pool, queue, CLAIM_LEASE_MS).await
    }

    /// Acknowledge a processed message
    pub async fn ack(&self, id: i64) -> Result<(), sqlx::Error> {
        queue_db::ack(&self.pool, id).await
    }

    /// Redeliver after the fixed backoff, counting the failure
    pub async fn nack(&self, id: i64) -> Result<(), sqlx::Error> {
        queue_db::nack(&self.pool, id, RETRY_BACKOFF_MS).await
    }

    /// Dead-letter a poison message
    pub async fn bury(&self, id: i64) -> Result<(), sqlx::Error> {
        queue_db::bury(&self.pool, id).await
    }
}
