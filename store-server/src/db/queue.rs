//! Durable queue rows
//!
//! The `queue_messages` table is the durable, at-least-once message queue.
//! A claim leases the next due row via `FOR UPDATE SKIP LOCKED` and pushes
//! `available_at` past the lease window, so a crashed consumer's message
//! becomes deliverable again once the lease expires. Ack deletes the row,
//! nack reschedules it, bury dead-letters it.

use shared::util::now_millis;
use sqlx::{PgConnection, PgPool};

/// A claimed queue message
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub id: i64,
    pub payload: serde_json::Value,
    /// Number of failed deliveries so far
    pub attempts: i32,
}

/// Insert a message, immediately deliverable
pub async fn enqueue(
    conn: &mut PgConnection,
    queue: &str,
    payload: &serde_json::Value,
) -> Result<i64, sqlx::Error> {
    let now = now_millis();
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO queue_messages (queue, payload, available_at, created_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(queue)
    .bind(payload)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(row.0)
}

/// Claim the next due message, leasing it for `lease_ms`.
///
/// Returns `None` when the queue has no deliverable message. SKIP LOCKED
/// keeps concurrent worker processes from claiming the same row.
pub async fn claim(
    pool: &PgPool,
    queue: &str,
    lease_ms: i64,
) -> Result<Option<QueueMessage>, sqlx::Error> {
    let now = now_millis();
    let row: Option<(i64, serde_json::Value, i32)> = sqlx::query_as(
        "UPDATE queue_messages SET available_at = $3 \
         WHERE id = ( \
             SELECT id FROM queue_messages \
             WHERE queue = $1 AND NOT dead AND available_at <= $2 \
             ORDER BY id \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED \
         ) \
         RETURNING id, payload, attempts",
    )
    .bind(queue)
    .bind(now)
    .bind(now + lease_ms)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, payload, attempts)| QueueMessage {
        id,
        payload,
        attempts,
    }))
}

/// Acknowledge (delete) a processed message
pub async fn ack(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM queue_messages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Negative-acknowledge: redeliver after `backoff_ms`, counting the failure
pub async fn nack(pool: &PgPool, id: i64, backoff_ms: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE queue_messages SET available_at = $2, attempts = attempts + 1 WHERE id = $1",
    )
    .bind(id)
    .bind(now_millis() + backoff_ms)
    .execute(pool)
    .await?;
    Ok(())
}

/// Dead-letter a poison message; the row is kept for inspection
pub async fn bury(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE queue_messages SET dead = TRUE, attempts = attempts + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
