//! Index sync worker — keeps the search index eventually consistent
//!
//! Consumes product mutation messages one at a time. The message only names
//! the product; the consumer re-reads the current row (with category) at
//! consume time, so a burst of queued updates converges on the latest state
//! regardless of delivery order. Errors are requeued without an attempt
//! bound — drift self-heals through the startup resynchronization.

use shared::models::ProductWithCategory;
use shared::queue::{IndexAction, IndexSyncMessage, INDEX_SYNC_QUEUE};
use sqlx::PgPool;

use super::POLL_INTERVAL;
use crate::db::products;
use crate::db::queue::QueueMessage;
use crate::error::ServiceResult;
use crate::search::{SearchDocument, SearchIndex};
use crate::state::AppState;

/// Long-running index-sync consumer loop
pub async fn run(state: AppState) {
    tracing::info!("Index sync worker started");
    loop {
        match state.queue.claim(INDEX_SYNC_QUEUE).await {
            Ok(Some(msg)) => handle_message(&state, msg).await,
            Ok(None) => tokio::time::sleep(POLL_INTERVAL).await,
            Err(e) => {
                tracing::error!(error = %e, "Index sync claim failed");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }
}

async fn handle_message(state: &AppState, msg: QueueMessage) {
    let parsed: IndexSyncMessage = match serde_json::from_value(msg.payload.clone()) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(message_id = msg.id, error = %e, "Unparseable index sync payload, dead-lettering");
            if let Err(e) = state.queue.bury(msg.id).await {
                tracing::error!(error = %e, "Queue operation failed");
            }
            return;
        }
    };

    match apply(state, &parsed).await {
        Ok(()) => {
            if let Err(e) = state.queue.ack(msg.id).await {
                tracing::error!(error = %e, "Queue operation failed");
            }
        }
        Err(e) => {
            tracing::error!(
                product_id = %parsed.product_id,
                error = %e,
                "Index sync failed, requeueing"
            );
            if let Err(e) = state.queue.nack(msg.id).await {
                tracing::error!(error = %e, "Queue operation failed");
            }
        }
    }
}

async fn apply(state: &AppState, msg: &IndexSyncMessage) -> ServiceResult<()> {
    match msg.action {
        IndexAction::Index | IndexAction::Update => {
            let mut conn = state.pool.acquire().await?;
            match products::get_product_for_index(&mut conn, msg.product_id).await? {
                Some(product) => {
                    state.search.upsert(document_from(product));
                    tracing::info!(product_id = %msg.product_id, "Product indexed");
                }
                None => {
                    // Deleted between enqueue and consume; nothing to index
                    tracing::debug!(product_id = %msg.product_id, "Product vanished before indexing");
                }
            }
        }
        IndexAction::Delete => {
            state.search.remove(msg.product_id);
            tracing::info!(product_id = %msg.product_id, "Product removed from index");
        }
    }
    Ok(())
}

/// Project a product row into its search document
pub fn document_from(p: ProductWithCategory) -> SearchDocument {
    SearchDocument {
        id: p.product.id,
        name: p.product.name,
        description: p.product.description,
        price: p.product.price,
        image: p.product.image,
        category: p.category.map(|c| c.name),
    }
}

/// Full resynchronization: rebuild the entire index from the relational
/// store. Invoked at process startup to heal drift accumulated while the
/// consumer was offline.
pub async fn rebuild(pool: &PgPool, search: &SearchIndex) -> ServiceResult<usize> {
    let all = products::all_products_for_index(pool).await?;
    search.clear();
    let count = all.len();
    for product in all {
        search.upsert(document_from(product));
    }
    tracing::info!(products = count, "Search index rebuilt");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{Category, Product};
    use uuid::Uuid;

    fn product(id: u128, name: &str, category: Option<&str>) -> ProductWithCategory {
        let category_id = Uuid::from_u128(id + 1000);
        ProductWithCategory {
            product: Product {
                id: Uuid::from_u128(id),
                name: name.to_string(),
                description: Some("test product".to_string()),
                price: Decimal::new(999, 2),
                image: None,
                status: "available".to_string(),
                category_id,
                created_at: 0,
                updated_at: 0,
            },
            category: category.map(|name| Category {
                id: category_id,
                name: name.to_string(),
                description: None,
            }),
        }
    }

    #[test]
    fn test_document_projection() {
        let doc = document_from(product(1, "Desk Lamp", Some("Lighting")));
        assert_eq!(doc.id, Uuid::from_u128(1));
        assert_eq!(doc.category.as_deref(), Some("Lighting"));
        assert_eq!(doc.name, "Desk Lamp");
    }

    #[test]
    fn test_rebuild_feed_reproduces_document_count() {
        // The in-memory half of the resynchronization property: feeding N
        // projected products into a cleared index yields exactly N documents
        let search = SearchIndex::new();
        search.upsert(document_from(product(99, "Stale Doc", None)));

        let all: Vec<ProductWithCategory> =
            (1..=5).map(|i| product(i, &format!("P{i}"), None)).collect();
        search.clear();
        let count = all.len();
        for p in all {
            search.upsert(document_from(p));
        }
        assert_eq!(search.doc_count(), count);
        assert!(search.search("stale", 10).is_empty());
    }
}
