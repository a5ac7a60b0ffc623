//! Application state for store-server

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::cache::CacheService;
use crate::config::Config;
use crate::queue::QueueService;
use crate::search::SearchIndex;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
///
/// Every collaborator is owned here and handed to handlers and workers
/// explicitly — connection pool, queue handle, search index, cache. Nothing
/// is reached through module-level globals.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Durable queue handle (settlement + index sync)
    pub queue: QueueService,
    /// In-process search index (disposable projection)
    pub search: Arc<SearchIndex>,
    /// In-process response cache (disposable projection)
    pub cache: CacheService,
    /// JWT secret shared with the auth service
    pub jwt_secret: String,
}

impl AppState {
    /// Connect the pool, apply migrations and build the service handles
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;
        tracing::info!(
            max_connections = config.db_max_connections,
            "Database connection established"
        );

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self {
            queue: QueueService::new(pool.clone()),
            search: Arc::new(SearchIndex::new()),
            cache: CacheService::new(),
            jwt_secret: config.jwt_secret.clone(),
            pool,
        })
    }

    /// Explicit shutdown: drain and close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed");
    }
}
