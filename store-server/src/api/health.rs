//! Health check endpoint

use axum::Json;
use serde::Serialize;
use shared::util::now_millis;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        timestamp: now_millis(),
    })
}
