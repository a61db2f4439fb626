//! Liveness endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::LibraryStore;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

/// GET /
pub async fn root() -> &'static str {
    "Library API Server"
}

/// GET /health
pub async fn health_check(State(store): State<Arc<dyn LibraryStore>>) -> Json<HealthResponse> {
    let (status, database) = match store.health_check().await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => {
            tracing::error!(backend = store.backend_name(), error = %e, "Health check failed");
            ("unhealthy", "disconnected".to_string())
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
