use axum::{extract::State, response::Json};
use serde::Serialize;

use super::ApiResponse;
use crate::config::DatabaseType;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub storage: DatabaseType,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(
        "Service is healthy",
        HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: state.config.database.db_type,
        },
    ))
}
