//! Liveness check.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};
use tracing::warn;

use super::error::ApiError;
use super::state::AppState;

/// Reports ok once the store answers a trivial query.
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(state.db.pool())
        .await
        .map_err(|e| {
            warn!(error = %e, "Health check failed");
            ApiError::unavailable("Database unavailable")
        })?;

    Ok(Json(json!({
        "status": true,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
