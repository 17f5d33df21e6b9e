//! Health check endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use docmill_core::BlobStore;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_connected = state.db.documents.ping().await.is_ok();
    let storage_connected = state.store.check().await.is_ok();

    let status = if database_connected && storage_connected {
        "healthy"
    } else {
        "degraded"
    };

    Json(serde_json::json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "database_connected": database_connected,
        "storage_connected": storage_connected,
    }))
}
