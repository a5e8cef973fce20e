use axum::{Json, Router, routing::get};

use crate::models::{ActionResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

// Liveness only; does not touch the store.
pub async fn health() -> Json<ActionResponse> {
    Json(ActionResponse {
        success: true,
        message: "ok".to_string(),
        id: None,
        new_status: None,
    })
}
