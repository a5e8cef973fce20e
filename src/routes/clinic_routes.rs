// src/routes/clinic_routes.rs

use axum::{extract::State, routing::get, Json, Router};

use crate::models::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/practitioners", get(list_practitioners))
}

/// Roster the booking forms offer. Appointments still accept any name.
pub async fn list_practitioners(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.practitioners.as_ref().clone())
}
