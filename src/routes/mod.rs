use crate::models::AppState;
use axum::Router;

pub mod appointment_routes;
pub mod clinic_routes;
pub mod health_routes;
pub mod patient_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", patient_routes::router())
        .nest("/api/v1", appointment_routes::router())
        .nest("/api/v1", clinic_routes::router())
        .merge(health_routes::router())
        .with_state(state)
}
