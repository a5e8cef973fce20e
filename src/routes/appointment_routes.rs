// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::ApiError,
    models::{ActionResponse, AppState, AppointmentRequest, AppointmentRow, CreateAppointmentBody, IdRequest},
    status::AppointmentStatus,
    validation::{appointment_fields, require_id},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/appointments",
            get(list_appointments)
                .post(create_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/appointments/status", put(rotate_status))
        .route("/appointments/{appointment_id}", get(get_appointment))
}

/* ============================================================
   GET /appointments
   ============================================================ */

pub async fn list_appointments(State(state): State<AppState>) -> Result<Json<Vec<AppointmentRow>>, ApiError> {
    let rows = state.store.list_appointments().await?;
    Ok(Json(rows))
}

/* ============================================================
   GET /appointments/{id}
   ============================================================ */

pub async fn get_appointment(
    State(state): State<AppState>,
    WithRejection(Path(appointment_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<AppointmentRow>, ApiError> {
    let appointment_id = require_id(Some(appointment_id))?;

    let row = state
        .store
        .get_appointment(appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("appointment"))?;

    Ok(Json(row))
}

/* ============================================================
   POST /appointments (create)
   ============================================================ */

/// The caller's initial status is kept as sent; it need not be `pendiente`.
/// The record may also arrive wrapped as `{ "cita": {...} }`.
pub async fn create_appointment(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<CreateAppointmentBody>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let req = body.into_inner();
    let fields = appointment_fields(&req)?;

    let id = state.store.insert_appointment(&fields).await?;
    tracing::info!(appointment_id = id, patient_id = fields.patient_id, status = %fields.status, "appointment booked");

    Ok(Json(ActionResponse::ok("appointment booked", id)))
}

/* ============================================================
   PUT /appointments (full replace)
   ============================================================ */

pub async fn update_appointment(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<AppointmentRequest>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let id = require_id(req.id)?;
    let fields = appointment_fields(&req)?;

    if !state.store.update_appointment(id, &fields).await? {
        return Err(ApiError::not_found("appointment"));
    }
    tracing::info!(appointment_id = id, "appointment updated");

    Ok(Json(ActionResponse::ok("appointment updated", id)))
}

/* ============================================================
   DELETE /appointments
   ============================================================ */

pub async fn delete_appointment(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<IdRequest>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let id = require_id(req.id)?;

    if !state.store.delete_appointment(id).await? {
        return Err(ApiError::not_found("appointment"));
    }
    tracing::info!(appointment_id = id, "appointment deleted");

    Ok(Json(ActionResponse::ok("appointment deleted", id)))
}

/* ============================================================
   Status rotation
   ============================================================ */

/// One read, one write, no transaction: two concurrent rotations of the same
/// appointment race and the last write wins.
pub async fn rotate_status(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<IdRequest>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let id = require_id(req.id)?;

    let stored = state
        .store
        .appointment_status(id)
        .await?
        .ok_or_else(|| ApiError::not_found("appointment"))?;

    // An unknown label fails loudly rather than restarting the cycle.
    let current: AppointmentStatus = stored.parse().map_err(|_| ApiError::invalid_state(&stored))?;
    let next = current.next();

    if !state.store.set_appointment_status(id, next).await? {
        return Err(ApiError::not_found("appointment"));
    }
    tracing::info!(appointment_id = id, from = %current, to = %next, "appointment status rotated");

    Ok(Json(ActionResponse {
        success: true,
        message: "appointment status updated".into(),
        id: Some(id),
        new_status: Some(next),
    }))
}
