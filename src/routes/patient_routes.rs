// src/routes/patient_routes.rs

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::ApiError,
    models::{ActionResponse, AppState, CreatePatientBody, IdRequest, PatientRequest, PatientRow},
    validation::{patient_fields, require_id},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/patients",
            get(list_patients)
                .post(create_patient)
                .put(update_patient)
                .delete(delete_patient),
        )
        .route("/patients/{patient_id}", get(get_patient))
}

pub async fn list_patients(State(state): State<AppState>) -> Result<Json<Vec<PatientRow>>, ApiError> {
    let rows = state.store.list_patients().await?;
    Ok(Json(rows))
}

pub async fn get_patient(
    State(state): State<AppState>,
    WithRejection(Path(patient_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<PatientRow>, ApiError> {
    let patient_id = require_id(Some(patient_id))?;

    let row = state
        .store
        .get_patient(patient_id)
        .await?
        .ok_or_else(|| ApiError::not_found("patient"))?;

    Ok(Json(row))
}

/// Accepts the record flat or wrapped as `{ "paciente": {...} }`.
pub async fn create_patient(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<CreatePatientBody>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let req = body.into_inner();
    let fields = patient_fields(&req)?;

    let id = state.store.insert_patient(&fields).await?;
    tracing::info!(patient_id = id, "patient created");

    Ok(Json(ActionResponse::ok("patient created", id)))
}

/// Full replace; every field must be sent.
pub async fn update_patient(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<PatientRequest>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let id = require_id(req.id)?;
    let fields = patient_fields(&req)?;

    if !state.store.update_patient(id, &fields).await? {
        return Err(ApiError::not_found("patient"));
    }
    tracing::info!(patient_id = id, "patient updated");

    Ok(Json(ActionResponse::ok("patient updated", id)))
}

/// Refused with HAS_DEPENDENTS while any appointment references the patient.
/// The store checks and deletes atomically, so a stale client list cannot
/// slip a delete past an appointment created in the meantime.
pub async fn delete_patient(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<IdRequest>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let id = require_id(req.id)?;

    if !state.store.delete_patient(id).await? {
        return Err(ApiError::not_found("patient"));
    }
    tracing::info!(patient_id = id, "patient deleted");

    Ok(Json(ActionResponse::ok("patient deleted", id)))
}
