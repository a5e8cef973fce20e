use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Failure body. Same `success`/`message` pair as the success envelope so
/// clients can branch on one field.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::BadRequest("VALIDATION_ERROR", message.into())
    }

    pub fn invalid_id() -> Self {
        ApiError::validation("id must be a positive integer")
    }

    pub fn missing_fields() -> Self {
        ApiError::validation("all fields are required")
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound("NOT_FOUND", format!("{what} not found"))
    }

    pub fn has_dependents(patient_id: i64) -> Self {
        ApiError::Conflict(
            "HAS_DEPENDENTS",
            format!("patient {patient_id} has appointments and cannot be deleted"),
        )
    }

    pub fn invalid_state(stored: &str) -> Self {
        ApiError::Conflict(
            "INVALID_STATE",
            format!("appointment has status {stored:?}, which is not part of the rotation"),
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(code, _) | ApiError::NotFound(code, _) | ApiError::Conflict(code, _) => *code,
            ApiError::Internal(_) => "PERSISTENCE_FAILURE",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(_, msg) | ApiError::NotFound(_, msg) | ApiError::Conflict(_, msg) => msg,
            ApiError::Internal(msg) => msg,
        }
    }

    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            success: false,
            message: message.to_string(),
            code: code.to_string(),
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MissingPatient(id) => ApiError::not_found(&format!("patient {id}")),
            StoreError::Restricted(id) => ApiError::has_dependents(id),
            StoreError::Database(e) => ApiError::Internal(format!("db error: {e}")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(format!("invalid path: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        match self {
            ApiError::BadRequest(_, msg) => {
                (StatusCode::BAD_REQUEST, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::NotFound(_, msg) => {
                (StatusCode::NOT_FOUND, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Conflict(_, msg) => {
                tracing::warn!(code, "{msg}");
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!("{msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::to_error_response(code, &msg),
                )
                    .into_response()
            }
        }
    }
}
