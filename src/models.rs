use std::sync::Arc;

use serde::{de::Deserializer, Deserialize, Serialize};
use sqlx::FromRow;

use crate::status::AppointmentStatus;
use crate::store::ClinicStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClinicStore>,
    pub practitioners: Arc<Vec<String>>,
}

/* -------------------------
   DB Row Models
--------------------------*/

// Wire names are the Spanish ones the mobile and web clients send.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PatientRow {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub full_name: String,
    #[serde(rename = "documento")]
    pub document_number: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "correo")]
    pub email: String,
}

/// `status` is kept as raw text: rows written by older clients may hold a
/// label outside the rotation, and reading them must not fail the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AppointmentRow {
    pub id: i64,
    #[serde(rename = "paciente_id")]
    pub patient_id: i64,
    #[serde(rename = "paciente_nombre", default)]
    pub patient_name: Option<String>,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "odontologo")]
    pub practitioner: String,
    #[serde(rename = "estado")]
    pub status: String,
}

/* -------------------------
   Validated inputs
--------------------------*/

/// Patient fields after trimming and validation; what the store writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFields {
    pub full_name: String,
    pub document_number: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentFields {
    pub patient_id: i64,
    pub date: String,
    pub time: String,
    pub practitioner: String,
    pub status: AppointmentStatus,
}

/* -------------------------
   Lenient decoding
--------------------------*/

// The web client posts form values as strings and the mobile client sends
// `documento` as a number after `parseInt`.

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(|v| match v {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Int(n) => n.to_string(),
        TextOrNumber::Float(f) => f.to_string(),
    }))
}

/// Integer id sent either as a number or as a numeric string. A blank
/// string (an unselected form field) reads as absent.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TextOrNumber::Int(n)) => Ok(Some(n)),
        Some(TextOrNumber::Float(f)) if f.fract() == 0.0 => Ok(Some(f as i64)),
        Some(TextOrNumber::Float(f)) => Err(serde::de::Error::custom(format!("{f} is not an integer id"))),
        Some(TextOrNumber::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(TextOrNumber::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("{s:?} is not an integer id"))),
    }
}

/* -------------------------
   API DTOs
--------------------------*/

// Every field is optional so that a missing one is reported as a
// validation failure in the uniform shape instead of a decode rejection.

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PatientRequest {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub full_name: Option<String>,
    #[serde(rename = "documento", default, deserialize_with = "text_or_number")]
    pub document_number: Option<String>,
    #[serde(rename = "telefono", default, deserialize_with = "text_or_number")]
    pub phone: Option<String>,
    #[serde(rename = "correo", default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppointmentRequest {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "paciente_id", default, deserialize_with = "lenient_id")]
    pub patient_id: Option<i64>,
    #[serde(rename = "fecha", default)]
    pub date: Option<String>,
    #[serde(rename = "hora", default)]
    pub time: Option<String>,
    #[serde(rename = "odontologo", default)]
    pub practitioner: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
}

/// Create body: the legacy clients wrap the record as `{ "paciente": {...} }`,
/// newer callers send it flat.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreatePatientBody {
    Wrapped { paciente: PatientRequest },
    Flat(PatientRequest),
}

impl CreatePatientBody {
    pub fn into_inner(self) -> PatientRequest {
        match self {
            CreatePatientBody::Wrapped { paciente } => paciente,
            CreatePatientBody::Flat(req) => req,
        }
    }
}

/// Same as [`CreatePatientBody`] with the `{ "cita": {...} }` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreateAppointmentBody {
    Wrapped { cita: AppointmentRequest },
    Flat(AppointmentRequest),
}

impl CreateAppointmentBody {
    pub fn into_inner(self) -> AppointmentRequest {
        match self {
            CreateAppointmentBody::Wrapped { cita } => cita,
            CreateAppointmentBody::Flat(req) => req,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IdRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
}

/// Success envelope shared by every mutating endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "nuevo_estado", default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<AppointmentStatus>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>, id: i64) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: Some(id),
            new_status: None,
        }
    }
}
