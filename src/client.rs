// src/client.rs

use std::time::Duration;

use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    error::ApiError,
    models::{AppointmentRequest, AppointmentRow, IdRequest, PatientRequest, PatientRow},
    status::AppointmentStatus,
    validation::{appointment_fields, patient_fields},
};

/// `code` on results produced when the server could not be reached or
/// answered with something that is not a clinic response.
pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Uniform outcome of every mutating call, whether the server answered,
/// refused, or was never reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nuevo_estado", default)]
    pub new_status: Option<AppointmentStatus>,
}

impl ActionResult {
    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: Some(code.to_string()),
            id: None,
            new_status: None,
        }
    }

    fn transport(message: &str) -> Self {
        Self::failure(TRANSPORT_ERROR, message)
    }

    pub fn is_transport_failure(&self) -> bool {
        self.code.as_deref() == Some(TRANSPORT_ERROR)
    }
}

impl From<ApiError> for ActionResult {
    fn from(e: ApiError) -> Self {
        Self::failure(e.code(), e.message())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response ({status}): {body}")]
    Malformed { status: u16, body: String },
}

enum Reply<T> {
    Data(T),
    Refused(ActionResult),
}

#[derive(Default)]
struct Cache {
    patients: Option<Vec<PatientRow>>,
    appointments: Option<Vec<AppointmentRow>>,
}

/// Typed client for the clinic API.
///
/// Patient and appointment lists are cached read-through and dropped after
/// every mutating call. The cache only saves round trips for rendering; the
/// server remains the authority for every rule.
pub struct ClinicClient {
    http: reqwest::Client,
    base_url: String,
    cache: RwLock<Cache>,
}

impl ClinicClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: RwLock::new(Cache::default()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Reply<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut req = self.http.request(method, self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            if let Ok(data) = serde_json::from_str::<T>(&text) {
                return Ok(Reply::Data(data));
            }
        }
        // Refusals come back as `{ success: false, message, code }`.
        match serde_json::from_str::<ActionResult>(&text) {
            Ok(refused) if !refused.success => Ok(Reply::Refused(refused)),
            _ => Err(ClientError::Malformed {
                status: status.as_u16(),
                body: text,
            }),
        }
    }

    async fn action<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B, what: &str) -> ActionResult {
        let outcome = self.call::<B, ActionResult>(method, path, Some(body)).await;
        self.invalidate().await;

        match outcome {
            Ok(Reply::Data(result) | Reply::Refused(result)) => result,
            Err(e) => {
                tracing::warn!("{what} failed: {e}");
                ActionResult::transport(&format!("could not {what}"))
            }
        }
    }

    async fn fetch_list<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<Vec<T>, ActionResult> {
        match self.call::<(), Vec<T>>(Method::GET, path, None).await {
            Ok(Reply::Data(rows)) => Ok(rows),
            Ok(Reply::Refused(refused)) => Err(refused),
            Err(e) => {
                tracing::warn!("loading {what} failed: {e}");
                Err(ActionResult::transport(&format!("could not load {what}")))
            }
        }
    }

    /// Drops both cached lists.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        cache.patients = None;
        cache.appointments = None;
    }

    pub async fn patients(&self) -> Result<Vec<PatientRow>, ActionResult> {
        if let Some(rows) = self.cache.read().await.patients.clone() {
            return Ok(rows);
        }
        let rows: Vec<PatientRow> = self.fetch_list("/patients", "patients").await?;
        self.cache.write().await.patients = Some(rows.clone());
        Ok(rows)
    }

    pub async fn appointments(&self) -> Result<Vec<AppointmentRow>, ActionResult> {
        if let Some(rows) = self.cache.read().await.appointments.clone() {
            return Ok(rows);
        }
        let rows: Vec<AppointmentRow> = self.fetch_list("/appointments", "appointments").await?;
        self.cache.write().await.appointments = Some(rows.clone());
        Ok(rows)
    }

    pub async fn practitioners(&self) -> Result<Vec<String>, ActionResult> {
        self.fetch_list("/practitioners", "practitioners").await
    }

    /* -------------------------
       Patients
    --------------------------*/

    pub async fn create_patient(&self, patient: &PatientRequest) -> ActionResult {
        if let Err(e) = patient_fields(patient) {
            return e.into();
        }
        let body = PatientRequest { id: None, ..patient.clone() };
        self.action(Method::POST, "/patients", &body, "create the patient").await
    }

    pub async fn edit_patient(&self, id: i64, patient: &PatientRequest) -> ActionResult {
        if let Err(e) = patient_fields(patient) {
            return e.into();
        }
        let body = PatientRequest { id: Some(id), ..patient.clone() };
        self.action(Method::PUT, "/patients", &body, "edit the patient").await
    }

    /// Checks a fresh appointment list before asking the server, which
    /// re-checks atomically.
    pub async fn delete_patient(&self, id: i64) -> ActionResult {
        self.invalidate().await;
        let appointments = match self.appointments().await {
            Ok(rows) => rows,
            Err(failure) => return failure,
        };
        if appointments.iter().any(|a| a.patient_id == id) {
            return ApiError::has_dependents(id).into();
        }
        self.action(Method::DELETE, "/patients", &IdRequest { id: Some(id) }, "delete the patient")
            .await
    }

    /* -------------------------
       Appointments
    --------------------------*/

    pub async fn create_appointment(&self, appointment: &AppointmentRequest) -> ActionResult {
        if let Err(e) = appointment_fields(appointment) {
            return e.into();
        }
        let body = AppointmentRequest { id: None, ..appointment.clone() };
        self.action(Method::POST, "/appointments", &body, "book the appointment").await
    }

    pub async fn edit_appointment(&self, id: i64, appointment: &AppointmentRequest) -> ActionResult {
        if let Err(e) = appointment_fields(appointment) {
            return e.into();
        }
        let body = AppointmentRequest { id: Some(id), ..appointment.clone() };
        self.action(Method::PUT, "/appointments", &body, "edit the appointment").await
    }

    pub async fn delete_appointment(&self, id: i64) -> ActionResult {
        self.action(Method::DELETE, "/appointments", &IdRequest { id: Some(id) }, "delete the appointment")
            .await
    }

    pub async fn rotate_status(&self, id: i64) -> ActionResult {
        self.action(
            Method::PUT,
            "/appointments/status",
            &IdRequest { id: Some(id) },
            "change the appointment status",
        )
        .await
    }
}
