// src/store/mod.rs

use async_trait::async_trait;

use crate::models::{AppointmentFields, AppointmentRow, PatientFields, PatientRow};
use crate::status::AppointmentStatus;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Insert/update referenced a patient that does not exist.
    #[error("patient {0} does not exist")]
    MissingPatient(i64),
    /// Delete refused: appointments still reference the patient.
    #[error("patient {0} is referenced by appointments")]
    Restricted(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for patients and appointments.
///
/// Listing methods return rows ordered by id, newest first. Update and
/// delete methods return `false` when no row has the given id.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    async fn list_patients(&self) -> StoreResult<Vec<PatientRow>>;
    async fn get_patient(&self, id: i64) -> StoreResult<Option<PatientRow>>;
    async fn insert_patient(&self, fields: &PatientFields) -> StoreResult<i64>;
    async fn update_patient(&self, id: i64, fields: &PatientFields) -> StoreResult<bool>;

    /// Deletes only if no appointment references the patient; the check and
    /// the delete happen atomically. Fails with `Restricted` otherwise.
    async fn delete_patient(&self, id: i64) -> StoreResult<bool>;

    async fn list_appointments(&self) -> StoreResult<Vec<AppointmentRow>>;
    async fn get_appointment(&self, id: i64) -> StoreResult<Option<AppointmentRow>>;
    async fn insert_appointment(&self, fields: &AppointmentFields) -> StoreResult<i64>;
    async fn update_appointment(&self, id: i64, fields: &AppointmentFields) -> StoreResult<bool>;
    async fn delete_appointment(&self, id: i64) -> StoreResult<bool>;

    /// Raw stored status label, `None` if the appointment does not exist.
    async fn appointment_status(&self, id: i64) -> StoreResult<Option<String>>;
    async fn set_appointment_status(&self, id: i64, status: AppointmentStatus) -> StoreResult<bool>;
}
