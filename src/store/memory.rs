// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ClinicStore, StoreError, StoreResult};
use crate::models::{AppointmentFields, AppointmentRow, PatientFields, PatientRow};
use crate::status::AppointmentStatus;

/// Process-local store with the same semantics as the Postgres one,
/// including restrict-on-delete. Used when no `DATABASE_URL` is set and by
/// the test suites.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    next_patient_id: i64,
    next_appointment_id: i64,
    patients: BTreeMap<i64, PatientRow>,
    appointments: BTreeMap<i64, AppointmentRow>,
    writes: u64,
}

impl Tables {
    fn resolve_name(&self, mut row: AppointmentRow) -> AppointmentRow {
        row.patient_name = self.patients.get(&row.patient_id).map(|p| p.full_name.clone());
        row
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutations since creation.
    #[doc(hidden)]
    pub async fn write_count(&self) -> u64 {
        self.inner.read().await.writes
    }

    /// Overwrites a stored status label without validation, the way rows
    /// written by older clients look. Returns `false` if the id is unknown.
    #[doc(hidden)]
    pub async fn force_status(&self, id: i64, raw: &str) -> bool {
        let mut t = self.inner.write().await;
        match t.appointments.get_mut(&id) {
            Some(row) => {
                row.status = raw.to_string();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ClinicStore for MemoryStore {
    async fn list_patients(&self) -> StoreResult<Vec<PatientRow>> {
        let t = self.inner.read().await;
        Ok(t.patients.values().rev().cloned().collect())
    }

    async fn get_patient(&self, id: i64) -> StoreResult<Option<PatientRow>> {
        Ok(self.inner.read().await.patients.get(&id).cloned())
    }

    async fn insert_patient(&self, fields: &PatientFields) -> StoreResult<i64> {
        let mut t = self.inner.write().await;
        t.next_patient_id += 1;
        let id = t.next_patient_id;
        t.patients.insert(
            id,
            PatientRow {
                id,
                full_name: fields.full_name.clone(),
                document_number: fields.document_number.clone(),
                phone: fields.phone.clone(),
                email: fields.email.clone(),
            },
        );
        t.writes += 1;
        Ok(id)
    }

    async fn update_patient(&self, id: i64, fields: &PatientFields) -> StoreResult<bool> {
        let mut t = self.inner.write().await;
        let Some(row) = t.patients.get_mut(&id) else {
            return Ok(false);
        };
        row.full_name = fields.full_name.clone();
        row.document_number = fields.document_number.clone();
        row.phone = fields.phone.clone();
        row.email = fields.email.clone();
        t.writes += 1;
        Ok(true)
    }

    async fn delete_patient(&self, id: i64) -> StoreResult<bool> {
        let mut t = self.inner.write().await;
        if !t.patients.contains_key(&id) {
            return Ok(false);
        }
        if t.appointments.values().any(|a| a.patient_id == id) {
            return Err(StoreError::Restricted(id));
        }
        t.patients.remove(&id);
        t.writes += 1;
        Ok(true)
    }

    async fn list_appointments(&self) -> StoreResult<Vec<AppointmentRow>> {
        let t = self.inner.read().await;
        Ok(t.appointments
            .values()
            .rev()
            .cloned()
            .map(|row| t.resolve_name(row))
            .collect())
    }

    async fn get_appointment(&self, id: i64) -> StoreResult<Option<AppointmentRow>> {
        let t = self.inner.read().await;
        Ok(t.appointments.get(&id).cloned().map(|row| t.resolve_name(row)))
    }

    async fn insert_appointment(&self, fields: &AppointmentFields) -> StoreResult<i64> {
        let mut t = self.inner.write().await;
        if !t.patients.contains_key(&fields.patient_id) {
            return Err(StoreError::MissingPatient(fields.patient_id));
        }
        t.next_appointment_id += 1;
        let id = t.next_appointment_id;
        t.appointments.insert(
            id,
            AppointmentRow {
                id,
                patient_id: fields.patient_id,
                patient_name: None,
                date: fields.date.clone(),
                time: fields.time.clone(),
                practitioner: fields.practitioner.clone(),
                status: fields.status.as_str().to_string(),
            },
        );
        t.writes += 1;
        Ok(id)
    }

    async fn update_appointment(&self, id: i64, fields: &AppointmentFields) -> StoreResult<bool> {
        let mut t = self.inner.write().await;
        if !t.appointments.contains_key(&id) {
            return Ok(false);
        }
        if !t.patients.contains_key(&fields.patient_id) {
            return Err(StoreError::MissingPatient(fields.patient_id));
        }
        if let Some(row) = t.appointments.get_mut(&id) {
            row.patient_id = fields.patient_id;
            row.date = fields.date.clone();
            row.time = fields.time.clone();
            row.practitioner = fields.practitioner.clone();
            row.status = fields.status.as_str().to_string();
        }
        t.writes += 1;
        Ok(true)
    }

    async fn delete_appointment(&self, id: i64) -> StoreResult<bool> {
        let mut t = self.inner.write().await;
        let removed = t.appointments.remove(&id).is_some();
        if removed {
            t.writes += 1;
        }
        Ok(removed)
    }

    async fn appointment_status(&self, id: i64) -> StoreResult<Option<String>> {
        let t = self.inner.read().await;
        Ok(t.appointments.get(&id).map(|a| a.status.clone()))
    }

    async fn set_appointment_status(&self, id: i64, status: AppointmentStatus) -> StoreResult<bool> {
        let mut t = self.inner.write().await;
        let Some(row) = t.appointments.get_mut(&id) else {
            return Ok(false);
        };
        row.status = status.as_str().to_string();
        t.writes += 1;
        Ok(true)
    }
}
