// src/store/postgres.rs

use async_trait::async_trait;

use super::{ClinicStore, StoreError, StoreResult};
use crate::models::{AppointmentFields, AppointmentRow, PatientFields, PatientRow};
use crate::status::AppointmentStatus;

#[derive(Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

/// Turns an FK violation into the domain error the caller expects.
fn map_fk(e: sqlx::Error, on_violation: StoreError) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => on_violation,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl ClinicStore for PgStore {
    async fn list_patients(&self) -> StoreResult<Vec<PatientRow>> {
        let rows = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT id, full_name, document_number, phone, email
            FROM patient
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_patient(&self, id: i64) -> StoreResult<Option<PatientRow>> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT id, full_name, document_number, phone, email
            FROM patient
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_patient(&self, fields: &PatientFields) -> StoreResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO patient (full_name, document_number, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&fields.full_name)
        .bind(&fields.document_number)
        .bind(&fields.phone)
        .bind(&fields.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_patient(&self, id: i64, fields: &PatientFields) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE patient
            SET full_name = $1,
                document_number = $2,
                phone = $3,
                email = $4
            WHERE id = $5
            "#,
        )
        .bind(&fields.full_name)
        .bind(&fields.document_number)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_patient(&self, id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Lock the patient row so no appointment can be attached to it
        // between the check and the delete.
        let exists: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM patient WHERE id = $1 FOR UPDATE"#)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let dependents: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM appointment WHERE patient_id = $1"#)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if dependents > 0 {
            return Err(StoreError::Restricted(id));
        }

        sqlx::query(r#"DELETE FROM patient WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_fk(e, StoreError::Restricted(id)))?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list_appointments(&self) -> StoreResult<Vec<AppointmentRow>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            r#"
            SELECT
              a.id,
              a.patient_id,
              p.full_name AS patient_name,
              a.visit_date AS date,
              a.visit_time AS time,
              a.practitioner,
              a.status
            FROM appointment a
            LEFT JOIN patient p ON p.id = a.patient_id
            ORDER BY a.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_appointment(&self, id: i64) -> StoreResult<Option<AppointmentRow>> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"
            SELECT
              a.id,
              a.patient_id,
              p.full_name AS patient_name,
              a.visit_date AS date,
              a.visit_time AS time,
              a.practitioner,
              a.status
            FROM appointment a
            LEFT JOIN patient p ON p.id = a.patient_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_appointment(&self, fields: &AppointmentFields) -> StoreResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO appointment (patient_id, visit_date, visit_time, practitioner, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(fields.patient_id)
        .bind(&fields.date)
        .bind(&fields.time)
        .bind(&fields.practitioner)
        .bind(fields.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_fk(e, StoreError::MissingPatient(fields.patient_id)))?;
        Ok(id)
    }

    async fn update_appointment(&self, id: i64, fields: &AppointmentFields) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE appointment
            SET patient_id = $1,
                visit_date = $2,
                visit_time = $3,
                practitioner = $4,
                status = $5
            WHERE id = $6
            "#,
        )
        .bind(fields.patient_id)
        .bind(&fields.date)
        .bind(&fields.time)
        .bind(&fields.practitioner)
        .bind(fields.status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_fk(e, StoreError::MissingPatient(fields.patient_id)))?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_appointment(&self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query(r#"DELETE FROM appointment WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn appointment_status(&self, id: i64) -> StoreResult<Option<String>> {
        let status: Option<String> = sqlx::query_scalar(r#"SELECT status FROM appointment WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(status)
    }

    async fn set_appointment_status(&self, id: i64, status: AppointmentStatus) -> StoreResult<bool> {
        let res = sqlx::query(r#"UPDATE appointment SET status = $1 WHERE id = $2"#)
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

// These run against a throwaway database that `sqlx::test` creates from
// DATABASE_URL and migrates; run with `cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;

    fn ana() -> PatientFields {
        PatientFields {
            full_name: "Ana Ruiz".into(),
            document_number: "123".into(),
            phone: "555".into(),
            email: "a@b.com".into(),
        }
    }

    fn visit(patient_id: i64) -> AppointmentFields {
        AppointmentFields {
            patient_id,
            date: "2024-06-01".into(),
            time: "09:00".into(),
            practitioner: "Carlos Mendoza".into(),
            status: AppointmentStatus::Pending,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // requires DATABASE_URL
    async fn delete_is_restricted_while_appointments_exist(pool: PgPool) {
        let store = PgStore::new(pool);
        let pid = store.insert_patient(&ana()).await.unwrap();
        let aid = store.insert_appointment(&visit(pid)).await.unwrap();

        assert!(matches!(store.delete_patient(pid).await, Err(StoreError::Restricted(id)) if id == pid));
        assert!(store.get_patient(pid).await.unwrap().is_some());

        assert!(store.delete_appointment(aid).await.unwrap());
        assert!(store.delete_patient(pid).await.unwrap());
        assert!(store.get_patient(pid).await.unwrap().is_none());
        assert!(!store.delete_patient(pid).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // requires DATABASE_URL
    async fn foreign_key_violations_become_missing_patient(pool: PgPool) {
        let store = PgStore::new(pool);

        let err = store.insert_appointment(&visit(4242)).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingPatient(4242)), "{err:?}");

        let pid = store.insert_patient(&ana()).await.unwrap();
        let aid = store.insert_appointment(&visit(pid)).await.unwrap();
        let err = store.update_appointment(aid, &visit(4242)).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingPatient(4242)), "{err:?}");
        assert!(store.list_appointments().await.unwrap().len() == 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // requires DATABASE_URL
    async fn appointments_list_newest_first_with_patient_name(pool: PgPool) {
        let store = PgStore::new(pool);
        let pid = store.insert_patient(&ana()).await.unwrap();
        let first = store.insert_appointment(&visit(pid)).await.unwrap();
        let mut later = visit(pid);
        later.time = "10:30".into();
        later.status = AppointmentStatus::Confirmed;
        let second = store.insert_appointment(&later).await.unwrap();

        let rows = store.list_appointments().await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second, first]);
        assert_eq!(rows[0].patient_name.as_deref(), Some("Ana Ruiz"));
        assert_eq!(rows[0].date, "2024-06-01");
        assert_eq!(rows[0].time, "10:30");
        assert_eq!(rows[0].status, "confirmada");

        let patients = store.list_patients().await.unwrap();
        assert_eq!(patients[0].id, pid);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // requires DATABASE_URL
    async fn status_is_read_and_written_as_text(pool: PgPool) {
        let store = PgStore::new(pool.clone());
        let pid = store.insert_patient(&ana()).await.unwrap();
        let aid = store.insert_appointment(&visit(pid)).await.unwrap();

        assert!(store.set_appointment_status(aid, AppointmentStatus::Cancelled).await.unwrap());
        assert_eq!(store.appointment_status(aid).await.unwrap().as_deref(), Some("cancelada"));

        // Rows written by older clients are not constrained to the rotation.
        sqlx::query("UPDATE appointment SET status = 'Completada' WHERE id = $1")
            .bind(aid)
            .execute(&pool)
            .await
            .unwrap();
        let row = store.get_appointment(aid).await.unwrap().unwrap();
        assert_eq!(row.status, "Completada");

        assert!(store.appointment_status(aid + 1).await.unwrap().is_none());
        assert!(!store.set_appointment_status(aid + 1, AppointmentStatus::Pending).await.unwrap());
    }
}
