// src/validation.rs

use chrono::{NaiveDate, NaiveTime};

use crate::error::ApiError;
use crate::models::{AppointmentFields, AppointmentRequest, PatientFields, PatientRequest};
use crate::status::AppointmentStatus;

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot in the
/// domain with something on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn require_id(id: Option<i64>) -> Result<i64, ApiError> {
    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_id()),
    }
}

fn required(value: Option<&str>) -> Result<String, ApiError> {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ApiError::missing_fields()),
    }
}

pub fn patient_fields(req: &PatientRequest) -> Result<PatientFields, ApiError> {
    let full_name = required(req.full_name.as_deref())?;
    let document_number = required(req.document_number.as_deref())?;
    let phone = required(req.phone.as_deref())?;
    let email = required(req.email.as_deref())?;

    if !is_valid_email(&email) {
        return Err(ApiError::validation("correo must look like local@domain.tld"));
    }

    Ok(PatientFields {
        full_name,
        document_number,
        phone,
        email,
    })
}

pub fn appointment_fields(req: &AppointmentRequest) -> Result<AppointmentFields, ApiError> {
    // A missing or zero patient reference counts as an empty field.
    let patient_id = match req.patient_id {
        None | Some(0) => return Err(ApiError::missing_fields()),
        Some(id) if id < 0 => return Err(ApiError::validation("paciente_id must be a positive integer")),
        Some(id) => id,
    };
    let date = required(req.date.as_deref())?;
    let time = required(req.time.as_deref())?;
    let practitioner = required(req.practitioner.as_deref())?;
    let raw_status = required(req.status.as_deref())?;

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("fecha must be YYYY-MM-DD"))?
        .format("%Y-%m-%d")
        .to_string();
    let time = NaiveTime::parse_from_str(&time, "%H:%M")
        .map_err(|_| ApiError::validation("hora must be HH:mm"))?
        .format("%H:%M")
        .to_string();
    let status: AppointmentStatus = raw_status
        .parse()
        .map_err(|_| ApiError::validation("estado must be one of pendiente, confirmada, cancelada"))?;

    Ok(AppointmentFields {
        patient_id,
        date,
        time,
        practitioner,
        status,
    })
}
