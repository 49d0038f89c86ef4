//! Input validation utilities.
//!
//! These turn raw request fields into the typed values the services work with. Every failure is
//! a `ClinicError::Validation` whose message names the offending field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::{ClinicError, ClinicResult};
use clinica_cpf::Cpf;
use clinica_types::{Modality, NonEmptyText};

/// Requires `value` to contain non-whitespace text.
pub fn required(field: &str, value: &str) -> ClinicResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| ClinicError::validation(format!("{field} is required")))
}

/// Requires `value` to contain non-whitespace text, keeping it exactly as given.
pub fn required_verbatim(field: &str, value: &str) -> ClinicResult<NonEmptyText> {
    NonEmptyText::verbatim(value)
        .map_err(|_| ClinicError::validation(format!("{field} is required")))
}

/// Parses a CPF, masked or not, into its canonical digits-only form.
///
/// # Errors
///
/// Returns `ClinicError::Validation` if the value is blank or fails the check-digit test.
pub fn parse_document(field: &str, value: &str) -> ClinicResult<Cpf> {
    let value = required(field, value)?;
    Cpf::parse(value.as_str())
        .map_err(|e| ClinicError::validation(format!("{field} is not a valid CPF: {e}")))
}

/// Timestamp without an offset, read as UTC.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses an ISO 8601 timestamp: RFC 3339 with an offset, or without one (read as UTC).
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parses a birth date given as `YYYY-MM-DD` or as an ISO 8601 timestamp, whose UTC date is
/// kept.
pub fn parse_birth_date(field: &str, value: &str) -> ClinicResult<NaiveDate> {
    let value = required(field, value)?;
    let value = value.as_str();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_timestamp(value)
        .map(|ts| ts.date_naive())
        .ok_or_else(|| {
            ClinicError::validation(format!(
                "{field} must be a date (YYYY-MM-DD) or an ISO 8601 timestamp"
            ))
        })
}

/// Parses an exam timestamp given as ISO 8601 (converted to UTC, no offset meaning UTC) or as
/// a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_exam_date(field: &str, value: &str) -> ClinicResult<DateTime<Utc>> {
    let value = required(field, value)?;
    let value = value.as_str();

    if let Some(ts) = parse_timestamp(value) {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ClinicError::validation(format!(
                "{field} must be an ISO 8601 timestamp or a date (YYYY-MM-DD)"
            ))
        })
}

pub fn parse_uuid(field: &str, value: &str) -> ClinicResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ClinicError::validation(format!("{field} must be a valid UUID")))
}

/// Parses a modality code. The error message lists the accepted values.
pub fn parse_modality(field: &str, value: &str) -> ClinicResult<Modality> {
    let value = required(field, value)?;
    value
        .as_str()
        .parse::<Modality>()
        .map_err(|e| ClinicError::validation(format!("{field}: {e}")))
}
