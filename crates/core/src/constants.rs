//! Constants used throughout the Clinica core crate.
//!
//! Defaults that callers may want to test against or change live here rather than as literals
//! at their point of use.

pub use clinica_types::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

/// Default REST bind address when `CLINICA_REST_ADDR` is not set.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default base URL the CLI talks to when `CLINICA_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default PostgreSQL pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Default PostgreSQL pool acquire timeout, in seconds.
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// First bookable exam slot (hour of day, UTC).
pub const SLOT_FIRST_HOUR: u32 = 8;

/// Last bookable exam slot (hour of day, UTC). The slot starts exactly on the hour.
pub const SLOT_LAST_HOUR: u32 = 20;

/// Spacing between bookable exam slots, in minutes.
pub const SLOT_STEP_MINUTES: u32 = 30;

/// Unique constraint on `patients.document`.
pub const PATIENTS_DOCUMENT_CONSTRAINT: &str = "patients_document_key";

/// Unique constraint on `exams.idempotency_key`.
pub const EXAMS_IDEMPOTENCY_KEY_CONSTRAINT: &str = "exams_idempotency_key_key";

/// Foreign key from `exams.patient_id` to `patients.id`.
pub const EXAMS_PATIENT_FK_CONSTRAINT: &str = "exams_patient_id_fkey";
