//! # Clinica Core
//!
//! Core business logic for the Clinica patient and exam registry.
//!
//! This crate contains pure data operations:
//! - Patient creation (document uniqueness) and listing
//! - Exam creation (idempotency-key create-or-return) and listing
//! - The storage abstraction and its in-memory and PostgreSQL backends
//! - Exam time-slot schedule
//!
//! **No API concerns**: HTTP servers, routing and response shaping belong in `api-rest`; the
//! HTTP client belongs in `clinica-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod idempotency;
pub mod records;
pub mod repositories;
pub mod schedule;
pub mod store;
pub mod validation;

pub use clinica_cpf::Cpf;
pub use clinica_types::{Modality, NonEmptyText, PageRequest, PageWindow};
pub use config::{CoreConfig, DatabaseConfig, StoreBackend};
pub use error::{ClinicError, ClinicResult};
pub use records::{Exam, ExamWithPatient, NewExam, NewPatient, Patient, PatientSummary};
pub use repositories::exams::{CreateExam, ExamCreated, ExamService};
pub use repositories::patients::{CreatePatient, PatientService};
pub use store::{DataStore, InsertOutcome, MemoryDataStore, PostgresDataStore, UniqueField};
