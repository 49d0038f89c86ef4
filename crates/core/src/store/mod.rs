//! Storage abstraction.
//!
//! ```text
//! store/
//!   mod.rs      - DataStore trait, InsertOutcome, backend selection
//!   error.rs    - StorageError
//!   memory.rs   - In-memory implementation (tests, local development)
//!   postgres.rs - PostgreSQL implementation
//! ```
//!
//! Inserts report a uniqueness-constraint hit as a typed [`InsertOutcome::AlreadyExists`]
//! rather than an error, so services branch on an outcome instead of inspecting the shape of a
//! driver error. Only the PostgreSQL backend looks at driver error codes.

mod error;
mod memory;
mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{CoreConfig, StoreBackend};
use crate::error::{ClinicError, ClinicResult};
use crate::records::{Exam, ExamWithPatient, NewExam, NewPatient, Patient};
use clinica_types::PageWindow;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryDataStore;
pub use postgres::PostgresDataStore;

/// A column carrying a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    PatientDocument,
    ExamIdempotencyKey,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::PatientDocument => f.write_str("patients.document"),
            UniqueField::ExamIdempotencyKey => f.write_str("exams.idempotency_key"),
        }
    }
}

/// Result of an unconditional insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// The row was written.
    Inserted(T),
    /// A row with the same value in `field` already exists; nothing was written.
    AlreadyExists(UniqueField),
}

/// Abstract storage interface for patients and exams.
///
/// Implementations must be thread-safe (Send + Sync). Every read goes to the backend; nothing
/// is cached above this trait.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    // Patient operations

    /// Inserts a patient, assigning its id and timestamps.
    async fn insert_patient(&self, patient: NewPatient) -> StorageResult<InsertOutcome<Patient>>;

    async fn find_patient_by_id(&self, id: Uuid) -> StorageResult<Option<Patient>>;

    /// Looks up a patient by digits-only document.
    async fn find_patient_by_document(&self, document: &str) -> StorageResult<Option<Patient>>;

    /// Reference check used before inserting an exam.
    async fn patient_exists(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.find_patient_by_id(id).await?.is_some())
    }

    /// Lists patients in insertion order.
    async fn list_patients(&self, window: PageWindow) -> StorageResult<Vec<Patient>>;

    // Exam operations

    /// Inserts an exam, assigning its id and timestamps.
    ///
    /// Fails with [`StorageError::ForeignKeyViolation`] if `patient_id` does not exist.
    async fn insert_exam(&self, exam: NewExam) -> StorageResult<InsertOutcome<Exam>>;

    async fn find_exam_by_idempotency_key(&self, key: &str) -> StorageResult<Option<Exam>>;

    /// Lists exams in insertion order, each with its patient's `{id, name}`.
    async fn list_exams(&self, window: PageWindow) -> StorageResult<Vec<ExamWithPatient>>;

    /// Checks that the backend is reachable.
    async fn health_check(&self) -> StorageResult<()>;
}

/// Builds the store selected by `cfg`.
///
/// For PostgreSQL this connects the pool and creates the tables if they are missing.
///
/// # Errors
///
/// Returns `ClinicError::Configuration` if PostgreSQL is selected without database settings,
/// or `ClinicError::Storage` if the connection or table creation fails.
pub async fn open_store(cfg: &CoreConfig) -> ClinicResult<Arc<dyn DataStore>> {
    match cfg.store_backend() {
        StoreBackend::Memory => {
            tracing::info!("using in-memory store");
            Ok(Arc::new(MemoryDataStore::new()))
        }
        StoreBackend::Postgres => {
            let db = cfg.database().ok_or_else(|| {
                ClinicError::Configuration("postgres store selected without DATABASE_URL".into())
            })?;
            let store = PostgresDataStore::connect(db).await?;
            store.ensure_tables().await?;
            tracing::info!("using PostgreSQL store");
            Ok(Arc::new(store))
        }
    }
}
