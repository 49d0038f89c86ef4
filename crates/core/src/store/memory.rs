//! In-memory storage implementation for tests and local development.
//!
//! Tables are vectors in insertion order with hash indexes for the unique columns. All indexes
//! live behind one `RwLock`, so the uniqueness check and the write in an insert happen under the
//! same write guard, the in-process equivalent of a database unique constraint.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use super::{DataStore, InsertOutcome, StorageError, StorageResult, UniqueField};
use crate::records::{Exam, ExamWithPatient, NewExam, NewPatient, Patient, PatientSummary};
use clinica_types::PageWindow;

#[derive(Debug, Default)]
struct Tables {
    patients: Vec<Patient>,
    patients_by_id: HashMap<Uuid, usize>,
    patients_by_document: HashMap<String, usize>,
    exams: Vec<Exam>,
    exams_by_key: HashMap<String, usize>,
}

/// In-memory implementation of [`DataStore`].
///
/// # Performance Characteristics
///
/// - **Insert / find by key**: O(1) average (HashMap index)
/// - **List**: O(skip + take)
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    tables: RwLock<Tables>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory data store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of stored patients.
    pub async fn patient_count(&self) -> usize {
        self.tables.read().await.patients.len()
    }

    /// Number of stored exams.
    pub async fn exam_count(&self) -> usize {
        self.tables.read().await.exams.len()
    }
}

fn page<T: Clone>(rows: &[T], window: PageWindow) -> Vec<T> {
    let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
    let take = usize::try_from(window.take).unwrap_or(usize::MAX);
    rows.iter().skip(skip).take(take).cloned().collect()
}

#[async_trait]
impl DataStore for MemoryDataStore {
    #[instrument(skip(self, patient))]
    async fn insert_patient(&self, patient: NewPatient) -> StorageResult<InsertOutcome<Patient>> {
        let mut tables = self.tables.write().await;

        if tables
            .patients_by_document
            .contains_key(patient.document.as_str())
        {
            return Ok(InsertOutcome::AlreadyExists(UniqueField::PatientDocument));
        }

        let record = patient.into_record(chrono::Utc::now());
        let idx = tables.patients.len();
        tables.patients_by_id.insert(record.id, idx);
        tables
            .patients_by_document
            .insert(record.document.clone(), idx);
        tables.patients.push(record.clone());

        Ok(InsertOutcome::Inserted(record))
    }

    async fn find_patient_by_id(&self, id: Uuid) -> StorageResult<Option<Patient>> {
        let tables = self.tables.read().await;
        Ok(tables
            .patients_by_id
            .get(&id)
            .map(|idx| tables.patients[*idx].clone()))
    }

    async fn find_patient_by_document(&self, document: &str) -> StorageResult<Option<Patient>> {
        let tables = self.tables.read().await;
        Ok(tables
            .patients_by_document
            .get(document)
            .map(|idx| tables.patients[*idx].clone()))
    }

    async fn patient_exists(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.tables.read().await.patients_by_id.contains_key(&id))
    }

    async fn list_patients(&self, window: PageWindow) -> StorageResult<Vec<Patient>> {
        let tables = self.tables.read().await;
        Ok(page(&tables.patients, window))
    }

    #[instrument(skip(self, exam), fields(patient_id = %exam.patient_id))]
    async fn insert_exam(&self, exam: NewExam) -> StorageResult<InsertOutcome<Exam>> {
        let mut tables = self.tables.write().await;

        if tables
            .exams_by_key
            .contains_key(exam.idempotency_key.as_str())
        {
            return Ok(InsertOutcome::AlreadyExists(UniqueField::ExamIdempotencyKey));
        }

        if !tables.patients_by_id.contains_key(&exam.patient_id) {
            return Err(StorageError::ForeignKeyViolation {
                message: format!("patient {} does not exist", exam.patient_id),
            });
        }

        let record = exam.into_record(chrono::Utc::now());
        let idx = tables.exams.len();
        tables
            .exams_by_key
            .insert(record.idempotency_key.clone(), idx);
        tables.exams.push(record.clone());

        Ok(InsertOutcome::Inserted(record))
    }

    async fn find_exam_by_idempotency_key(&self, key: &str) -> StorageResult<Option<Exam>> {
        let tables = self.tables.read().await;
        Ok(tables
            .exams_by_key
            .get(key)
            .map(|idx| tables.exams[*idx].clone()))
    }

    async fn list_exams(&self, window: PageWindow) -> StorageResult<Vec<ExamWithPatient>> {
        let tables = self.tables.read().await;
        page(&tables.exams, window)
            .into_iter()
            .map(|exam| -> StorageResult<ExamWithPatient> {
                let patient = tables
                    .patients_by_id
                    .get(&exam.patient_id)
                    .map(|idx| PatientSummary::from(&tables.patients[*idx]))
                    .ok_or_else(|| StorageError::InternalError {
                        message: format!("exam {} references a missing patient", exam.id),
                    })?;
                Ok(ExamWithPatient { exam, patient })
            })
            .collect()
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
