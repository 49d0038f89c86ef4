//! Exam registration and listing.
//!
//! Exam creation is idempotent on the client-supplied `idempotencyKey`: retrying a request
//! returns the exam the first attempt created instead of writing a second row. See
//! [`crate::idempotency`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::error::{ClinicError, ClinicResult};
use crate::idempotency::{create_or_return, CreationState, CreationTracker};
use crate::records::{Exam, ExamWithPatient, NewExam};
use crate::store::{DataStore, UniqueField};
use crate::validation::{parse_exam_date, parse_modality, parse_uuid, required_verbatim};
use clinica_types::{NonEmptyText, PageRequest};

/// Message returned when the referenced patient does not exist.
pub const PATIENT_NOT_FOUND: &str = "patient not found";

/// Raw exam creation request, as received over the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExam {
    /// Client-generated key; retries must reuse it.
    #[serde(default)]
    #[schema(example = "8f14e45f-ceea-467f-a0e6-5b1d7a8c2d11")]
    pub idempotency_key: String,
    #[serde(default)]
    pub patient_id: String,
    /// ISO 8601 timestamp (no offset means UTC), or `YYYY-MM-DD` for midnight UTC.
    #[serde(default)]
    #[schema(example = "2024-05-02T14:30:00Z")]
    pub exam_date: String,
    #[serde(default)]
    #[schema(example = "MR")]
    pub modality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateExam {
    fn validate(self) -> ClinicResult<NewExam> {
        Ok(NewExam {
            idempotency_key: required_verbatim("idempotencyKey", &self.idempotency_key)?,
            patient_id: parse_uuid("patientId", &self.patient_id)?,
            exam_date: parse_exam_date("examDate", &self.exam_date)?,
            modality: parse_modality("modality", &self.modality)?,
            description: NonEmptyText::optional_verbatim(self.description),
        })
    }
}

/// Result of [`ExamService::create_exam`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamCreated {
    pub exam: Exam,
    /// True when an exam with the same idempotency key already existed.
    pub replayed: bool,
}

/// Service for exam operations.
#[derive(Clone)]
pub struct ExamService {
    store: Arc<dyn DataStore>,
}

impl ExamService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Creates an exam, or returns the existing one for a repeated idempotency key.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Validation` for a missing key, a malformed patient id or date, or an
    ///   unknown modality.
    /// - `ClinicError::NotFound` if the patient does not exist. Nothing is written.
    /// - `ClinicError::Storage` if the store fails.
    #[instrument(skip(self, req), fields(idempotency_key = %req.idempotency_key))]
    pub async fn create_exam(&self, req: CreateExam) -> ClinicResult<ExamCreated> {
        let new_exam = req.validate()?;
        let key = new_exam.idempotency_key.as_str().to_owned();
        let mut tracker = CreationTracker::new(&key);

        if !self.store.patient_exists(new_exam.patient_id).await? {
            tracker.advance(CreationState::Failed);
            return Err(ClinicError::NotFound(PATIENT_NOT_FOUND.into()));
        }
        tracker.advance(CreationState::ReferenceValidated);

        let created = create_or_return(
            &mut tracker,
            UniqueField::ExamIdempotencyKey,
            self.store.insert_exam(new_exam),
            || self.store.find_exam_by_idempotency_key(&key),
        )
        .await?;

        let replayed = created.is_replay();
        let exam = created.into_inner();
        if replayed {
            tracing::warn!(exam_id = %exam.id, "idempotency key replayed; returning existing exam");
        } else {
            tracing::info!(exam_id = %exam.id, "exam created");
        }

        Ok(ExamCreated { exam, replayed })
    }

    /// Lists exams in registration order, each with its patient's id and name.
    #[instrument(skip(self))]
    pub async fn list_exams(&self, page: PageRequest) -> ClinicResult<Vec<ExamWithPatient>> {
        Ok(self.store.list_exams(page.window()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::patients::{CreatePatient, PatientService};
    use crate::repositories::test_support::RecordingStore;
    use crate::store::MemoryDataStore;
    use clinica_types::{Modality, PageWindow};
    use uuid::Uuid;

    async fn seeded() -> (Arc<MemoryDataStore>, ExamService, Uuid) {
        let store = MemoryDataStore::new_shared();
        let patient = PatientService::new(store.clone())
            .create_patient(CreatePatient {
                name: "Maria".into(),
                document: "12345678909".into(),
                birth_date: "1990-01-15".into(),
            })
            .await
            .expect("patient should be created");
        (store.clone(), ExamService::new(store), patient.id)
    }

    fn request(key: &str, patient_id: Uuid) -> CreateExam {
        CreateExam {
            idempotency_key: key.into(),
            patient_id: patient_id.to_string(),
            exam_date: "2024-05-02T14:30:00Z".into(),
            modality: "MR".into(),
            description: Some("Knee".into()),
        }
    }

    #[tokio::test]
    async fn test_same_key_returns_same_exam() {
        let (store, service, patient_id) = seeded().await;

        let first = service
            .create_exam(request("key-1", patient_id))
            .await
            .expect("first create should succeed");
        let second = service
            .create_exam(request("key-1", patient_id))
            .await
            .expect("replay should succeed");

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.exam.id, second.exam.id);
        assert_eq!(first.exam.modality, Modality::Mr);
        assert_eq!(store.exam_count().await, 1);
    }

    #[tokio::test]
    async fn test_replay_ignores_changed_payload() {
        let (store, service, patient_id) = seeded().await;

        let first = service
            .create_exam(request("key-1", patient_id))
            .await
            .expect("first create should succeed");
        let second = service
            .create_exam(CreateExam {
                modality: "CT".into(),
                description: None,
                ..request("key-1", patient_id)
            })
            .await
            .expect("replay should succeed");

        assert_eq!(second.exam, first.exam);
        assert_eq!(store.exam_count().await, 1);
    }

    #[tokio::test]
    async fn test_keys_differing_in_whitespace_are_distinct() {
        let (store, service, patient_id) = seeded().await;

        let first = service
            .create_exam(request("key-1", patient_id))
            .await
            .expect("first create should succeed");
        let second = service
            .create_exam(CreateExam {
                modality: "CT".into(),
                ..request(" key-1 ", patient_id)
            })
            .await
            .expect("second create should succeed");

        assert!(!second.replayed);
        assert_ne!(first.exam.id, second.exam.id);
        assert_eq!(second.exam.idempotency_key, " key-1 ");
        assert_eq!(second.exam.modality, Modality::Ct);
        assert_eq!(store.exam_count().await, 2);
    }

    #[tokio::test]
    async fn test_description_is_stored_as_given() {
        let (_, service, patient_id) = seeded().await;

        let created = service
            .create_exam(CreateExam {
                description: Some("  Left knee, lateral view ".into()),
                ..request("key-1", patient_id)
            })
            .await
            .expect("create should succeed");
        assert_eq!(
            created.exam.description.as_deref(),
            Some("  Left knee, lateral view ")
        );
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_same_key_yield_one_exam() {
        let (store, service, patient_id) = seeded().await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.create_exam(request("shared", patient_id)).await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().expect("create should succeed").exam.id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.exam_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_patient_is_not_found_without_insert() {
        let (store, service, _) = seeded().await;

        let err = service
            .create_exam(request("key-1", Uuid::new_v4()))
            .await
            .expect_err("unknown patient should fail");

        assert!(matches!(err, ClinicError::NotFound(ref msg) if msg == PATIENT_NOT_FOUND));
        assert_eq!(store.exam_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_modality_is_validation_error() {
        let (store, service, patient_id) = seeded().await;

        let err = service
            .create_exam(CreateExam {
                modality: "INVALID".into(),
                ..request("key-1", patient_id)
            })
            .await
            .expect_err("unknown modality should fail");

        match err {
            ClinicError::Validation(msg) => assert!(msg.contains("CR, CT")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(store.exam_count().await, 0);
    }

    #[tokio::test]
    async fn test_blank_description_is_stored_as_absent() {
        let (_, service, patient_id) = seeded().await;

        let created = service
            .create_exam(CreateExam {
                description: Some("   ".into()),
                ..request("key-1", patient_id)
            })
            .await
            .expect("create should succeed");
        assert_eq!(created.exam.description, None);
    }

    #[tokio::test]
    async fn test_list_exams_uses_page_window() {
        let store = Arc::new(RecordingStore::new());
        let service = ExamService::new(store.clone());

        let exams = service
            .list_exams(PageRequest::new(3, 4).unwrap())
            .await
            .expect("list should succeed");
        assert!(exams.is_empty());
        assert_eq!(
            store.last_window(),
            Some(PageWindow { skip: 8, take: 4 })
        );
    }
}
