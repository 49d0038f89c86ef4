//! Persisted records and the validated payloads used to create them.
//!
//! Records serialise with camelCase field names, which is the wire format of the REST API.

use chrono::{DateTime, NaiveDate, Utc};
use clinica_cpf::Cpf;
use clinica_types::{Modality, NonEmptyText};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    /// CPF, digits only.
    #[schema(example = "12345678909")]
    pub document: String,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registered exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: Uuid,
    pub idempotency_key: String,
    pub patient_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub exam_date: DateTime<Utc>,
    pub modality: Modality,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `{id, name}` view of a patient nested in exam listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
}

/// An exam as returned by exam listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExamWithPatient {
    #[serde(flatten)]
    pub exam: Exam,
    pub patient: PatientSummary,
}

/// Validated payload for inserting a patient. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub name: NonEmptyText,
    pub document: Cpf,
    pub birth_date: NaiveDate,
}

/// Validated payload for inserting an exam. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExam {
    pub idempotency_key: NonEmptyText,
    pub patient_id: Uuid,
    pub description: Option<NonEmptyText>,
    pub exam_date: DateTime<Utc>,
    pub modality: Modality,
}

impl NewPatient {
    pub(crate) fn into_record(self, now: DateTime<Utc>) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            name: self.name.into_inner(),
            document: self.document.into_inner(),
            birth_date: self.birth_date,
            created_at: now,
            updated_at: now,
        }
    }
}

impl NewExam {
    pub(crate) fn into_record(self, now: DateTime<Utc>) -> Exam {
        Exam {
            id: Uuid::new_v4(),
            idempotency_key: self.idempotency_key.into_inner(),
            patient_id: self.patient_id,
            description: self.description.map(NonEmptyText::into_inner),
            exam_date: self.exam_date,
            modality: self.modality,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
        }
    }
}
