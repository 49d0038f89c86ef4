//! Patient registration and listing.
//!
//! A patient's CPF is unique. Creation checks for an existing patient with the same document
//! before inserting; a concurrent request that slips between the check and the insert is caught
//! by the store's unique constraint and reported as the same conflict.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::error::{ClinicError, ClinicResult};
use crate::idempotency::reject_if_exists;
use crate::records::{NewPatient, Patient};
use crate::store::{DataStore, InsertOutcome, UniqueField};
use crate::validation::{parse_birth_date, parse_document, required};
use clinica_types::PageRequest;

/// Message returned when a document is already registered.
pub const PATIENT_ALREADY_REGISTERED: &str = "patient already registered";

/// Raw patient creation request, as received over the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatient {
    #[serde(default)]
    #[schema(example = "Maria da Silva")]
    pub name: String,
    /// CPF, masked or digits only.
    #[serde(default)]
    #[schema(example = "123.456.789-09")]
    pub document: String,
    /// `YYYY-MM-DD` or an ISO 8601 timestamp (UTC date kept).
    #[serde(default)]
    #[schema(example = "1990-01-15")]
    pub birth_date: String,
}

impl CreatePatient {
    fn validate(self) -> ClinicResult<NewPatient> {
        Ok(NewPatient {
            name: required("name", &self.name)?,
            document: parse_document("document", &self.document)?,
            birth_date: parse_birth_date("birthDate", &self.birth_date)?,
        })
    }
}

/// Service for patient operations.
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn DataStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Registers a new patient.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Validation` for a blank name, an invalid CPF or a malformed birth date.
    /// - `ClinicError::Conflict` if a patient with the same CPF exists, including when a
    ///   concurrent request registers it first.
    /// - `ClinicError::Storage` if the store fails.
    #[instrument(skip(self, req))]
    pub async fn create_patient(&self, req: CreatePatient) -> ClinicResult<Patient> {
        let new_patient = req.validate()?;
        let document = new_patient.document.as_str().to_owned();

        reject_if_exists(
            self.store.find_patient_by_document(&document),
            PATIENT_ALREADY_REGISTERED,
        )
        .await?;

        match self.store.insert_patient(new_patient).await? {
            InsertOutcome::Inserted(patient) => {
                tracing::info!(patient_id = %patient.id, "patient created");
                Ok(patient)
            }
            InsertOutcome::AlreadyExists(UniqueField::PatientDocument) => {
                tracing::warn!("patient document registered concurrently; lost race");
                Err(ClinicError::Conflict(PATIENT_ALREADY_REGISTERED.into()))
            }
            InsertOutcome::AlreadyExists(field) => Err(ClinicError::UniqueViolation { field }),
        }
    }

    /// Lists patients in registration order.
    #[instrument(skip(self))]
    pub async fn list_patients(&self, page: PageRequest) -> ClinicResult<Vec<Patient>> {
        Ok(self.store.list_patients(page.window()).await?)
    }
}
