use crate::store::{StorageError, UniqueField};

/// Errors surfaced by the core services.
///
/// The exam idempotency-key unique violation is absent: it is converted into a
/// successful return of the existing exam and never reaches callers as an error.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    /// Input failed a structural rule (missing field, bad format, unknown modality, bad CPF).
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The record being created already exists (patient document).
    #[error("{0}")]
    Conflict(String),

    /// A uniqueness constraint other than the natural key being created fired.
    #[error("unexpected unique constraint violation on {field}")]
    UniqueViolation { field: UniqueField },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid startup configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl ClinicError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for failures caused by the caller's input (400/404/409 class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClinicError::Validation(_) | ClinicError::NotFound(_) | ClinicError::Conflict(_)
        )
    }
}

impl From<clinica_types::PageError> for ClinicError {
    fn from(err: clinica_types::PageError) -> Self {
        ClinicError::Validation(err.to_string())
    }
}

impl From<clinica_types::ModalityError> for ClinicError {
    fn from(err: clinica_types::ModalityError) -> Self {
        ClinicError::Validation(err.to_string())
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
