//! CPF utilities.
//!
//! The CPF (*Cadastro de Pessoas Físicas*) is the 11-digit Brazilian taxpayer identifier that
//! Clinica uses as each patient's document number.
//!
//! Clinica stores documents in a *canonical* form: **11 ASCII decimal digits**, no punctuation.
//! Users type them however they like (`123.456.789-09`, `123 456 789 09`, ...), so every entry
//! point normalises before validating or storing.
//!
//! This crate provides:
//! - Free functions for the form workflow: [`normalize`], [`format`], [`is_valid`] and
//!   [`validate`].
//! - A wrapper type ([`Cpf`]) that *guarantees* a structurally valid, canonical document once
//!   constructed.
//!
//! ## Check digits
//! The last two digits are check digits. Each is computed from the digits before it:
//!
//! ```text
//! d[9]  = ((d[0]*10 + d[1]*9 + ... + d[8]*2) * 10) % 11      (10 and 11 map to 0)
//! d[10] = ((d[0]*11 + d[1]*10 + ... + d[9]*2) * 10) % 11     (10 and 11 map to 0)
//! ```
//!
//! Documents made of one repeated digit (`000.000.000-00`, `111.111.111-11`, ...) satisfy both
//! equations but are never issued, so they are rejected explicitly.
//!
//! ## Display form
//! `DDD.DDD.DDD-DD`. [`format`] applies it progressively so it can be used on partial input
//! while a value is being typed.

mod checksum;
mod document;

pub use checksum::{check_digits, format, is_valid, normalize, validate};
pub use document::Cpf;

/// Number of digits in a complete CPF.
pub const CPF_LEN: usize = 11;

/// Error type for CPF operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CpfError {
    /// Form-level signal: the raw value is not a valid CPF.
    #[error("invalid CPF: '{value}'")]
    Invalid { value: String },

    /// The input does not contain exactly 11 digits.
    #[error("CPF must contain 11 digits, got {digits}: '{value}'")]
    WrongLength { value: String, digits: usize },

    /// All 11 digits are the same.
    #[error("CPF cannot be a single repeated digit: '{value}'")]
    RepeatedDigits { value: String },

    /// One of the check digits does not match.
    #[error("CPF check digits do not match: '{value}'")]
    ChecksumMismatch { value: String },
}

impl CpfError {
    /// The raw value that failed validation, as the caller supplied it.
    pub fn value(&self) -> &str {
        match self {
            CpfError::Invalid { value }
            | CpfError::WrongLength { value, .. }
            | CpfError::RepeatedDigits { value }
            | CpfError::ChecksumMismatch { value } => value,
        }
    }
}

/// Result type for CPF operations.
pub type CpfResult<T> = Result<T, CpfError>;
