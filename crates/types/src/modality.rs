use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Imaging modality of an exam, using the DICOM modality codes accepted by Clinica.
///
/// Serialised as the upper-case code (`"CT"`, `"MR"`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Computed radiography
    Cr,
    /// Computed tomography
    Ct,
    /// Digital radiography
    Dx,
    /// Mammography
    Mg,
    /// Magnetic resonance
    Mr,
    /// Nuclear medicine
    Nm,
    /// Other
    Ot,
    /// Positron emission tomography
    Pt,
    /// Radio fluoroscopy
    Rf,
    /// Ultrasound
    Us,
    /// X-ray angiography
    Xa,
}

impl Modality {
    /// Every accepted modality, in code order.
    pub const ALL: [Modality; 11] = [
        Modality::Cr,
        Modality::Ct,
        Modality::Dx,
        Modality::Mg,
        Modality::Mr,
        Modality::Nm,
        Modality::Ot,
        Modality::Pt,
        Modality::Rf,
        Modality::Us,
        Modality::Xa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Cr => "CR",
            Modality::Ct => "CT",
            Modality::Dx => "DX",
            Modality::Mg => "MG",
            Modality::Mr => "MR",
            Modality::Nm => "NM",
            Modality::Ot => "OT",
            Modality::Pt => "PT",
            Modality::Rf => "RF",
            Modality::Us => "US",
            Modality::Xa => "XA",
        }
    }

    /// Comma-separated list of accepted codes, for error messages.
    pub fn accepted_values() -> String {
        Self::ALL
            .iter()
            .map(Modality::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModalityError {
    #[error("invalid modality '{value}'. Accepted values: {accepted}", accepted = Modality::accepted_values())]
    Unknown { value: String },
}

impl FromStr for Modality {
    type Err = ModalityError;

    /// Parses an exact upper-case code. Lower-case input is rejected, matching the stored form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ModalityError::Unknown {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_every_code() {
        for code in [
            "CR", "CT", "DX", "MG", "MR", "NM", "OT", "PT", "RF", "US", "XA",
        ] {
            let modality: Modality = code.parse().expect("known modality");
            assert_eq!(modality.as_str(), code);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_lowercase() {
        assert!("INVALID".parse::<Modality>().is_err());
        assert!("ct".parse::<Modality>().is_err());
        assert!("".parse::<Modality>().is_err());
    }

    #[test]
    fn test_error_lists_accepted_values() {
        let err = "XX".parse::<Modality>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid modality 'XX'. Accepted values: CR, CT, DX, MG, MR, NM, OT, PT, RF, US, XA"
        );
    }

    #[test]
    fn test_serde_uses_upper_case_code() {
        assert_eq!(serde_json::to_string(&Modality::Xa).unwrap(), "\"XA\"");
        let parsed: Modality = serde_json::from_str("\"MG\"").unwrap();
        assert_eq!(parsed, Modality::Mg);
        assert!(serde_json::from_str::<Modality>("\"mg\"").is_err());
    }
}
