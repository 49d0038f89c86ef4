//! Validated CPF wrapper type.

use crate::checksum::{format, inspect};
use crate::{CpfError, CpfResult};
use std::{fmt, str::FromStr};

/// A CPF that has passed normalisation and check-digit validation.
///
/// Once constructed the contained value is always exactly 11 ASCII digits with matching check
/// digits, so it can be stored and compared directly.
///
/// # Construction
/// [`Cpf::parse`] accepts any punctuation the user typed and reports the specific rule that
/// failed.
///
/// # Display format
/// `Display` produces the punctuated `DDD.DDD.DDD-DD` form. Use [`Cpf::as_str`] for the
/// digits-only storage form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cpf(String);

impl Cpf {
    /// Normalises and validates `input`.
    ///
    /// # Errors
    ///
    /// - [`CpfError::WrongLength`] if `input` does not contain exactly 11 digits
    /// - [`CpfError::RepeatedDigits`] if all digits are the same
    /// - [`CpfError::ChecksumMismatch`] if either check digit is wrong
    pub fn parse(input: &str) -> CpfResult<Self> {
        inspect(input).map(Self)
    }

    /// The digits-only storage form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The punctuated display form (`DDD.DDD.DDD-DD`).
    pub fn formatted(&self) -> String {
        format(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl FromStr for Cpf {
    type Err = CpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cpf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Cpf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Cpf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cpf::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises_punctuation() {
        let cpf = Cpf::parse("111.444.777-35").expect("valid CPF");
        assert_eq!(cpf.as_str(), "11144477735");
    }

    #[test]
    fn test_parse_rejects_short_input() {
        let err = Cpf::parse("111.444").expect_err("too short");
        assert_eq!(
            err,
            CpfError::WrongLength {
                value: "111.444".into(),
                digits: 6
            }
        );
    }

    #[test]
    fn test_parse_rejects_repeated_digits() {
        assert!(matches!(
            Cpf::parse("11111111111"),
            Err(CpfError::RepeatedDigits { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_check_digits() {
        assert!(matches!(
            Cpf::parse("12345678900"),
            Err(CpfError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_display_is_formatted() {
        let cpf = Cpf::parse("12345678909").unwrap();
        assert_eq!(cpf.to_string(), "123.456.789-09");
        assert_eq!(cpf.formatted(), "123.456.789-09");
    }

    #[test]
    fn test_from_str() {
        let cpf: Cpf = "529.982.247-25".parse().expect("valid CPF");
        assert_eq!(cpf.into_inner(), "52998224725");
    }

    #[test]
    fn test_equal_regardless_of_input_punctuation() {
        let a = Cpf::parse("123.456.789-09").unwrap();
        let b = Cpf::parse("12345678909").unwrap();
        assert_eq!(a, b);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_uses_storage_form() {
        let cpf = Cpf::parse("123.456.789-09").unwrap();
        let json = serde_json::to_string(&cpf).unwrap();
        assert_eq!(json, "\"12345678909\"");

        let back: Cpf = serde_json::from_str("\"123.456.789-09\"").unwrap();
        assert_eq!(back, cpf);

        let err = serde_json::from_str::<Cpf>("\"12345678900\"");
        assert!(err.is_err(), "invalid CPF should not deserialise");
    }
}
