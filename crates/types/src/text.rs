/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so
/// `"  Maria  "` is stored as `"Maria"` and `"   "` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but keeps the input exactly as given.
    ///
    /// For opaque client tokens, where `" key-1 "` and `"key-1"` are different values.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the input is empty or whitespace only.
    pub fn verbatim(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(input.to_owned()))
    }

    /// Like [`NonEmptyText::verbatim`], but treats blank input as absent rather than an error.
    ///
    /// Used for optional free-text fields where a form may submit an empty string.
    pub fn optional_verbatim(input: Option<impl AsRef<str>>) -> Option<Self> {
        input.and_then(|s| Self::verbatim(s).ok())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_whitespace() {
        let text = NonEmptyText::new("  Maria Souza  ").expect("non-empty");
        assert_eq!(text.as_str(), "Maria Souza");
    }

    #[test]
    fn test_new_rejects_blank() {
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(" \t\n"), Err(TextError::Empty));
    }

    #[test]
    fn test_verbatim_keeps_surrounding_whitespace() {
        let text = NonEmptyText::verbatim(" key-1 ").expect("non-empty");
        assert_eq!(text.as_str(), " key-1 ");
        assert_ne!(text, NonEmptyText::verbatim("key-1").unwrap());
        assert_eq!(NonEmptyText::verbatim(" \t"), Err(TextError::Empty));
    }

    #[test]
    fn test_optional_verbatim_treats_blank_as_absent() {
        assert_eq!(NonEmptyText::optional_verbatim(None::<&str>), None);
        assert_eq!(NonEmptyText::optional_verbatim(Some("   ")), None);
        assert_eq!(
            NonEmptyText::optional_verbatim(Some(" Chest X-Ray ")).map(String::from),
            Some(" Chest X-Ray ".to_string())
        );
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err());
        let ok: NonEmptyText = serde_json::from_str("\"key-1\"").unwrap();
        assert_eq!(ok.as_str(), "key-1");
    }
}
