//! Implementation of [`DocumentId`].

use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// A validated document identifier.
///
/// Once constructed the contained string is guaranteed to satisfy the identifier rules described
/// in the crate documentation.
///
/// # Construction
/// - [`DocumentId::unique`] allocates a fresh identifier.
/// - [`DocumentId::parse`] validates an externally supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    /// Maximum identifier length accepted by the store.
    pub const MAX_LEN: usize = 36;

    /// Allocates a new identifier from a random v4 UUID in simple (unhyphenated) form.
    pub fn unique() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Validates and wraps an identifier string.
    ///
    /// The input is not normalised: surrounding whitespace is rejected like any other
    /// forbidden character.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if `input` is empty, longer than [`DocumentId::MAX_LEN`], contains a
    /// forbidden character, or starts with `.`, `-` or `_`.
    pub fn parse(input: &str) -> IdResult<Self> {
        if input.is_empty() {
            return Err(IdError::Empty);
        }

        if input.len() > Self::MAX_LEN {
            return Err(IdError::TooLong {
                input: input.to_owned(),
                max: Self::MAX_LEN,
            });
        }

        if !Self::is_valid(input) {
            return Err(IdError::InvalidCharacters(input.to_owned()));
        }

        Ok(Self(input.to_owned()))
    }

    /// Returns true if `input` satisfies the identifier character rules.
    ///
    /// Length is not checked here beyond non-emptiness; [`DocumentId::parse`] enforces the
    /// upper bound.
    pub fn is_valid(input: &str) -> bool {
        let mut bytes = input.bytes();
        let Some(first) = bytes.next() else {
            return false;
        };

        first.is_ascii_alphanumeric()
            && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for DocumentId {
    type Err = IdError;

    /// Equivalent to [`DocumentId::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DocumentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DocumentId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_generates_valid_id() {
        let id = DocumentId::unique();
        assert_eq!(id.as_str().len(), 32);
        assert!(DocumentId::is_valid(id.as_str()));
        assert!(DocumentId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn test_unique_ids_differ() {
        assert_ne!(DocumentId::unique(), DocumentId::unique());
    }

    #[test]
    fn test_parse_accepts_store_style_ids() {
        for input in ["66f1c2a9003b1d5e8a7f", "user_42", "a.b-c_d", "Z"] {
            let id = DocumentId::parse(input).expect("should parse");
            assert_eq!(id.as_str(), input);
        }
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(DocumentId::parse(""), Err(IdError::Empty)));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let input = "a".repeat(37);
        assert!(matches!(
            DocumentId::parse(&input),
            Err(IdError::TooLong { max: 36, .. })
        ));
        assert!(DocumentId::parse(&"a".repeat(36)).is_ok());
    }

    #[test]
    fn test_parse_rejects_leading_special_character() {
        for input in ["_abc", "-abc", ".abc"] {
            assert!(
                matches!(DocumentId::parse(input), Err(IdError::InvalidCharacters(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_invalid_characters() {
        for input in ["abc def", "abc/def", "abc$", " abc", "ab\u{e9}"] {
            assert!(DocumentId::parse(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_from_str_matches_parse() {
        let id: DocumentId = "appt1".parse().expect("should parse");
        assert_eq!(id.to_string(), "appt1");
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let id = DocumentId::parse("appt1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"appt1\"");

        let err = serde_json::from_str::<DocumentId>("\"-bad\"");
        assert!(err.is_err());
    }
}
