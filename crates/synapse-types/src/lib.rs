//! Validated primitive types shared across Synapse crates.
//!
//! Each type here can only be constructed through a parsing function that enforces its format,
//! so holders of a value can rely on it without re-checking.

use regex::Regex;
use std::sync::LazyLock;

/// International phone format: a leading `+`, a non-zero first digit, 7 to 15 digits in total.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("phone pattern is valid"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not an international phone number
    #[error("Invalid phone number.")]
    InvalidPhone,
    /// The input was not an email address
    #[error("Invalid email address.")]
    InvalidEmail,
}

/// A phone number in international format, e.g. `+14155550123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses a phone number after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidPhone`] when the
    /// number lacks the leading `+`, starts with `0`, or has fewer than 7 or more than 15 digits.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if !PHONE_PATTERN.is_match(trimmed) {
            return Err(TextError::InvalidPhone);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An email address with a local part, a domain and a dot in the domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses an email address after trimming surrounding whitespace. The address is stored
    /// lowercased so lookups by email ignore case.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidEmail`] otherwise.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if !EMAIL_PATTERN.is_match(trimmed) {
            return Err(TextError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($ty:ident) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> String {
                value.0
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $ty::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_newtype_impls!(PhoneNumber);
string_newtype_impls!(EmailAddress);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_accepts_international_number() {
        let phone = PhoneNumber::parse("+1234567890").expect("should parse");
        assert_eq!(phone.as_str(), "+1234567890");
    }

    #[test]
    fn test_phone_trims_whitespace() {
        let phone = PhoneNumber::parse("  +447700900123 ").expect("should parse");
        assert_eq!(phone.as_str(), "+447700900123");
    }

    #[test]
    fn test_phone_rejects_missing_plus() {
        assert_eq!(
            PhoneNumber::parse("1234567890"),
            Err(TextError::InvalidPhone)
        );
    }

    #[test]
    fn test_phone_rejects_too_short() {
        assert_eq!(PhoneNumber::parse("+12345"), Err(TextError::InvalidPhone));
    }

    #[test]
    fn test_phone_rejects_too_long() {
        assert_eq!(
            PhoneNumber::parse("+1234567890123456"),
            Err(TextError::InvalidPhone)
        );
        assert!(PhoneNumber::parse("+123456789012345").is_ok());
    }

    #[test]
    fn test_phone_rejects_leading_zero_and_letters() {
        assert!(PhoneNumber::parse("+0987654321").is_err());
        assert!(PhoneNumber::parse("not-a-phone").is_err());
    }

    #[test]
    fn test_phone_rejects_blank() {
        assert_eq!(PhoneNumber::parse("   "), Err(TextError::Empty));
    }

    #[test]
    fn test_email_accepts_address() {
        let email = EmailAddress::parse("john@example.com").expect("should parse");
        assert_eq!(email.to_string(), "john@example.com");
    }

    #[test]
    fn test_email_normalizes_case() {
        let email = EmailAddress::parse(" Jane.Doe@Example.COM ").expect("should parse");
        assert_eq!(email.as_str(), "jane.doe@example.com");
        assert_eq!(email, EmailAddress::parse("jane.doe@example.com").unwrap());
    }

    #[test]
    fn test_email_rejects_invalid() {
        assert_eq!(
            EmailAddress::parse("not-an-email"),
            Err(TextError::InvalidEmail)
        );
        assert_eq!(EmailAddress::parse("a@b"), Err(TextError::InvalidEmail));
        assert_eq!(EmailAddress::parse(""), Err(TextError::Empty));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: PhoneNumber = serde_json::from_str("\"+1234567890\"").unwrap();
        assert_eq!(ok.as_str(), "+1234567890");
        assert!(serde_json::from_str::<EmailAddress>("\"nope\"").is_err());
    }
}
