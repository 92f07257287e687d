//! Admin passkey handling.
//!
//! The admin UI keeps the passkey base64-encoded and sends it in the
//! [`ADMIN_PASSKEY_HEADER`](crate::ADMIN_PASSKEY_HEADER) header. These helpers encode, decode
//! and check it against the configured passkey.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("admin passkey is not configured")]
    NotConfigured,
    #[error("admin passkey is missing")]
    Missing,
    #[error("admin passkey is not valid base64 text")]
    Malformed,
    #[error("invalid admin passkey")]
    Invalid,
}

/// Encode a passkey for storage on the client.
pub fn encrypt_key(passkey: &str) -> String {
    STANDARD.encode(passkey)
}

/// Reverse [`encrypt_key`].
pub fn decrypt_key(encoded: &str) -> Result<String, AuthError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::Malformed)?;
    String::from_utf8(bytes).map_err(|_| AuthError::Malformed)
}

/// Validates an encoded passkey against the configured one.
///
/// Returns `Ok(())` if the key is valid, or an error if it is invalid or missing, or no passkey
/// is configured.
pub fn validate_admin_passkey(
    provided_encoded: Option<&str>,
    expected: Option<&str>,
) -> Result<(), AuthError> {
    let expected = expected.ok_or(AuthError::NotConfigured)?;
    let provided = provided_encoded
        .filter(|p| !p.trim().is_empty())
        .ok_or(AuthError::Missing)?;

    if decrypt_key(provided)? == expected {
        Ok(())
    } else {
        Err(AuthError::Invalid)
    }
}
