//! Document identifier utilities.
//!
//! Every record in the Synapse document store is keyed by an opaque string identifier. The store
//! accepts caller-supplied identifiers or allocates its own; either way the identifier must obey
//! the same syntactic rules so that it can be embedded in REST paths and query strings.
//!
//! ## Identifier rules
//! - Length: 1 to 36 characters
//! - Characters: `a-z`, `A-Z`, `0-9`, `.`, `-`, `_`
//! - Must not start with `.`, `-` or `_`
//!
//! Freshly allocated identifiers use the 32 lowercase hex characters of a v4 UUID, which always
//! satisfies the rules above.
//!
//! Use [`DocumentId::parse`] for identifiers arriving from outside the core (path parameters,
//! CLI arguments, documents returned by a remote store).

mod id;

pub use id::DocumentId;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The identifier was empty.
    #[error("document id cannot be empty")]
    Empty,
    /// The identifier exceeded the maximum length.
    #[error("document id exceeds {max} characters: '{input}'")]
    TooLong { input: String, max: usize },
    /// The identifier contained a forbidden character or started with a special character.
    #[error("invalid document id: '{0}'")]
    InvalidCharacters(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
