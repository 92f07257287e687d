use crate::validation::ValidationErrors;

/// Failures raised by a [`DocumentStore`](crate::store::DocumentStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },
    #[error("document store rejected the request: {0}")]
    Backend(String),
    #[error("document store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode document: {0}")]
    Decode(String),
    #[error("value cannot be stored as a document: {0}")]
    Encode(String),
    #[error("document store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("user '{0}' already has a registered patient record")]
    AlreadyRegistered(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<synapse_id::IdError> for CoreError {
    fn from(err: synapse_id::IdError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
