//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Binaries read environment variables and hand the raw values to the
//! functions here; request handling never touches the process environment.

use crate::constants::{
    DEFAULT_APPOINTMENTS_COLLECTION_ID, DEFAULT_DATABASE_ID, DEFAULT_PATIENTS_COLLECTION_ID,
    DEFAULT_USERS_COLLECTION_ID,
};
use crate::store::{AppwriteStore, DocumentStore, MemoryStore};
use crate::{CoreError, CoreResult};
use std::sync::Arc;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_id: String,
    users_collection_id: String,
    patients_collection_id: String,
    appointments_collection_id: String,
    admin_passkey: Option<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`. Every identifier must be non-blank.
    pub fn new(
        database_id: impl Into<String>,
        users_collection_id: impl Into<String>,
        patients_collection_id: impl Into<String>,
        appointments_collection_id: impl Into<String>,
    ) -> CoreResult<Self> {
        let cfg = Self {
            database_id: database_id.into(),
            users_collection_id: users_collection_id.into(),
            patients_collection_id: patients_collection_id.into(),
            appointments_collection_id: appointments_collection_id.into(),
            admin_passkey: None,
        };

        for (name, value) in [
            ("database_id", &cfg.database_id),
            ("users_collection_id", &cfg.users_collection_id),
            ("patients_collection_id", &cfg.patients_collection_id),
            ("appointments_collection_id", &cfg.appointments_collection_id),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("{name} cannot be empty")));
            }
        }

        Ok(cfg)
    }

    /// Build a config from optional raw values (typically environment variables).
    ///
    /// Missing or blank identifiers fall back to the crate defaults. A blank passkey disables the
    /// admin surface.
    pub fn from_values(
        database_id: Option<String>,
        users_collection_id: Option<String>,
        patients_collection_id: Option<String>,
        appointments_collection_id: Option<String>,
        admin_passkey: Option<String>,
    ) -> CoreResult<Self> {
        Ok(Self::new(
            value_or_default(database_id, DEFAULT_DATABASE_ID),
            value_or_default(users_collection_id, DEFAULT_USERS_COLLECTION_ID),
            value_or_default(patients_collection_id, DEFAULT_PATIENTS_COLLECTION_ID),
            value_or_default(appointments_collection_id, DEFAULT_APPOINTMENTS_COLLECTION_ID),
        )?
        .with_admin_passkey(admin_passkey))
    }

    pub fn with_admin_passkey(mut self, passkey: Option<String>) -> Self {
        self.admin_passkey = non_blank(passkey);
        self
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    pub fn users_collection_id(&self) -> &str {
        &self.users_collection_id
    }

    pub fn patients_collection_id(&self) -> &str {
        &self.patients_collection_id
    }

    pub fn appointments_collection_id(&self) -> &str {
        &self.appointments_collection_id
    }

    pub fn admin_passkey(&self) -> Option<&str> {
        self.admin_passkey.as_deref()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_id: DEFAULT_DATABASE_ID.into(),
            users_collection_id: DEFAULT_USERS_COLLECTION_ID.into(),
            patients_collection_id: DEFAULT_PATIENTS_COLLECTION_ID.into(),
            appointments_collection_id: DEFAULT_APPOINTMENTS_COLLECTION_ID.into(),
            admin_passkey: None,
        }
    }
}

/// Connection settings for a remote Appwrite instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
}

/// Which document store backend the process should use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store; contents are lost on exit.
    Memory,
    Appwrite(AppwriteSettings),
}

/// Resolve the store backend from optional Appwrite settings.
///
/// All three values present selects Appwrite, none present selects the in-memory store.
///
/// # Errors
///
/// Returns [`CoreError::Config`] when only some of the values are provided, which almost always
/// means a typo in the deployment environment.
pub fn store_backend_from_env_values(
    endpoint: Option<String>,
    project_id: Option<String>,
    api_key: Option<String>,
) -> CoreResult<StoreBackend> {
    match (non_blank(endpoint), non_blank(project_id), non_blank(api_key)) {
        (None, None, None) => Ok(StoreBackend::Memory),
        (Some(endpoint), Some(project_id), Some(api_key)) => {
            Ok(StoreBackend::Appwrite(AppwriteSettings {
                endpoint,
                project_id,
                api_key,
            }))
        }
        _ => Err(CoreError::Config(
            "APPWRITE_ENDPOINT, APPWRITE_PROJECT_ID and APPWRITE_API_KEY must be set together"
                .into(),
        )),
    }
}

/// Construct the document store selected by `backend`.
pub fn build_store(
    backend: &StoreBackend,
    cfg: &CoreConfig,
) -> CoreResult<Arc<dyn DocumentStore>> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory document store; data will not persist");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Appwrite(settings) => {
            tracing::info!("using Appwrite document store at {}", settings.endpoint);
            Ok(Arc::new(AppwriteStore::new(settings, cfg.database_id())?))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn value_or_default(value: Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_blank_identifiers() {
        let err = CoreConfig::new("db", " ", "patients", "appointments")
            .expect_err("blank collection should be rejected");
        assert!(matches!(err, CoreError::Config(msg) if msg.contains("users_collection_id")));
    }

    #[test]
    fn test_from_values_applies_defaults() {
        let cfg = CoreConfig::from_values(None, Some("  ".into()), None, None, None)
            .expect("defaults should be valid");
        assert_eq!(cfg.database_id(), DEFAULT_DATABASE_ID);
        assert_eq!(cfg.users_collection_id(), DEFAULT_USERS_COLLECTION_ID);
        assert_eq!(cfg.patients_collection_id(), DEFAULT_PATIENTS_COLLECTION_ID);
        assert_eq!(cfg.appointments_collection_id(), DEFAULT_APPOINTMENTS_COLLECTION_ID);
        assert_eq!(cfg.admin_passkey(), None);
    }

    #[test]
    fn test_from_values_keeps_overrides_and_passkey() {
        let cfg = CoreConfig::from_values(
            Some("clinic".into()),
            None,
            Some("intake".into()),
            None,
            Some(" 123456 ".into()),
        )
        .unwrap();
        assert_eq!(cfg.database_id(), "clinic");
        assert_eq!(cfg.patients_collection_id(), "intake");
        assert_eq!(cfg.admin_passkey(), Some("123456"));
    }

    #[test]
    fn test_store_backend_memory_when_unset() {
        let backend = store_backend_from_env_values(None, None, Some("".into())).unwrap();
        assert_eq!(backend, StoreBackend::Memory);
    }

    #[test]
    fn test_store_backend_appwrite_when_complete() {
        let backend = store_backend_from_env_values(
            Some("https://cloud.appwrite.io/v1".into()),
            Some("project".into()),
            Some("secret".into()),
        )
        .unwrap();
        assert_eq!(
            backend,
            StoreBackend::Appwrite(AppwriteSettings {
                endpoint: "https://cloud.appwrite.io/v1".into(),
                project_id: "project".into(),
                api_key: "secret".into(),
            })
        );
    }

    #[test]
    fn test_store_backend_rejects_partial_settings() {
        let err = store_backend_from_env_values(Some("https://x".into()), None, None)
            .expect_err("partial settings should fail");
        assert!(matches!(err, CoreError::Config(_)));
    }
}
