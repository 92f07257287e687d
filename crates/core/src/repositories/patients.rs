//! Patient registration.
//!
//! A user registers at most one patient record, and only with all three consents given. The
//! record is never re-created; later intake changes are out of scope here.

use super::{find_by_id, find_one, parse_id};
use crate::aggregation::PatientLookup;
use crate::config::CoreConfig;
use crate::models::{Patient, User};
use crate::store::{decode, encode, DocumentStore};
use crate::validation::{PatientForm, PatientShape};
use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use synapse_id::DocumentId;

#[derive(Clone)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
}

impl PatientService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, store }
    }

    /// Validate an intake form and store it as the patient record for `user_id`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] if the form fails [`PatientShape`], including any missing
    ///   consent.
    /// - [`CoreError::NotFound`] if the user does not exist.
    /// - [`CoreError::AlreadyRegistered`] if the user already has a patient record.
    pub async fn register_patient(&self, user_id: &str, form: &PatientForm) -> CoreResult<Patient> {
        let user_id = parse_id(user_id)?;
        let new_patient = PatientShape::validate(form)?;

        let user: Option<User> = find_by_id(
            self.store.as_ref(),
            self.cfg.users_collection_id(),
            user_id.as_str(),
        )
        .await?;
        if user.is_none() {
            return Err(CoreError::NotFound {
                entity: "user",
                id: user_id.into_string(),
            });
        }

        if self.get_patient(user_id.as_str()).await?.is_some() {
            return Err(CoreError::AlreadyRegistered(user_id.into_string()));
        }

        let mut document = encode(&new_patient)?;
        document.insert("userId".into(), Value::String(user_id.as_str().to_string()));

        let id = DocumentId::unique();
        let created = self
            .store
            .create(self.cfg.patients_collection_id(), id.as_str(), document)
            .await?;
        let patient: Patient = decode(created)?;
        tracing::info!("registered patient {} for user {}", patient.id, patient.user_id);
        Ok(patient)
    }

    /// The patient registered by `user_id`, if any.
    pub async fn get_patient(&self, user_id: &str) -> CoreResult<Option<Patient>> {
        find_one(
            self.store.as_ref(),
            self.cfg.patients_collection_id(),
            "userId",
            user_id,
        )
        .await
    }
}

#[async_trait]
impl PatientLookup for PatientService {
    async fn find_patient(&self, user_id: &str) -> CoreResult<Option<Patient>> {
        self.get_patient(user_id).await
    }
}
