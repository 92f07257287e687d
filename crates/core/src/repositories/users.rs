//! Signup and login.

use super::{find_by_id, find_one, parse_id};
use crate::aggregation::PatientLookup;
use crate::config::CoreConfig;
use crate::models::User;
use crate::store::{decode, encode, DocumentStore};
use crate::validation::{LoginForm, LoginShape, UserForm, UserShape};
use crate::CoreResult;
use serde::Serialize;
use std::sync::Arc;
use synapse_id::DocumentId;

/// Where a login attempt should go next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoginOutcome {
    /// No user has this email; the caller should offer signup.
    UnknownEmail,
    /// The user exists but has not completed patient registration.
    NeedsRegistration {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Registered {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "patientId")]
        patient_id: String,
    },
}

#[derive(Clone)]
pub struct UserService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, store }
    }

    /// Validate and create a user.
    ///
    /// Signup is idempotent by email: if a user with the same email exists it is returned
    /// unchanged and nothing is written.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`](crate::CoreError::Validation) for an invalid form, or a store
    /// error.
    pub async fn create_user(&self, form: &UserForm) -> CoreResult<User> {
        let new_user = UserShape::validate(form)?;

        if let Some(existing) = self.get_user_by_email(new_user.email.as_str()).await? {
            tracing::info!("signup for existing email, returning user {}", existing.id);
            return Ok(existing);
        }

        let id = DocumentId::unique();
        let document = self
            .store
            .create(self.cfg.users_collection_id(), id.as_str(), encode(&new_user)?)
            .await?;
        let user: User = decode(document)?;
        tracing::info!("created user {}", user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> CoreResult<Option<User>> {
        let id = parse_id(id)?;
        find_by_id(self.store.as_ref(), self.cfg.users_collection_id(), id.as_str()).await
    }

    /// Emails are stored lowercased, so the lookup ignores case.
    pub async fn get_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        find_one(
            self.store.as_ref(),
            self.cfg.users_collection_id(),
            "email",
            email.trim().to_lowercase(),
        )
        .await
    }

    /// Decide where a login by email leads: signup, patient registration or the dashboard.
    pub async fn resolve_login<L>(&self, form: &LoginForm, patients: &L) -> CoreResult<LoginOutcome>
    where
        L: PatientLookup + ?Sized,
    {
        let email = LoginShape::validate(form)?;

        let Some(user) = self.get_user_by_email(email.as_str()).await? else {
            return Ok(LoginOutcome::UnknownEmail);
        };

        Ok(match patients.find_patient(&user.id).await? {
            Some(patient) if patient.has_full_consent() => LoginOutcome::Registered {
                user_id: user.id,
                patient_id: patient.id,
            },
            Some(patient) => {
                tracing::warn!(
                    "patient {} is missing consent, sending user {} back to registration",
                    patient.id,
                    user.id
                );
                LoginOutcome::NeedsRegistration { user_id: user.id }
            }
            None => LoginOutcome::NeedsRegistration { user_id: user.id },
        })
    }
}
