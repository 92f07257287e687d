//! Appointment booking, admin scheduling and cancellation, and listing.
//!
//! New appointments start `pending`. Admins move them to `scheduled` or `cancelled`; this layer
//! does not stop an appointment from moving between those states again.

use super::{entity_not_found, find_by_id, parse_id, patients::PatientService};
use crate::aggregation::aggregate;
use crate::config::CoreConfig;
use crate::constants::find_doctor;
use crate::models::{Appointment, AppointmentStatus, AppointmentSummary};
use crate::store::{decode, encode, Document, DocumentStore, Query};
use crate::validation::{
    get_appointment_schema, AppointmentDetails, AppointmentForm, AppointmentKind,
};
use crate::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use synapse_id::DocumentId;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewAppointment<'a> {
    user_id: &'a str,
    patient_id: &'a str,
    #[serde(flatten)]
    details: &'a AppointmentDetails,
    status: AppointmentStatus,
}

#[derive(Clone)]
pub struct AppointmentService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
    patients: PatientService,
}

impl AppointmentService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        let patients = PatientService::new(cfg.clone(), store.clone());
        Self {
            cfg,
            store,
            patients,
        }
    }

    /// Book an appointment for a registered patient. The appointment starts `pending`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] if the form fails the `create` schema.
    /// - [`CoreError::NotFound`] if the user has no patient record.
    /// - [`CoreError::InvalidInput`] if `patient_id` is not the user's patient.
    pub async fn create_appointment(
        &self,
        user_id: &str,
        patient_id: &str,
        form: &AppointmentForm,
    ) -> CoreResult<Appointment> {
        let user_id = parse_id(user_id)?;
        let details = AppointmentKind::Create.schema().validate(form)?;
        warn_unlisted_physician(&details.primary_physician);

        let patient = self
            .patients
            .get_patient(user_id.as_str())
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "patient",
                id: user_id.as_str().to_string(),
            })?;
        if patient.id != patient_id {
            return Err(CoreError::InvalidInput(format!(
                "patient '{patient_id}' does not belong to user '{user_id}'"
            )));
        }

        let document = encode(&NewAppointment {
            user_id: user_id.as_str(),
            patient_id,
            details: &details,
            status: AppointmentStatus::Pending,
        })?;

        let id = DocumentId::unique();
        let created = self
            .store
            .create(self.cfg.appointments_collection_id(), id.as_str(), document)
            .await?;
        let appointment: Appointment = decode(created)?;
        tracing::info!(
            "appointment {} requested by user {} with {}",
            appointment.id,
            appointment.user_id,
            appointment.primary_physician
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: &str) -> CoreResult<Option<Appointment>> {
        let id = parse_id(id)?;
        find_by_id(
            self.store.as_ref(),
            self.cfg.appointments_collection_id(),
            id.as_str(),
        )
        .await
    }

    /// Apply an admin action to an existing appointment.
    ///
    /// `kind` picks the validation schema via [`get_appointment_schema`], so an unknown tag is
    /// treated as `schedule`.
    pub async fn update_appointment(
        &self,
        id: &str,
        kind: &str,
        form: &AppointmentForm,
    ) -> CoreResult<Appointment> {
        let id = parse_id(id)?;
        let schema = get_appointment_schema(kind);
        let details = schema.validate(form)?;
        warn_unlisted_physician(&details.primary_physician);

        let changes = changes_for(schema.kind(), &details);
        let updated = self
            .store
            .update(self.cfg.appointments_collection_id(), id.as_str(), changes)
            .await
            .map_err(|e| entity_not_found("appointment", id.as_str(), e))?;
        let appointment: Appointment = decode(updated)?;
        tracing::info!(
            "appointment {} updated by {} action, status now {}",
            appointment.id,
            schema.kind(),
            appointment.status
        );
        Ok(appointment)
    }

    /// Every appointment, newest first, with counts and patients attached.
    pub async fn recent_appointments(&self) -> CoreResult<AppointmentSummary> {
        self.summarize(Query::recent_first()).await
    }

    /// One user's appointments, newest first, with counts and patients attached.
    pub async fn patient_appointments(&self, user_id: &str) -> CoreResult<AppointmentSummary> {
        let user_id = parse_id(user_id)?;
        self.summarize(Query::recent_first().equal("userId", user_id.into_string()))
            .await
    }

    async fn summarize(&self, query: Query) -> CoreResult<AppointmentSummary> {
        let list = self
            .store
            .list(self.cfg.appointments_collection_id(), &query)
            .await
            .inspect_err(|e| tracing::error!("failed to list appointments: {}", e))?;

        let appointments = list
            .documents
            .into_iter()
            .filter_map(|document| {
                let id = document
                    .get("$id")
                    .and_then(Value::as_str)
                    .unwrap_or("<no id>")
                    .to_string();
                decode::<Appointment>(document)
                    .inspect_err(|e| tracing::warn!("skipping appointment {}: {}", id, e))
                    .ok()
            })
            .collect::<Vec<_>>();

        Ok(aggregate(appointments, &self.patients).await)
    }
}

/// Bookings may name any physician; one missing from the roster is logged, not rejected.
fn warn_unlisted_physician(name: &str) -> bool {
    let listed = find_doctor(name).is_some();
    if !listed {
        tracing::warn!("physician '{}' is not on the doctor roster", name);
    }
    listed
}

/// Fields an admin action writes. `create` re-submits the booking and leaves status alone.
fn changes_for(kind: AppointmentKind, details: &AppointmentDetails) -> Document {
    let mut changes = Document::new();
    changes.insert(
        "primaryPhysician".into(),
        Value::String(details.primary_physician.clone()),
    );
    changes.insert("schedule".into(), crate::serialize::serialize(&details.schedule));

    match kind {
        AppointmentKind::Schedule => {
            changes.insert("status".into(), Value::String("scheduled".into()));
        }
        AppointmentKind::Cancel => {
            changes.insert("status".into(), Value::String("cancelled".into()));
            if let Some(reason) = &details.cancellation_reason {
                changes.insert("cancellationReason".into(), Value::String(reason.clone()));
            }
        }
        AppointmentKind::Create => {
            if let Some(reason) = &details.reason {
                changes.insert("reason".into(), Value::String(reason.clone()));
            }
            if let Some(note) = &details.note {
                changes.insert("note".into(), Value::String(note.clone()));
            }
        }
    }
    changes
}
