//! Appointment aggregation: per-status counts plus patient enrichment.
//!
//! Patients are looked up once per distinct `userId`, concurrently, and mapped back onto the
//! appointments. A failed or empty lookup only leaves the affected appointments without a
//! `patient`; it never fails the aggregation.

use crate::models::{Appointment, AppointmentStatus, AppointmentSummary, AppointmentView, Patient};
use crate::CoreResult;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};

/// Resolves the patient registered for a user.
#[async_trait]
pub trait PatientLookup: Send + Sync {
    /// `Ok(None)` when the user has no patient record.
    async fn find_patient(&self, user_id: &str) -> CoreResult<Option<Patient>>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct StatusCounts {
    scheduled: usize,
    pending: usize,
    cancelled: usize,
}

impl StatusCounts {
    fn record(&mut self, status: &AppointmentStatus) {
        match status {
            AppointmentStatus::Scheduled => self.scheduled += 1,
            AppointmentStatus::Pending => self.pending += 1,
            AppointmentStatus::Cancelled => self.cancelled += 1,
            // Unknown statuses stay listed but are not counted.
            AppointmentStatus::Other(_) => {}
        }
    }
}

/// Count appointments by status and attach each one's patient.
///
/// `documents` keeps the input order and `total_count` is the number of input appointments.
pub async fn aggregate<L>(appointments: Vec<Appointment>, lookup: &L) -> AppointmentSummary
where
    L: PatientLookup + ?Sized,
{
    let mut counts = StatusCounts::default();
    for appointment in &appointments {
        counts.record(&appointment.status);
    }

    let mut seen = HashSet::new();
    let user_ids: Vec<&str> = appointments
        .iter()
        .map(|a| a.user_id.as_str())
        .filter(|id| seen.insert(*id))
        .collect();

    let results = join_all(user_ids.iter().map(|id| lookup.find_patient(id))).await;

    let mut patients: HashMap<&str, Patient> = HashMap::new();
    for (user_id, result) in user_ids.iter().zip(results) {
        match result {
            Ok(Some(patient)) => {
                patients.insert(*user_id, patient);
            }
            Ok(None) => tracing::debug!("no patient registered for user {}", user_id),
            Err(e) => tracing::warn!("patient lookup failed for user {}: {}", user_id, e),
        }
    }

    let total_count = appointments.len();
    let documents = appointments
        .iter()
        .map(|appointment| AppointmentView {
            patient: patients.get(appointment.user_id.as_str()).cloned(),
            appointment: appointment.clone(),
        })
        .collect();

    AppointmentSummary {
        total_count,
        scheduled_count: counts.scheduled,
        pending_count: counts.pending,
        cancelled_count: counts.cancelled,
        documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, StoreError};
    use crate::models::Gender;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Mutex;

    /// Knows a fixed set of users, fails for `broken_user` and records every call.
    struct FakeLookup {
        known: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeLookup {
        fn new(known: Vec<&'static str>) -> Self {
            Self {
                known,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PatientLookup for FakeLookup {
        async fn find_patient(&self, user_id: &str) -> CoreResult<Option<Patient>> {
            self.calls.lock().unwrap().push(user_id.to_string());
            if user_id == "broken_user" {
                return Err(CoreError::Store(StoreError::Backend("permission denied".into())));
            }
            Ok(self
                .known
                .contains(&user_id)
                .then(|| patient_for(user_id)))
        }
    }

    fn patient_for(user_id: &str) -> Patient {
        Patient {
            id: format!("patient_{user_id}"),
            user_id: user_id.to_string(),
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: "+1234567890".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            gender: Gender::Female,
            address: "123 Main Street".into(),
            occupation: "Engineer".into(),
            emergency_contact_name: "John Doe".into(),
            emergency_contact_number: "+1987654321".into(),
            primary_physician: "Nina Gupta".into(),
            insurance_provider: "BlueCross".into(),
            insurance_policy_number: "POL-1".into(),
            allergies: None,
            current_medication: None,
            family_medical_history: None,
            past_medical_history: None,
            identification_type: None,
            identification_number: None,
            identification_document_ref: None,
            treatment_consent: true,
            disclosure_consent: true,
            privacy_consent: true,
        }
    }

    fn appointment(id: &str, user_id: &str, status: &str) -> Appointment {
        Appointment {
            id: id.into(),
            created_at: None,
            user_id: user_id.into(),
            patient_id: format!("patient_{user_id}"),
            primary_physician: "Nina Gupta".into(),
            schedule: Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap(),
            status: AppointmentStatus::parse(status),
            reason: "Checkup".into(),
            note: None,
            cancellation_reason: None,
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let summary = aggregate(Vec::new(), &FakeLookup::new(vec![])).await;
        assert_eq!(
            summary,
            AppointmentSummary {
                total_count: 0,
                scheduled_count: 0,
                pending_count: 0,
                cancelled_count: 0,
                documents: vec![],
            }
        );
    }

    #[tokio::test]
    async fn test_counts_by_status() {
        let appointments = ["scheduled", "pending", "pending", "cancelled", "scheduled"]
            .iter()
            .enumerate()
            .map(|(i, s)| appointment(&format!("a{i}"), "u1", s))
            .collect();

        let summary = aggregate(appointments, &FakeLookup::new(vec!["u1"])).await;
        assert_eq!(summary.total_count, 5);
        assert_eq!(summary.scheduled_count, 2);
        assert_eq!(summary.pending_count, 2);
        assert_eq!(summary.cancelled_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_status_listed_but_not_counted() {
        let appointments = vec![
            appointment("a1", "u1", "scheduled"),
            appointment("a2", "u1", "archived"),
        ];
        let summary = aggregate(appointments, &FakeLookup::new(vec!["u1"])).await;

        let counted = summary.scheduled_count + summary.pending_count + summary.cancelled_count;
        assert_eq!(counted, 1);
        assert!(counted < summary.total_count);
        assert_eq!(summary.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_known_statuses_sum_to_total() {
        let appointments = vec![
            appointment("a1", "u1", "scheduled"),
            appointment("a2", "u1", "pending"),
            appointment("a3", "u1", "cancelled"),
        ];
        let summary = aggregate(appointments, &FakeLookup::new(vec!["u1"])).await;
        assert_eq!(
            summary.scheduled_count + summary.pending_count + summary.cancelled_count,
            summary.total_count
        );
    }

    #[tokio::test]
    async fn test_one_failed_lookup_is_isolated() {
        let appointments = vec![
            appointment("a1", "u1", "pending"),
            appointment("a2", "broken_user", "pending"),
            appointment("a3", "u2", "scheduled"),
            appointment("a4", "u3", "cancelled"),
        ];
        let summary =
            aggregate(appointments, &FakeLookup::new(vec!["u1", "u2", "u3"])).await;

        assert_eq!(summary.documents.len(), 4);
        let with_patient = summary.documents.iter().filter(|d| d.patient.is_some()).count();
        assert_eq!(with_patient, 3);
        assert!(summary.documents[1].patient.is_none());
        assert_eq!(summary.pending_count, 2);
    }

    #[tokio::test]
    async fn test_missing_patient_leaves_field_off() {
        let summary = aggregate(
            vec![appointment("a1", "nobody", "pending")],
            &FakeLookup::new(vec![]),
        )
        .await;

        let json = crate::serialize::serialize(&summary);
        assert!(json["documents"][0].get("patient").is_none());
        assert_eq!(json["documents"][0]["$id"], "a1");
        assert_eq!(json["totalCount"], 1);
    }

    #[tokio::test]
    async fn test_preserves_order_and_looks_up_each_user_once() {
        let appointments = vec![
            appointment("a1", "u2", "pending"),
            appointment("a2", "u1", "pending"),
            appointment("a3", "u2", "scheduled"),
            appointment("a4", "u1", "cancelled"),
        ];
        let lookup = FakeLookup::new(vec!["u1", "u2"]);
        let summary = aggregate(appointments, &lookup).await;

        let ids: Vec<&str> = summary
            .documents
            .iter()
            .map(|d| d.appointment.id.as_str())
            .collect();
        assert_eq!(ids, ["a1", "a2", "a3", "a4"]);
        assert_eq!(
            summary.documents[2].patient.as_ref().map(|p| p.user_id.as_str()),
            Some("u2")
        );

        let mut calls = lookup.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, ["u1", "u2"]);
    }
}
