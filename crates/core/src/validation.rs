//! Input validation for user-submitted forms.
//!
//! Each shape turns a raw form (every field optional, exactly as submitted) into a normalized,
//! validated value. Validation never panics and reports every failing field at once, so callers
//! can surface the messages next to the offending inputs.

use crate::constants::{GENDER_OPTIONS, IDENTIFICATION_TYPES};
use crate::models::{date_only, Gender};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use synapse_types::{EmailAddress, PhoneNumber};
use utoipa::ToSchema;

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// camelCase name of the form field.
    pub field: String,
    pub message: String,
}

/// All field errors produced by one validation run, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns true if `field` has at least one error.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub type Validation<T> = Result<T, ValidationErrors>;

const REQUIRED: &str = "Required";

/// Accumulates field errors while a shape inspects a form.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Required text of `min..=max` characters after trimming.
    fn text(
        &mut self,
        field: &str,
        value: &Option<String>,
        min: usize,
        max: usize,
        label: &str,
    ) -> Option<String> {
        let Some(trimmed) = value.as_deref().map(str::trim) else {
            self.fail(field, REQUIRED);
            return None;
        };
        self.bounded(field, trimmed, min, max, label)
    }

    /// Optional text; blank becomes `None`, otherwise bounded like [`Checker::text`].
    fn optional_text(
        &mut self,
        field: &str,
        value: &Option<String>,
        min: usize,
        max: usize,
        label: &str,
    ) -> Option<String> {
        let trimmed = value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        self.bounded(field, trimmed, min, max, label)
    }

    fn bounded(
        &mut self,
        field: &str,
        value: &str,
        min: usize,
        max: usize,
        label: &str,
    ) -> Option<String> {
        let len = value.chars().count();
        if len < min {
            self.fail(field, format!("{label} must be at least {min} characters."));
            return None;
        }
        if len > max {
            self.fail(field, format!("{label} must be at most {max} characters."));
            return None;
        }
        Some(value.to_string())
    }

    fn email(&mut self, field: &str, value: &Option<String>) -> Option<EmailAddress> {
        match value.as_deref().map(EmailAddress::parse) {
            None => {
                self.fail(field, REQUIRED);
                None
            }
            Some(Ok(email)) => Some(email),
            Some(Err(_)) => {
                self.fail(field, "Invalid email address.");
                None
            }
        }
    }

    fn phone(&mut self, field: &str, value: &Option<String>) -> Option<PhoneNumber> {
        match value.as_deref().map(PhoneNumber::parse) {
            None => {
                self.fail(field, REQUIRED);
                None
            }
            Some(Ok(phone)) => Some(phone),
            Some(Err(_)) => {
                self.fail(field, "Invalid phone number.");
                None
            }
        }
    }

    fn timestamp(&mut self, field: &str, value: &Option<String>) -> Option<DateTime<Utc>> {
        let Some(raw) = value.as_deref() else {
            self.fail(field, REQUIRED);
            return None;
        };
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(_) => {
                self.fail(field, "Invalid date.");
                None
            }
        }
    }

    fn date(&mut self, field: &str, value: &Option<String>) -> Option<NaiveDate> {
        let Some(raw) = value.as_deref() else {
            self.fail(field, REQUIRED);
            return None;
        };
        let parsed = date_only::parse(raw);
        if parsed.is_none() {
            self.fail(field, "Invalid date.");
        }
        parsed
    }

    /// The flag must be literally `true`.
    fn consent(&mut self, field: &str, value: Option<bool>, message: &str) -> bool {
        if value == Some(true) {
            true
        } else {
            self.fail(field, message);
            false
        }
    }

    fn finish(self) -> ValidationErrors {
        ValidationErrors(self.errors)
    }
}

// ============================================================================
// USER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
}

/// Signup: name of 2–30 characters, an email address and an international phone number.
pub struct UserShape;

impl UserShape {
    pub fn validate(form: &UserForm) -> Validation<NewUser> {
        let mut check = Checker::default();
        let name = check.text("name", &form.name, 2, 30, "Username");
        let email = check.email("email", &form.email);
        let phone = check.phone("phone", &form.phone);

        match (name, email, phone) {
            (Some(name), Some(email), Some(phone)) if check.errors.is_empty() => {
                Ok(NewUser { name, email, phone })
            }
            _ => Err(check.finish()),
        }
    }
}

// ============================================================================
// LOGIN
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoginForm {
    pub email: Option<String>,
}

pub struct LoginShape;

impl LoginShape {
    pub fn validate(form: &LoginForm) -> Validation<EmailAddress> {
        let mut check = Checker::default();
        match check.email("email", &form.email) {
            Some(email) => Ok(email),
            None => Err(check.finish()),
        }
    }
}

// ============================================================================
// PATIENT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_number: Option<String>,
    pub primary_physician: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub family_medical_history: Option<String>,
    pub past_medical_history: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub identification_document_ref: Option<String>,
    pub treatment_consent: Option<bool>,
    pub disclosure_consent: Option<bool>,
    pub privacy_consent: Option<bool>,
}

/// A validated intake submission, ready to be stored against a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: String,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    #[serde(with = "date_only")]
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: PhoneNumber,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_medication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past_medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identification_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identification_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identification_document_ref: Option<String>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
}

/// Full patient intake.
///
/// A submission is rejected unless all three consent flags are `true`, whatever the state of
/// the other fields.
pub struct PatientShape;

impl PatientShape {
    pub fn validate(form: &PatientForm) -> Validation<NewPatient> {
        let mut check = Checker::default();

        let name = check.text("name", &form.name, 2, 50, "Name");
        let email = check.email("email", &form.email);
        let phone = check.phone("phone", &form.phone);
        let birth_date = check.date("birthDate", &form.birth_date);
        let gender = match form.gender.as_deref().map(str::trim) {
            None => {
                check.fail("gender", REQUIRED);
                None
            }
            Some(raw) => {
                let parsed = Gender::parse(raw);
                if parsed.is_none() {
                    check.fail(
                        "gender",
                        format!("Gender must be one of: {}.", GENDER_OPTIONS.join(", ")),
                    );
                }
                parsed
            }
        };
        let address = check.text("address", &form.address, 5, 500, "Address");
        let occupation = check.text("occupation", &form.occupation, 2, 500, "Occupation");
        let emergency_contact_name = check.text(
            "emergencyContactName",
            &form.emergency_contact_name,
            2,
            50,
            "Contact name",
        );
        let emergency_contact_number =
            check.phone("emergencyContactNumber", &form.emergency_contact_number);
        let primary_physician =
            check.text("primaryPhysician", &form.primary_physician, 2, 100, "Primary physician");
        let insurance_provider = check.text(
            "insuranceProvider",
            &form.insurance_provider,
            2,
            50,
            "Insurance name",
        );
        let insurance_policy_number = check.text(
            "insurancePolicyNumber",
            &form.insurance_policy_number,
            2,
            50,
            "Policy number",
        );

        let allergies = check.optional_text("allergies", &form.allergies, 1, 1000, "Allergies");
        let current_medication = check.optional_text(
            "currentMedication",
            &form.current_medication,
            1,
            1000,
            "Current medication",
        );
        let family_medical_history = check.optional_text(
            "familyMedicalHistory",
            &form.family_medical_history,
            1,
            1000,
            "Family medical history",
        );
        let past_medical_history = check.optional_text(
            "pastMedicalHistory",
            &form.past_medical_history,
            1,
            1000,
            "Past medical history",
        );
        let identification_type = check.optional_text(
            "identificationType",
            &form.identification_type,
            1,
            100,
            "Identification type",
        );
        if let Some(kind) = identification_type.as_deref() {
            if !IDENTIFICATION_TYPES.contains(&kind) {
                check.fail("identificationType", "Unknown identification type.");
            }
        }
        let identification_number = check.optional_text(
            "identificationNumber",
            &form.identification_number,
            1,
            100,
            "Identification number",
        );
        let identification_document_ref = check.optional_text(
            "identificationDocumentRef",
            &form.identification_document_ref,
            1,
            255,
            "Identification document",
        );

        let treatment_consent = check.consent(
            "treatmentConsent",
            form.treatment_consent,
            "You must consent to treatment in order to proceed.",
        );
        let disclosure_consent = check.consent(
            "disclosureConsent",
            form.disclosure_consent,
            "You must consent to disclosure in order to proceed.",
        );
        let privacy_consent = check.consent(
            "privacyConsent",
            form.privacy_consent,
            "You must consent to privacy in order to proceed.",
        );

        if !check.errors.is_empty() {
            return Err(check.finish());
        }

        match (
            name,
            email,
            phone,
            birth_date,
            gender,
            address,
            occupation,
            emergency_contact_name,
            emergency_contact_number,
            primary_physician,
            insurance_provider,
            insurance_policy_number,
        ) {
            (
                Some(name),
                Some(email),
                Some(phone),
                Some(birth_date),
                Some(gender),
                Some(address),
                Some(occupation),
                Some(emergency_contact_name),
                Some(emergency_contact_number),
                Some(primary_physician),
                Some(insurance_provider),
                Some(insurance_policy_number),
            ) => Ok(NewPatient {
                name,
                email,
                phone,
                birth_date,
                gender,
                address,
                occupation,
                emergency_contact_name,
                emergency_contact_number,
                primary_physician,
                insurance_provider,
                insurance_policy_number,
                allergies,
                current_medication,
                family_medical_history,
                past_medical_history,
                identification_type,
                identification_number,
                identification_document_ref,
                treatment_consent,
                disclosure_consent,
                privacy_consent,
            }),
            _ => Err(check.finish()),
        }
    }
}

// ============================================================================
// APPOINTMENTS
// ============================================================================

/// Appointment lifecycle step a form is submitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentKind {
    Create,
    Schedule,
    Cancel,
}

impl AppointmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentKind::Create => "create",
            AppointmentKind::Schedule => "schedule",
            AppointmentKind::Cancel => "cancel",
        }
    }

    pub fn schema(self) -> AppointmentSchema {
        AppointmentSchema { kind: self }
    }
}

impl fmt::Display for AppointmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown appointment kind: '{0}'")]
pub struct UnknownAppointmentKind(pub String);

impl FromStr for AppointmentKind {
    type Err = UnknownAppointmentKind;

    /// Strict parse; unknown tags are an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AppointmentKind::Create),
            "schedule" => Ok(AppointmentKind::Schedule),
            "cancel" => Ok(AppointmentKind::Cancel),
            other => Err(UnknownAppointmentKind(other.to_string())),
        }
    }
}

/// Select the appointment schema for a discriminator tag.
///
/// Unknown tags select the `schedule` schema, which does not require a `reason`. This lenient
/// default matches the behaviour admin clients already depend on; use
/// [`AppointmentKind::from_str`] where an unknown tag should be rejected instead.
pub fn get_appointment_schema(tag: &str) -> AppointmentSchema {
    match tag.parse::<AppointmentKind>() {
        Ok(kind) => kind.schema(),
        Err(UnknownAppointmentKind(tag)) => {
            tracing::warn!(
                "unknown appointment kind '{}', falling back to schedule validation",
                tag
            );
            AppointmentKind::Schedule.schema()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentForm {
    pub primary_physician: Option<String>,
    /// RFC 3339 timestamp.
    pub schedule: Option<String>,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetails {
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

/// Validator for one [`AppointmentKind`].
///
/// All kinds require `primaryPhysician` and `schedule`. `create` also requires a `reason` and
/// `cancel` requires a `cancellationReason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentSchema {
    kind: AppointmentKind,
}

impl AppointmentSchema {
    pub fn kind(&self) -> AppointmentKind {
        self.kind
    }

    pub fn validate(&self, form: &AppointmentForm) -> Validation<AppointmentDetails> {
        let mut check = Checker::default();

        let primary_physician = check.text(
            "primaryPhysician",
            &form.primary_physician,
            2,
            100,
            "Primary physician",
        );
        let schedule = check.timestamp("schedule", &form.schedule);

        let reason = match self.kind {
            AppointmentKind::Create => check.text("reason", &form.reason, 2, 500, "Reason"),
            AppointmentKind::Schedule | AppointmentKind::Cancel => {
                check.optional_text("reason", &form.reason, 1, 500, "Reason")
            }
        };
        let note = check.optional_text("note", &form.note, 1, 500, "Note");
        let cancellation_reason = match self.kind {
            AppointmentKind::Cancel => check.text(
                "cancellationReason",
                &form.cancellation_reason,
                2,
                500,
                "Reason",
            ),
            AppointmentKind::Create | AppointmentKind::Schedule => None,
        };

        match (primary_physician, schedule) {
            (Some(primary_physician), Some(schedule)) if check.errors.is_empty() => {
                Ok(AppointmentDetails {
                    primary_physician,
                    schedule,
                    reason,
                    note,
                    cancellation_reason,
                })
            }
            _ => Err(check.finish()),
        }
    }
}
