//! # Synapse Core
//!
//! Core business logic for the Synapse patient appointment system.
//!
//! This crate holds the domain model and everything that operates on it:
//! - Validation of signup, intake and appointment forms
//! - The document store seam, with in-memory and Appwrite backends
//! - Appointment aggregation with batched patient enrichment
//! - User, patient and appointment services
//!
//! **No API concerns**: HTTP servers, auth headers and CLI parsing belong in `api-rest`,
//! `api-shared` and `synapse-cli`.

pub mod aggregation;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod models;
pub mod repositories;
pub mod serialize;
pub mod store;
pub mod validation;

pub use aggregation::{aggregate, PatientLookup};
pub use config::{build_store, store_backend_from_env_values, CoreConfig, StoreBackend};
pub use error::{CoreError, CoreResult, StoreError, StoreResult};
pub use format::{format_date_time, FormattedDateTime};
pub use models::{
    Appointment, AppointmentStatus, AppointmentSummary, AppointmentView, Gender, Patient, User,
};
pub use repositories::appointments::AppointmentService;
pub use repositories::patients::PatientService;
pub use repositories::users::{LoginOutcome, UserService};
pub use serialize::serialize;
pub use store::{DocumentStore, MemoryStore};
pub use validation::{get_appointment_schema, AppointmentKind, FieldError, ValidationErrors};
