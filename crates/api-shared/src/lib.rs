//! # API Shared
//!
//! Shared utilities and definitions for the Synapse APIs.
//!
//! Contains:
//! - Response DTOs shared by the REST server and the CLI
//! - Shared services like `HealthService`
//! - Admin passkey encoding and checking

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::{DoctorRes, ErrorRes, FieldErrorRes, HealthRes};
pub use health::HealthService;

/// Header carrying the base64-encoded admin passkey.
pub const ADMIN_PASSKEY_HEADER: &str = "x-admin-passkey";
