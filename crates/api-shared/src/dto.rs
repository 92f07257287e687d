//! Wire types that are not domain records.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldErrorRes {
    pub field: String,
    pub message: String,
}

/// Body of every non-2xx REST response.
///
/// `fields` is only populated for validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorRes>,
}

impl ErrorRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(message: impl Into<String>, fields: Vec<FieldErrorRes>) -> Self {
        Self {
            message: message.into(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DoctorRes {
    pub name: String,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_res_omits_empty_fields() {
        let json = serde_json::to_value(ErrorRes::new("Appointment not found")).unwrap();
        assert_eq!(json, serde_json::json!({"message": "Appointment not found"}));
    }

    #[test]
    fn test_error_res_with_fields() {
        let res = ErrorRes::with_fields(
            "Validation failed",
            vec![FieldErrorRes {
                field: "phone".into(),
                message: "Invalid phone number.".into(),
            }],
        );
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["fields"][0]["field"], "phone");
    }
}
