//! # API REST
//!
//! REST API implementation for Synapse.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, status codes, CORS, the admin passkey header)
//!
//! Uses `api-shared` for common types and utilities. The server binary lives in the workspace
//! root package (`synapse-run`); this crate only builds the [`Router`].

#![warn(rust_2018_idioms)]

use api_shared::auth::{validate_admin_passkey, AuthError};
use api_shared::{
    DoctorRes, ErrorRes, FieldErrorRes, HealthRes, HealthService, ADMIN_PASSKEY_HEADER,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use synapse_core::constants::DOCTORS;
use synapse_core::validation::{AppointmentForm, LoginForm, PatientForm, UserForm};
use synapse_core::{
    Appointment, AppointmentKind, AppointmentService, AppointmentSummary, AppointmentView,
    CoreConfig, CoreError, DocumentStore, FieldError, Gender, LoginOutcome, Patient,
    PatientService, User, UserService,
};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server.
///
/// Services share one configuration and one store handle.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    users: UserService,
    patients: PatientService,
    appointments: AppointmentService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: UserService::new(cfg.clone(), store.clone()),
            patients: PatientService::new(cfg.clone(), store.clone()),
            appointments: AppointmentService::new(cfg.clone(), store),
            cfg,
        }
    }
}

/// Booking request: the patient the appointment is for plus the appointment form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentReq {
    pub patient_id: String,
    #[serde(flatten)]
    pub form: AppointmentForm,
}

/// Admin action on an appointment. `type` is `create`, `schedule` or `cancel`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateAppointmentReq {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub form: AppointmentForm,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_doctors,
        create_user,
        get_user,
        login,
        register_patient,
        get_patient,
        create_appointment,
        user_appointments,
        get_appointment,
        admin_appointments,
        update_appointment,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        FieldErrorRes,
        DoctorRes,
        User,
        Gender,
        Patient,
        Appointment,
        AppointmentView,
        AppointmentSummary,
        AppointmentKind,
        UserForm,
        LoginForm,
        PatientForm,
        AppointmentForm,
        CreateAppointmentReq,
        UpdateAppointmentReq,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/doctors", get(list_doctors))
        .route("/users", post(create_user))
        .route("/users/:user_id", get(get_user))
        .route("/login", post(login))
        .route(
            "/users/:user_id/patient",
            post(register_patient).get(get_patient),
        )
        .route(
            "/users/:user_id/appointments",
            post(create_appointment).get(user_appointments),
        )
        .route("/appointments/:id", get(get_appointment))
        .route("/admin/appointments", get(admin_appointments))
        .route("/admin/appointments/:id", put(update_appointment))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Errors a handler can return, rendered as an [`ErrorRes`] body.
#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    Unauthorized(AuthError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err)
    }
}

fn field_errors(errors: Vec<FieldError>) -> Vec<FieldErrorRes> {
    errors
        .into_iter()
        .map(|e| FieldErrorRes {
            field: e.field,
            message: e.message,
        })
        .collect()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Core(CoreError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                ErrorRes::with_fields("Validation failed", field_errors(errors.into_errors())),
            ),
            ApiError::Core(e @ CoreError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, ErrorRes::new(e.to_string()))
            }
            ApiError::Core(e @ CoreError::AlreadyRegistered(_)) => {
                (StatusCode::CONFLICT, ErrorRes::new(e.to_string()))
            }
            ApiError::Core(e @ CoreError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, ErrorRes::new(e.to_string()))
            }
            ApiError::Core(e) => {
                tracing::error!("request failed: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorRes::new("Internal error"),
                )
            }
            ApiError::Unauthorized(e) => {
                tracing::warn!("admin request rejected: {}", e);
                (StatusCode::UNAUTHORIZED, ErrorRes::new(e.to_string()))
            }
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let provided = headers
        .get(ADMIN_PASSKEY_HEADER)
        .and_then(|v| v.to_str().ok());
    validate_admin_passkey(provided, state.cfg.admin_passkey())?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/doctors",
    responses(
        (status = 200, description = "Doctors patients can book with", body = [DoctorRes])
    )
)]
#[axum::debug_handler]
async fn list_doctors(State(_state): State<AppState>) -> Json<Vec<DoctorRes>> {
    Json(
        DOCTORS
            .iter()
            .map(|d| DoctorRes {
                name: d.name.to_string(),
                image: d.image.to_string(),
            })
            .collect(),
    )
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = UserForm,
    responses(
        (status = 201, description = "User created, or the existing user for this email", body = User),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Sign up a user.
///
/// Signing up again with an email that already exists returns that user.
#[axum::debug_handler]
async fn create_user(
    State(state): State<AppState>,
    Json(form): Json<UserForm>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.create_user(&form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = String, Path, description = "User document id")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 404, description = "No such user", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = state
        .users
        .get_user(&user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "user",
            id: user_id,
        })?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginForm,
    responses(
        (status = 200, description = "Next step for this email: `{\"status\": \"unknownEmail\"}`, `{\"status\": \"needsRegistration\", \"userId\"}` or `{\"status\": \"registered\", \"userId\", \"patientId\"}`"),
        (status = 400, description = "Validation failed", body = ErrorRes)
    )
)]
/// Resolve a login by email to signup, patient registration or the dashboard.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> ApiResult<Json<LoginOutcome>> {
    let outcome = state.users.resolve_login(&form, &state.patients).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/patient",
    params(("user_id" = String, Path, description = "User document id")),
    request_body = PatientForm,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "Validation failed, including missing consent", body = ErrorRes),
        (status = 404, description = "No such user", body = ErrorRes),
        (status = 409, description = "User already registered a patient", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn register_patient(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(form): Json<PatientForm>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    let patient = state.patients.register_patient(&user_id, &form).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/patient",
    params(("user_id" = String, Path, description = "User document id")),
    responses(
        (status = 200, description = "The user's patient record", body = Patient),
        (status = 404, description = "User has not registered", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Patient>> {
    let patient = state
        .patients
        .get_patient(&user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "patient",
            id: user_id,
        })?;
    Ok(Json(patient))
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/appointments",
    params(("user_id" = String, Path, description = "User document id")),
    request_body = CreateAppointmentReq,
    responses(
        (status = 201, description = "Appointment requested, status pending", body = Appointment),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 404, description = "User has not registered", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn create_appointment(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<CreateAppointmentReq>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    let appointment = state
        .appointments
        .create_appointment(&user_id, &req.patient_id, &req.form)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/appointments",
    params(("user_id" = String, Path, description = "User document id")),
    responses(
        (status = 200, description = "The user's appointments, newest first", body = AppointmentSummary),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn user_appointments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<AppointmentSummary>> {
    Ok(Json(state.appointments.patient_appointments(&user_id).await?))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment document id")),
    responses(
        (status = 200, description = "The appointment", body = Appointment),
        (status = 404, description = "No such appointment", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    let appointment = state
        .appointments
        .get_appointment(&id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "appointment",
            id,
        })?;
    Ok(Json(appointment))
}

#[utoipa::path(
    get,
    path = "/admin/appointments",
    params(("x-admin-passkey" = String, Header, description = "Base64-encoded admin passkey")),
    responses(
        (status = 200, description = "All appointments, newest first, with counts", body = AppointmentSummary),
        (status = 401, description = "Missing or wrong passkey", body = ErrorRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn admin_appointments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AppointmentSummary>> {
    require_admin(&state, &headers)?;
    Ok(Json(state.appointments.recent_appointments().await?))
}

#[utoipa::path(
    put,
    path = "/admin/appointments/{id}",
    params(
        ("id" = String, Path, description = "Appointment document id"),
        ("x-admin-passkey" = String, Header, description = "Base64-encoded admin passkey")
    ),
    request_body = UpdateAppointmentReq,
    responses(
        (status = 200, description = "Updated appointment", body = Appointment),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 401, description = "Missing or wrong passkey", body = ErrorRes),
        (status = 404, description = "No such appointment", body = ErrorRes)
    )
)]
/// Schedule or cancel an appointment.
///
/// An unrecognised `type` is validated and applied as `schedule`.
#[axum::debug_handler]
async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateAppointmentReq>,
) -> ApiResult<Json<Appointment>> {
    require_admin(&state, &headers)?;
    let appointment = state
        .appointments
        .update_appointment(&id, &req.kind, &req.form)
        .await?;
    Ok(Json(appointment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_shared::auth::encrypt_key;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use synapse_core::MemoryStore;
    use tower::ServiceExt;

    const PASSKEY: &str = "123456";

    fn app() -> Router {
        let cfg = CoreConfig::default().with_admin_passkey(Some(PASSKEY.into()));
        router(AppState::new(Arc::new(cfg), Arc::new(MemoryStore::new())))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        passkey: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(key) = passkey {
            req = req.header(ADMIN_PASSKEY_HEADER, encrypt_key(key));
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn intake() -> Value {
        json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "+1234567890",
            "birthDate": "1990-05-15",
            "gender": "Female",
            "address": "123 Main Street, City",
            "occupation": "Software Engineer",
            "emergencyContactName": "John Doe",
            "emergencyContactNumber": "+1987654321",
            "primaryPhysician": "Nina Gupta",
            "insuranceProvider": "BlueCross",
            "insurancePolicyNumber": "POL-123456",
            "treatmentConsent": true,
            "disclosureConsent": true,
            "privacyConsent": true
        })
    }

    /// Sign up, register and book one appointment. Returns (user id, appointment id).
    async fn booked(app: &Router) -> (String, String) {
        let (status, user) = send(
            app,
            "POST",
            "/users",
            Some(json!({"name": "Jane Doe", "email": "jane@example.com", "phone": "+1234567890"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = user["$id"].as_str().unwrap().to_string();

        let (status, patient) = send(
            app,
            "POST",
            &format!("/users/{user_id}/patient"),
            Some(intake()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, appointment) = send(
            app,
            "POST",
            &format!("/users/{user_id}/appointments"),
            Some(json!({
                "patientId": patient["$id"],
                "primaryPhysician": "Nina Gupta",
                "schedule": "2026-03-15T10:00:00Z",
                "reason": "Regular checkup"
            })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(appointment["status"], "pending");

        (user_id, appointment["$id"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_health_and_doctors() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);

        let (_, doctors) = send(&app, "GET", "/doctors", None, None).await;
        assert_eq!(doctors.as_array().unwrap().len(), DOCTORS.len());
    }

    #[tokio::test]
    async fn test_signup_validation_errors() {
        let (status, body) = send(
            &app(),
            "POST",
            "/users",
            Some(json!({"name": "J", "email": "john@example.com", "phone": "1234567890"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["name", "phone"]);
    }

    #[tokio::test]
    async fn test_missing_records_are_404() {
        let app = app();
        let (status, _) = send(&app, "GET", "/users/nobody", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/appointments/missing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patient_registration_flow() {
        let app = app();
        let (user_id, _) = booked(&app).await;

        let (status, patient) =
            send(&app, "GET", &format!("/users/{user_id}/patient"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patient["userId"], user_id.as_str());

        let (status, _) = send(
            &app,
            "POST",
            &format!("/users/{user_id}/patient"),
            Some(intake()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, outcome) = send(
            &app,
            "POST",
            "/login",
            Some(json!({"email": "jane@example.com"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["status"], "registered");
    }

    #[tokio::test]
    async fn test_user_appointments_summary() {
        let app = app();
        let (user_id, appointment_id) = booked(&app).await;

        let (status, summary) = send(
            &app,
            "GET",
            &format!("/users/{user_id}/appointments"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["totalCount"], 1);
        assert_eq!(summary["pendingCount"], 1);
        assert_eq!(summary["documents"][0]["$id"], appointment_id.as_str());
        assert_eq!(summary["documents"][0]["patient"]["name"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_admin_routes_require_passkey() {
        let app = app();
        let (status, _) = send(&app, "GET", "/admin/appointments", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/admin/appointments", None, Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, summary) =
            send(&app, "GET", "/admin/appointments", None, Some(PASSKEY)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["totalCount"], 0);
    }

    #[tokio::test]
    async fn test_admin_schedules_and_cancels() {
        let app = app();
        let (_, appointment_id) = booked(&app).await;
        let uri = format!("/admin/appointments/{appointment_id}");

        let (status, scheduled) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({
                "type": "schedule",
                "primaryPhysician": "Rohan Mehta",
                "schedule": "2026-03-16T09:30:00Z"
            })),
            Some(PASSKEY),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(scheduled["status"], "scheduled");
        assert_eq!(scheduled["primaryPhysician"], "Rohan Mehta");

        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({
                "type": "cancel",
                "primaryPhysician": "Rohan Mehta",
                "schedule": "2026-03-16T09:30:00Z"
            })),
            Some(PASSKEY),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"][0]["field"], "cancellationReason");

        let (_, summary) = send(&app, "GET", "/admin/appointments", None, Some(PASSKEY)).await;
        assert_eq!(summary["scheduledCount"], 1);
        assert_eq!(summary["pendingCount"], 0);
    }
}
