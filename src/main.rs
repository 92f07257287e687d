use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use synapse_core::{CoreConfig, build_store, store_backend_from_env_values};

/// Main entry point for the Synapse server
///
/// Loads `.env`, resolves configuration once, connects the document store and serves the REST
/// API with Swagger UI.
///
/// # Environment Variables
/// - `SYNAPSE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `DATABASE_ID`, `USERS_COLLECTION_ID`, `PATIENT_COLLECTION_ID`, `APPOINTMENT_COLLECTION_ID`:
///   document store identifiers
/// - `APPWRITE_ENDPOINT`, `APPWRITE_PROJECT_ID`, `APPWRITE_API_KEY`: remote store; when none
///   are set an in-memory store is used
/// - `ADMIN_PASSKEY`: passkey for the admin routes; unset disables them
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("synapse_run=info".parse()?)
                .add_directive("synapse_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_values(
        env::var("DATABASE_ID").ok(),
        env::var("USERS_COLLECTION_ID").ok(),
        env::var("PATIENT_COLLECTION_ID").ok(),
        env::var("APPOINTMENT_COLLECTION_ID").ok(),
        env::var("ADMIN_PASSKEY").ok(),
    )?);
    if cfg.admin_passkey().is_none() {
        tracing::warn!("ADMIN_PASSKEY not set; admin routes will reject every request");
    }

    let backend = store_backend_from_env_values(
        env::var("APPWRITE_ENDPOINT").ok(),
        env::var("APPWRITE_PROJECT_ID").ok(),
        env::var("APPWRITE_API_KEY").ok(),
    )?;
    let store = build_store(&backend, &cfg)?;

    let rest_addr = env::var("SYNAPSE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!("++ Starting Synapse REST on {}", rest_addr);

    let app = router(AppState::new(cfg, store));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
