use anyhow::Context;
use api_shared::auth::{decrypt_key, encrypt_key};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synapse_core::constants::{status_icon, DOCTORS};
use synapse_core::validation::{
    get_appointment_schema, AppointmentForm, PatientForm, PatientShape, UserForm, UserShape,
    ValidationErrors,
};
use synapse_core::{
    build_store, format_date_time, serialize, store_backend_from_env_values, AppointmentService,
    AppointmentSummary, CoreConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "synapse")]
#[command(about = "Synapse patient appointment system CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the doctors patients can book with
    Doctors,
    /// Print appointment counts and the appointment list, newest first
    Summary {
        /// Only this user's appointments
        #[arg(long)]
        user: Option<String>,
    },
    /// Validate a JSON form file
    Validate {
        /// Which form the file holds
        form: FormKind,
        /// Path to the JSON file
        file: PathBuf,
        /// Appointment action (create, schedule, cancel)
        #[arg(long, default_value = "create")]
        kind: String,
    },
    /// Encode an admin passkey
    EncryptKey { passkey: String },
    /// Decode an admin passkey
    DecryptKey { encoded: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormKind {
    User,
    Patient,
    Appointment,
}

/// Validate the form in `path`. The outer error is an I/O or JSON problem; the inner result is
/// the normalized form or its field errors.
fn validate_file(
    form: FormKind,
    path: &Path,
    kind: &str,
) -> anyhow::Result<Result<Value, ValidationErrors>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let outcome = match form {
        FormKind::User => {
            let form: UserForm = serde_json::from_str(&raw).context("not a user form")?;
            UserShape::validate(&form).map(|v| serialize(&v))
        }
        FormKind::Patient => {
            let form: PatientForm = serde_json::from_str(&raw).context("not a patient form")?;
            PatientShape::validate(&form).map(|v| serialize(&v))
        }
        FormKind::Appointment => {
            let form: AppointmentForm =
                serde_json::from_str(&raw).context("not an appointment form")?;
            get_appointment_schema(kind)
                .validate(&form)
                .map(|v| serialize(&v))
        }
    };
    Ok(outcome)
}

fn print_summary(summary: &AppointmentSummary) {
    println!(
        "Total: {}, Scheduled: {}, Pending: {}, Cancelled: {}",
        summary.total_count, summary.scheduled_count, summary.pending_count, summary.cancelled_count
    );
    if summary.documents.is_empty() {
        println!("No appointments found.");
        return;
    }
    for view in &summary.documents {
        let appointment = &view.appointment;
        let patient = view
            .patient
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("<unknown patient>");
        println!(
            "{} | {} | {} | Dr. {} | {}{}",
            appointment.id,
            patient,
            format_date_time(appointment.schedule).date_time,
            appointment.primary_physician,
            appointment.status,
            status_icon(&appointment.status)
                .map(|icon| format!(" ({icon})"))
                .unwrap_or_default()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("synapse=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Doctors) => {
            for doctor in DOCTORS.iter() {
                println!("{} ({})", doctor.name, doctor.image);
            }
        }
        Some(Commands::Summary { user }) => {
            let cfg = Arc::new(CoreConfig::from_values(
                env::var("DATABASE_ID").ok(),
                env::var("USERS_COLLECTION_ID").ok(),
                env::var("PATIENT_COLLECTION_ID").ok(),
                env::var("APPOINTMENT_COLLECTION_ID").ok(),
                None,
            )?);
            let backend = store_backend_from_env_values(
                env::var("APPWRITE_ENDPOINT").ok(),
                env::var("APPWRITE_PROJECT_ID").ok(),
                env::var("APPWRITE_API_KEY").ok(),
            )?;
            let store = build_store(&backend, &cfg)?;
            let service = AppointmentService::new(cfg, store);

            let summary = match user {
                Some(user_id) => service.patient_appointments(&user_id).await?,
                None => service.recent_appointments().await?,
            };
            print_summary(&summary);
        }
        Some(Commands::Validate { form, file, kind }) => match validate_file(form, &file, &kind)? {
            Ok(valid) => println!("{}", serde_json::to_string_pretty(&valid)?),
            Err(errors) => {
                for error in errors.errors() {
                    eprintln!("{}: {}", error.field, error.message);
                }
                anyhow::bail!("{} field(s) failed validation", errors.errors().len());
            }
        },
        Some(Commands::EncryptKey { passkey }) => {
            println!("{}", encrypt_key(&passkey));
        }
        Some(Commands::DecryptKey { encoded }) => {
            println!("{}", decrypt_key(&encoded)?);
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
