//! Clinic admin console.
//!
//! A terminal front end for the clinic records backend: list and inspect appointments,
//! diagnoses, prescriptions, patients and doctors, and submit the same create/edit forms the
//! admin screens offer.

mod render;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use clinic_api::pages::{
    AppointmentFormPage, AppointmentShow, AppointmentsIndex, DiagnosesIndex, DiagnosisFormPage,
    DiagnosisShow, DoctorsIndex, PatientAppointmentsPage, PatientEditPage, PrescriptionFormPage,
    PrescriptionShow,
};
use clinic_api::submit::{
    delete_record, submit_appointment, submit_diagnosis, submit_patient, submit_prescription,
};
use clinic_api::{ApiClient, Backend, FormMode, Page, SubmitError, SubmitResult};
use clinic_core::config::{base_url_from_env_value, timeout_from_env_value};
use clinic_core::constants::{API_TOKEN_ENV, API_URL_ENV, HTTP_TIMEOUT_ENV};
use clinic_core::forms::{AppointmentForm, DiagnosisForm, PatientForm, PrescriptionForm};
use clinic_core::{ClientConfig, Flash, Loadable, RecordId, Redirect, Resource};
use render::Format;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "clinic-admin")]
#[command(about = "Clinic records admin console")]
struct Cli {
    /// Backend base URL (overrides CLINIC_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Bearer token (overrides CLINIC_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Appointments
    #[command(subcommand)]
    Appointments(AppointmentCommand),
    /// Diagnoses
    #[command(subcommand)]
    Diagnoses(DiagnosisCommand),
    /// Prescriptions
    #[command(subcommand)]
    Prescriptions(PrescriptionCommand),
    /// Patients
    #[command(subcommand)]
    Patients(PatientCommand),
    /// Doctors
    #[command(subcommand)]
    Doctors(DoctorCommand),
}

#[derive(Subcommand)]
enum AppointmentCommand {
    /// List appointments, earliest first
    List,
    /// Show one appointment
    Show { id: RecordId },
    /// Book an appointment
    Create(AppointmentFields),
    /// Edit an appointment; omitted fields keep their current value
    Edit {
        id: RecordId,
        #[command(flatten)]
        fields: AppointmentFields,
    },
    /// Delete an appointment
    Delete { id: RecordId },
    /// Show the doctor and patient choices
    Options,
}

#[derive(Args, Default)]
struct AppointmentFields {
    #[arg(long)]
    doctor: Option<String>,
    #[arg(long)]
    patient: Option<String>,
    /// YYYY-MM-DD, or an RFC 3339 date-time to keep a time of day
    #[arg(long)]
    date: Option<String>,
}

#[derive(Subcommand)]
enum DiagnosisCommand {
    /// List diagnoses
    List,
    /// Show one diagnosis
    Show { id: RecordId },
    /// Record a diagnosis
    Create(DiagnosisFields),
    /// Edit a diagnosis; omitted fields keep their current value
    Edit {
        id: RecordId,
        #[command(flatten)]
        fields: DiagnosisFields,
    },
    /// Delete a diagnosis
    Delete { id: RecordId },
}

#[derive(Args, Default)]
struct DiagnosisFields {
    #[arg(long)]
    condition: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    patient: Option<String>,
}

#[derive(Subcommand)]
enum PrescriptionCommand {
    /// Show one prescription
    Show { id: RecordId },
    /// Write a prescription
    Create(PrescriptionFields),
    /// Edit a prescription; omitted fields keep their current value
    Edit {
        id: RecordId,
        #[command(flatten)]
        fields: PrescriptionFields,
    },
    /// Delete a prescription
    Delete { id: RecordId },
    /// Show the conditions selectable for a patient
    Options {
        #[arg(long)]
        patient: String,
        /// Prescription being edited, whose condition stays selectable
        #[arg(long)]
        editing: Option<RecordId>,
    },
}

#[derive(Args, Default)]
struct PrescriptionFields {
    #[arg(long)]
    patient: Option<String>,
    #[arg(long)]
    doctor: Option<String>,
    /// Diagnosis id of the condition being treated
    #[arg(long)]
    condition: Option<String>,
    #[arg(long)]
    medication: Option<String>,
    #[arg(long)]
    dosage: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    start: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    end: Option<String>,
}

#[derive(Subcommand)]
enum PatientCommand {
    /// List a patient's appointments
    Appointments { id: RecordId },
    /// Edit a patient's details; omitted fields keep their current value
    Edit {
        id: RecordId,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date_of_birth: Option<String>,
    },
}

#[derive(Subcommand)]
enum DoctorCommand {
    /// List doctors
    List,
}

fn overlay(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Wait for a page's fetches and print any notices they raised.
async fn settle(page: &mut impl Page) {
    let scope = page.scope();
    scope.settle().await;
    for notice in scope.take_notices() {
        render::notice(&notice);
    }
}

/// Print the outcome of a submission and turn failures into an error exit.
fn finish(result: SubmitResult<Redirect>, format: Format) -> anyhow::Result<()> {
    match result {
        Ok(redirect) => render::emit(format, &redirect, |redirect| {
            let mut flash = Flash::new();
            let route = redirect.clone().deliver(&mut flash);
            println!("-> {route}");
            if let Some(notice) = flash.take() {
                render::notice(&notice);
            }
        }),
        Err(SubmitError::Invalid(err)) => {
            render::field_errors(err.field_errors());
            anyhow::bail!("form was not submitted")
        }
        Err(SubmitError::Request { notice, source }) => {
            render::notice(&notice);
            Err(source.into())
        }
    }
}

/// The record an edit screen starts from. Editing cannot proceed until it has loaded.
fn prefilled<T>(form: Loadable<T>, resource: Resource, id: RecordId) -> anyhow::Result<T> {
    match form {
        Loadable::Loaded(form) => Ok(form),
        Loadable::Loading => anyhow::bail!("could not load {} {id}", resource.label().to_lowercase()),
    }
}

async fn appointments(backend: &Backend, format: Format, command: AppointmentCommand) -> anyhow::Result<()> {
    match command {
        AppointmentCommand::List => {
            let mut page = AppointmentsIndex::mount(backend);
            settle(&mut page).await;
            render::emit(format, &page.rows(), render::appointment_rows)
        }
        AppointmentCommand::Show { id } => {
            let mut page = AppointmentShow::mount(backend, id);
            settle(&mut page).await;
            render::emit(format, &page.detail(), render::appointment_detail)
        }
        AppointmentCommand::Options => {
            let mut page = AppointmentFormPage::mount(backend, FormMode::Create);
            settle(&mut page).await;
            render::select_options("Doctor", &page.doctor_options());
            render::select_options("Patient", &page.patient_options());
            Ok(())
        }
        AppointmentCommand::Create(fields) => {
            let mut form = AppointmentForm::default();
            apply_appointment(&mut form, fields);
            finish(submit_appointment(backend.as_ref(), FormMode::Create, &form).await, format)
        }
        AppointmentCommand::Edit { id, fields } => {
            let mut page = AppointmentFormPage::mount(backend, FormMode::Edit(id));
            settle(&mut page).await;
            let mut form = prefilled(page.prefill(), Resource::Appointments, id)?;
            apply_appointment(&mut form, fields);
            finish(submit_appointment(backend.as_ref(), FormMode::Edit(id), &form).await, format)
        }
        AppointmentCommand::Delete { id } => {
            finish(delete_record(backend.as_ref(), Resource::Appointments, id).await, format)
        }
    }
}

fn apply_appointment(form: &mut AppointmentForm, fields: AppointmentFields) {
    overlay(&mut form.doctor_id, fields.doctor);
    overlay(&mut form.patient_id, fields.patient);
    overlay(&mut form.appointment_date, fields.date);
}

async fn diagnoses(backend: &Backend, format: Format, command: DiagnosisCommand) -> anyhow::Result<()> {
    match command {
        DiagnosisCommand::List => {
            let mut page = DiagnosesIndex::mount(backend);
            settle(&mut page).await;
            render::emit(format, &page.rows(), render::diagnosis_rows)
        }
        DiagnosisCommand::Show { id } => {
            let mut page = DiagnosisShow::mount(backend, id);
            settle(&mut page).await;
            render::emit(format, &page.detail(), render::diagnosis_detail)
        }
        DiagnosisCommand::Create(fields) => {
            let mut form = DiagnosisForm::default();
            apply_diagnosis(&mut form, fields);
            finish(submit_diagnosis(backend.as_ref(), FormMode::Create, &form).await, format)
        }
        DiagnosisCommand::Edit { id, fields } => {
            let mut page = DiagnosisFormPage::mount(backend, FormMode::Edit(id));
            settle(&mut page).await;
            let mut form = prefilled(page.prefill(), Resource::Diagnoses, id)?;
            apply_diagnosis(&mut form, fields);
            finish(submit_diagnosis(backend.as_ref(), FormMode::Edit(id), &form).await, format)
        }
        DiagnosisCommand::Delete { id } => {
            finish(delete_record(backend.as_ref(), Resource::Diagnoses, id).await, format)
        }
    }
}

fn apply_diagnosis(form: &mut DiagnosisForm, fields: DiagnosisFields) {
    overlay(&mut form.condition, fields.condition);
    overlay(&mut form.diagnosis_date, fields.date);
    overlay(&mut form.patient_id, fields.patient);
}

async fn prescriptions(backend: &Backend, format: Format, command: PrescriptionCommand) -> anyhow::Result<()> {
    match command {
        PrescriptionCommand::Show { id } => {
            let mut page = PrescriptionShow::mount(backend, id);
            settle(&mut page).await;
            render::emit(format, &page.detail(), render::prescription_detail)
        }
        PrescriptionCommand::Options { patient, editing } => {
            let mode = editing.map_or(FormMode::Create, FormMode::Edit);
            let mut page = PrescriptionFormPage::mount(backend, mode);
            settle(&mut page).await;
            let options = page.condition_options(&patient);
            render::emit(format, &options, |o| render::condition_options(o))
        }
        PrescriptionCommand::Create(fields) => {
            let mut page = PrescriptionFormPage::mount(backend, FormMode::Create);
            settle(&mut page).await;
            let mut form = PrescriptionForm::default();
            apply_prescription(&mut form, fields);
            let cascade = page.cascade(&form.patient_id);
            let result = submit_prescription(backend.as_ref(), FormMode::Create, &form, &cascade).await;
            finish(result, format)
        }
        PrescriptionCommand::Edit { id, fields } => {
            let mut page = PrescriptionFormPage::mount(backend, FormMode::Edit(id));
            settle(&mut page).await;
            let mut form = prefilled(page.prefill(), Resource::Prescriptions, id)?;
            apply_prescription(&mut form, fields);
            let cascade = page.cascade(&form.patient_id);
            let result = submit_prescription(backend.as_ref(), FormMode::Edit(id), &form, &cascade).await;
            finish(result, format)
        }
        PrescriptionCommand::Delete { id } => {
            finish(delete_record(backend.as_ref(), Resource::Prescriptions, id).await, format)
        }
    }
}

fn apply_prescription(form: &mut PrescriptionForm, fields: PrescriptionFields) {
    overlay(&mut form.patient_id, fields.patient);
    overlay(&mut form.doctor_id, fields.doctor);
    overlay(&mut form.diagnosis_id, fields.condition);
    overlay(&mut form.medication, fields.medication);
    overlay(&mut form.dosage, fields.dosage);
    overlay(&mut form.start_date, fields.start);
    overlay(&mut form.end_date, fields.end);
}

async fn patients(backend: &Backend, format: Format, command: PatientCommand) -> anyhow::Result<()> {
    match command {
        PatientCommand::Appointments { id } => {
            let mut page = PatientAppointmentsPage::mount(backend, id);
            settle(&mut page).await;
            render::emit(format, &page.view(), render::patient_appointments)
        }
        PatientCommand::Edit {
            id,
            first_name,
            last_name,
            phone,
            email,
            address,
            date_of_birth,
        } => {
            let mut page = PatientEditPage::mount(backend, id);
            settle(&mut page).await;
            let mut form: PatientForm = prefilled(page.prefill(), Resource::Patients, id)?;
            overlay(&mut form.first_name, first_name);
            overlay(&mut form.last_name, last_name);
            overlay(&mut form.phone, phone);
            overlay(&mut form.email, email);
            overlay(&mut form.address, address);
            overlay(&mut form.date_of_birth, date_of_birth);
            finish(submit_patient(backend.as_ref(), id, &form).await, format)
        }
    }
}

async fn doctors(backend: &Backend, format: Format, command: DoctorCommand) -> anyhow::Result<()> {
    match command {
        DoctorCommand::List => {
            let mut page = DoctorsIndex::mount(backend);
            settle(&mut page).await;
            render::emit(format, &page.rows(), render::doctor_rows)
        }
    }
}

/// Workspace crates whose events are shown at `info` when `RUST_LOG` does not say otherwise.
const LOG_TARGETS: [&str; 3] = ["clinic_admin", "clinic_api", "clinic_core"];

fn log_filter() -> anyhow::Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{target}=info").parse()?);
    }
    Ok(filter)
}

/// Resolve client configuration once: command-line flags first, then the environment.
fn client_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let base_url = base_url_from_env_value(
        cli.api_url
            .clone()
            .or_else(|| std::env::var(API_URL_ENV).ok()),
    )?;
    let token = cli.token.clone().or_else(|| std::env::var(API_TOKEN_ENV).ok());
    let timeout = timeout_from_env_value(std::env::var(HTTP_TIMEOUT_ENV).ok())?;

    Ok(ClientConfig::new(&base_url)?
        .with_token(token.as_deref())
        .with_timeout(timeout))
}

/// Main entry point for the clinic admin console
///
/// # Environment Variables
/// - `CLINIC_API_URL`: backend base URL (default: "http://localhost:3000")
/// - `CLINIC_API_TOKEN`: bearer token sent with every request
/// - `CLINIC_HTTP_TIMEOUT_SECS`: per-request timeout; unset means none
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid, or
/// - a submission is rejected by validation or by the backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = client_config(&cli).context("invalid client configuration")?;
    tracing::debug!(?config, "resolved configuration");

    let backend: Backend = Arc::new(ApiClient::new(config)?);
    let format = cli.format;

    let outcome = match cli.command {
        Commands::Appointments(command) => appointments(&backend, format, command).await,
        Commands::Diagnoses(command) => diagnoses(&backend, format, command).await,
        Commands::Prescriptions(command) => prescriptions(&backend, format, command).await,
        Commands::Patients(command) => patients(&backend, format, command).await,
        Commands::Doctors(command) => doctors(&backend, format, command).await,
    };

    if let Err(err) = &outcome {
        tracing::debug!(error = %err, "command failed");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_environment_defaults() {
        let cli = Cli::parse_from([
            "clinic-admin",
            "--api-url",
            "http://records.internal:8080/",
            "--token",
            "abc",
            "doctors",
            "list",
        ]);
        let config = client_config(&cli).expect("config");
        assert_eq!(config.base_url(), "http://records.internal:8080");
        assert_eq!(config.token(), Some("abc"));
    }

    #[test]
    fn test_library_warnings_pass_the_default_filter() {
        let subscriber = tracing_subscriber::registry().with(log_filter().expect("filter"));
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "clinic_api::page", tracing::Level::WARN));
            assert!(tracing::enabled!(target: "clinic_api::submit", tracing::Level::INFO));
            assert!(tracing::enabled!(target: "clinic_admin", tracing::Level::INFO));
        });
    }

    #[test]
    fn test_edit_overlays_only_given_fields() {
        let mut form = AppointmentForm {
            doctor_id: "5".into(),
            patient_id: "9".into(),
            appointment_date: "2023-11-14".into(),
        };
        apply_appointment(
            &mut form,
            AppointmentFields {
                date: Some("2024-01-02".into()),
                ..AppointmentFields::default()
            },
        );
        assert_eq!(form.doctor_id, "5");
        assert_eq!(form.appointment_date, "2024-01-02");
    }
}
