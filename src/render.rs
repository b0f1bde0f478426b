//! Terminal output: tables, machine formats and notices.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use clinic_core::views::{
    AppointmentDetail, AppointmentRow, DiagnosisDetail, DiagnosisRow, DoctorRow,
    PatientAppointments, PrescriptionDetail, SelectOption, format_date, format_datetime,
};
use clinic_core::{DiagnosisOption, FieldErrors, Loadable, Notice, NoticeKind};
use colored::Colorize;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Print `value` in a machine format, or hand it to `table` for human output.
pub fn emit<T: Serialize>(format: Format, value: &T, table: impl FnOnce(&T)) -> anyhow::Result<()> {
    match format {
        Format::Table => table(value),
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

pub fn notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Success => println!("{}", notice.message.green()),
        NoticeKind::Error => eprintln!("{}", notice.message.red()),
    }
}

pub fn field_errors(errors: &FieldErrors) {
    for (field, messages) in errors.iter() {
        for message in messages {
            eprintln!("{} {}", format!("{field}:").bold(), message.red());
        }
    }
}

fn loaded<T>(value: &Loadable<T>, show: impl FnOnce(&T)) {
    match value {
        Loadable::Loaded(v) => show(v),
        Loadable::Loading => println!("{}", "Loading content".dimmed()),
    }
}

fn stamp(at: Option<DateTime<Utc>>) -> String {
    at.map(format_datetime).unwrap_or_default()
}

pub fn appointment_rows(rows: &Loadable<Vec<AppointmentRow>>) {
    loaded(rows, |rows| {
        println!("{:<6} {:<18} {:<28} {}", "ID", "Appointment Date", "Doctor Name", "Patient Name");
        for row in rows {
            println!(
                "{:<6} {:<18} {:<28} {}",
                row.id,
                format_datetime(row.appointment_date),
                row.doctor,
                row.patient
            );
        }
    });
}

pub fn diagnosis_rows(rows: &Loadable<Vec<DiagnosisRow>>) {
    loaded(rows, |rows| {
        println!("{:<6} {:<28} {:<24} {}", "ID", "Name", "Condition", "Diagnosis Date");
        for row in rows {
            println!(
                "{:<6} {:<28} {:<24} {}",
                row.id,
                row.patient,
                row.condition,
                format_date(row.diagnosis_date)
            );
        }
    });
}

pub fn doctor_rows(rows: &Loadable<Vec<DoctorRow>>) {
    loaded(rows, |rows| {
        println!("{:<6} {:<28} {:<24} {}", "ID", "Name", "Specialisation", "Email");
        for row in rows {
            println!("{:<6} {:<28} {:<24} {}", row.id, row.name, row.specialisation, row.email);
        }
    });
}

pub fn appointment_detail(detail: &Loadable<AppointmentDetail>) {
    loaded(detail, |d| {
        println!("{}", d.doctor.to_string().bold());
        println!("Patient: {}", d.patient);
        println!("Date: {}", format_datetime(d.appointment_date));
        println!("Created At: {}", stamp(d.created_at).dimmed());
        println!("Updated At: {}", stamp(d.updated_at).dimmed());
    });
}

pub fn diagnosis_detail(detail: &Loadable<DiagnosisDetail>) {
    loaded(detail, |d| {
        println!("{}", d.patient.to_string().bold());
        println!("Condition: {}", d.condition);
        println!("Diagnosis Date: {}", format_date(d.diagnosis_date));
        println!("Created At: {}", stamp(d.created_at).dimmed());
        println!("Updated At: {}", stamp(d.updated_at).dimmed());
    });
}

pub fn prescription_detail(detail: &Loadable<PrescriptionDetail>) {
    loaded(detail, |d| {
        println!("{}", d.patient.to_string().bold());
        println!("Prescribing Doctor: {}", d.doctor);
        println!("Condition: {}", d.condition);
        println!("Medication: {}", d.medication);
        println!("Dosage: {}", d.dosage);
        println!("Start Date: {}", format_date(d.start_date));
        println!("End Date: {}", format_date(d.end_date));
        println!("Created At: {}", stamp(d.created_at).dimmed());
        println!("Updated At: {}", stamp(d.updated_at).dimmed());
    });
}

pub fn patient_appointments(view: &PatientAppointments) {
    println!("{}", view.patient.to_string().bold());
    loaded(&view.appointments, |rows| {
        if rows.is_empty() {
            println!("No appointments.");
        }
        for row in rows {
            println!("Appointment ID: {}", row.id);
            println!("  Date: {}", format_datetime(row.appointment_date));
            println!("  {}", row.doctor);
            println!("  Created At: {}", stamp(row.created_at).dimmed());
        }
    });
}

pub fn select_options(label: &str, options: &Loadable<Vec<SelectOption>>) {
    println!("{}", label.bold());
    loaded(options, |options| {
        for option in options {
            println!("  {:<6} {}", option.id, option.label);
        }
    });
}

pub fn condition_options(options: &[DiagnosisOption]) {
    println!("{}", "Condition".bold());
    if options.is_empty() {
        println!("  {}", "Select a patient with recorded diagnoses".dimmed());
    }
    for option in options {
        println!("  {:<6} {}", option.id, option.condition);
    }
}
