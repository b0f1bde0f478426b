//! Form submission: validate, coerce, write, redirect.
//!
//! Nothing is sent unless the form validates. A successful write redirects to the resource's
//! index with a one-shot success notice. A failed write is logged and returned with an error
//! notice so the user stays on the form and sees why.

use crate::backend::RecordsBackend;
use crate::error::{ApiError, SubmitError, SubmitResult};
use crate::pages::FormMode;
use clinic_core::forms::{AppointmentForm, DiagnosisForm, PatientForm, PrescriptionForm};
use clinic_core::views::format_datetime;
use clinic_core::{validate, DiagnosisCascade, Notice, RecordId, Redirect, Resource};

fn request_failed(resource: Resource, action: &str, source: ApiError) -> SubmitError {
    tracing::warn!(%resource, action, error = %source, "write failed");
    let notice = Notice::error(format!(
        "Failed to {action} {}: {source}",
        resource.label().to_lowercase()
    ));
    SubmitError::Request { notice, source }
}

pub async fn submit_appointment(
    backend: &dyn RecordsBackend,
    mode: FormMode,
    form: &AppointmentForm,
) -> SubmitResult<Redirect> {
    let payload = validate(form)?;
    let message = match mode {
        FormMode::Create => {
            let created = backend
                .create_appointment(&payload)
                .await
                .map_err(|e| request_failed(Resource::Appointments, "create", e))?;
            let booked = created.map_or(payload.appointment_date, |a| a.appointment_date);
            format!(
                "Appointment \"{}\" created successfully",
                format_datetime(booked)
            )
        }
        FormMode::Edit(id) => {
            backend
                .update_appointment(id, &payload)
                .await
                .map_err(|e| request_failed(Resource::Appointments, "update", e))?;
            "Appointment updated successfully".to_owned()
        }
    };
    Ok(Redirect::to_index(Resource::Appointments, Notice::success(message)))
}

pub async fn submit_diagnosis(
    backend: &dyn RecordsBackend,
    mode: FormMode,
    form: &DiagnosisForm,
) -> SubmitResult<Redirect> {
    let payload = validate(form)?;
    let message = match mode {
        FormMode::Create => {
            let created = backend
                .create_diagnosis(&payload)
                .await
                .map_err(|e| request_failed(Resource::Diagnoses, "create", e))?;
            let condition = created
                .map_or_else(|| payload.condition.as_str().to_owned(), |d| d.condition);
            format!("Diagnosis \"{condition}\" created successfully")
        }
        FormMode::Edit(id) => {
            backend
                .update_diagnosis(id, &payload)
                .await
                .map_err(|e| request_failed(Resource::Diagnoses, "update", e))?;
            "Diagnosis updated successfully".to_owned()
        }
    };
    Ok(Redirect::to_index(Resource::Diagnoses, Notice::success(message)))
}

/// Submit the prescription form. The chosen condition must be one `cascade` offers.
pub async fn submit_prescription(
    backend: &dyn RecordsBackend,
    mode: FormMode,
    form: &PrescriptionForm,
    cascade: &DiagnosisCascade,
) -> SubmitResult<Redirect> {
    let payload = form.validate_with(cascade)?;
    let message = match mode {
        FormMode::Create => {
            backend
                .create_prescription(&payload)
                .await
                .map_err(|e| request_failed(Resource::Prescriptions, "create", e))?;
            "Prescription created successfully"
        }
        FormMode::Edit(id) => {
            backend
                .update_prescription(id, &payload)
                .await
                .map_err(|e| request_failed(Resource::Prescriptions, "update", e))?;
            "Prescription updated successfully"
        }
    };
    Ok(Redirect::to_index(Resource::Prescriptions, Notice::success(message)))
}

pub async fn submit_patient(
    backend: &dyn RecordsBackend,
    id: RecordId,
    form: &PatientForm,
) -> SubmitResult<Redirect> {
    let payload = validate(form)?;
    backend
        .update_patient(id, &payload)
        .await
        .map_err(|e| request_failed(Resource::Patients, "update", e))?;
    Ok(Redirect::to_index(
        Resource::Patients,
        Notice::success("Patient updated successfully"),
    ))
}

/// Delete one record, as the index screens' delete button does.
pub async fn delete_record(
    backend: &dyn RecordsBackend,
    resource: Resource,
    id: RecordId,
) -> SubmitResult<Redirect> {
    backend
        .delete(resource, id)
        .await
        .map_err(|e| request_failed(resource, "delete", e))?;
    Ok(Redirect::to_index(
        resource,
        Notice::success(format!("{} deleted successfully", resource.label())),
    ))
}
