//! The records backend seam.
//!
//! Pages and submissions talk to the backend only through [`RecordsBackend`], so the same page
//! logic runs against the HTTP client in production and an in-memory fake in tests.

use crate::error::ApiResult;
use async_trait::async_trait;
use clinic_core::forms::{AppointmentPayload, DiagnosisPayload, PatientPayload, PrescriptionPayload};
use clinic_core::{Appointment, Diagnosis, Doctor, Patient, Prescription, RecordId, Resource};

/// One method per backend endpoint the console uses.
///
/// Writes return the stored record, or `None` when the backend acknowledges without a body.
#[async_trait]
pub trait RecordsBackend: Send + Sync {
    async fn list_doctors(&self) -> ApiResult<Vec<Doctor>>;
    async fn get_doctor(&self, id: RecordId) -> ApiResult<Doctor>;

    async fn list_patients(&self) -> ApiResult<Vec<Patient>>;
    async fn get_patient(&self, id: RecordId) -> ApiResult<Patient>;
    async fn list_patient_appointments(&self, id: RecordId) -> ApiResult<Vec<Appointment>>;
    async fn update_patient(
        &self,
        id: RecordId,
        payload: &PatientPayload,
    ) -> ApiResult<Option<Patient>>;

    async fn list_appointments(&self) -> ApiResult<Vec<Appointment>>;
    async fn get_appointment(&self, id: RecordId) -> ApiResult<Appointment>;
    async fn create_appointment(
        &self,
        payload: &AppointmentPayload,
    ) -> ApiResult<Option<Appointment>>;
    async fn update_appointment(
        &self,
        id: RecordId,
        payload: &AppointmentPayload,
    ) -> ApiResult<Option<Appointment>>;

    async fn list_diagnoses(&self) -> ApiResult<Vec<Diagnosis>>;
    async fn get_diagnosis(&self, id: RecordId) -> ApiResult<Diagnosis>;
    async fn create_diagnosis(&self, payload: &DiagnosisPayload) -> ApiResult<Option<Diagnosis>>;
    async fn update_diagnosis(
        &self,
        id: RecordId,
        payload: &DiagnosisPayload,
    ) -> ApiResult<Option<Diagnosis>>;

    async fn get_prescription(&self, id: RecordId) -> ApiResult<Prescription>;
    async fn create_prescription(
        &self,
        payload: &PrescriptionPayload,
    ) -> ApiResult<Option<Prescription>>;
    async fn update_prescription(
        &self,
        id: RecordId,
        payload: &PrescriptionPayload,
    ) -> ApiResult<Option<Prescription>>;

    async fn delete(&self, resource: Resource, id: RecordId) -> ApiResult<()>;
}
