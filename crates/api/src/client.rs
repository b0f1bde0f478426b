//! HTTP implementation of [`RecordsBackend`].
//!
//! Every request carries `Authorization: Bearer <token>` when a token is configured. Responses
//! outside 2xx become [`ApiError::Status`]; bodies are decoded with `serde_path_to_error` so a
//! schema mismatch names the offending field. Nothing is retried.

use crate::backend::RecordsBackend;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use clinic_core::forms::{AppointmentPayload, DiagnosisPayload, PatientPayload, PrescriptionPayload};
use clinic_core::{
    Appointment, ClientConfig, Diagnosis, Doctor, Patient, Prescription, RecordId, Resource,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Build a client from startup configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Client)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.config.url(path));
        match self.config.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> ApiResult<Vec<u8>> {
        tracing::debug!(path, "sending request");
        let response = request.send().await.map_err(|source| ApiError::Transport {
            path: path.to_owned(),
            source,
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            path: path.to_owned(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_owned(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let body = self.send(path, self.request(Method::GET, path)).await?;
        decode(path, &body)
    }

    /// Send `payload` as JSON. An empty success body (`204 No Content`) yields `None`.
    async fn write<B, T>(&self, method: Method, path: &str, payload: &B) -> ApiResult<Option<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let json = serde_json::to_vec(payload).map_err(|source| ApiError::Encode {
            path: path.to_owned(),
            source,
        })?;
        let request = self
            .request(method, path)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json);
        let body = self.send(path, request).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        decode(path, &body).map(Some)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> ApiResult<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let field = err.path().to_string();
        let field = if field.is_empty() || field == "." {
            "<root>".to_owned()
        } else {
            field
        };
        ApiError::Decode {
            path: path.to_owned(),
            field,
            message: err.into_inner().to_string(),
        }
    })
}

#[async_trait]
impl RecordsBackend for ApiClient {
    async fn list_doctors(&self) -> ApiResult<Vec<Doctor>> {
        self.get(&Resource::Doctors.collection_path()).await
    }

    async fn get_doctor(&self, id: RecordId) -> ApiResult<Doctor> {
        self.get(&Resource::Doctors.record_path(id)).await
    }

    async fn list_patients(&self) -> ApiResult<Vec<Patient>> {
        self.get(&Resource::Patients.collection_path()).await
    }

    async fn get_patient(&self, id: RecordId) -> ApiResult<Patient> {
        self.get(&Resource::Patients.record_path(id)).await
    }

    async fn list_patient_appointments(&self, id: RecordId) -> ApiResult<Vec<Appointment>> {
        let path = format!("{}/appointments", Resource::Patients.record_path(id));
        self.get(&path).await
    }

    async fn update_patient(
        &self,
        id: RecordId,
        payload: &PatientPayload,
    ) -> ApiResult<Option<Patient>> {
        self.write(Method::PATCH, &Resource::Patients.record_path(id), payload)
            .await
    }

    async fn list_appointments(&self) -> ApiResult<Vec<Appointment>> {
        self.get(&Resource::Appointments.collection_path()).await
    }

    async fn get_appointment(&self, id: RecordId) -> ApiResult<Appointment> {
        self.get(&Resource::Appointments.record_path(id)).await
    }

    async fn create_appointment(
        &self,
        payload: &AppointmentPayload,
    ) -> ApiResult<Option<Appointment>> {
        self.write(Method::POST, &Resource::Appointments.collection_path(), payload)
            .await
    }

    async fn update_appointment(
        &self,
        id: RecordId,
        payload: &AppointmentPayload,
    ) -> ApiResult<Option<Appointment>> {
        self.write(Method::PATCH, &Resource::Appointments.record_path(id), payload)
            .await
    }

    async fn list_diagnoses(&self) -> ApiResult<Vec<Diagnosis>> {
        self.get(&Resource::Diagnoses.collection_path()).await
    }

    async fn get_diagnosis(&self, id: RecordId) -> ApiResult<Diagnosis> {
        self.get(&Resource::Diagnoses.record_path(id)).await
    }

    async fn create_diagnosis(&self, payload: &DiagnosisPayload) -> ApiResult<Option<Diagnosis>> {
        self.write(Method::POST, &Resource::Diagnoses.collection_path(), payload)
            .await
    }

    async fn update_diagnosis(
        &self,
        id: RecordId,
        payload: &DiagnosisPayload,
    ) -> ApiResult<Option<Diagnosis>> {
        self.write(Method::PATCH, &Resource::Diagnoses.record_path(id), payload)
            .await
    }

    async fn get_prescription(&self, id: RecordId) -> ApiResult<Prescription> {
        self.get(&Resource::Prescriptions.record_path(id)).await
    }

    async fn create_prescription(
        &self,
        payload: &PrescriptionPayload,
    ) -> ApiResult<Option<Prescription>> {
        self.write(Method::POST, &Resource::Prescriptions.collection_path(), payload)
            .await
    }

    async fn update_prescription(
        &self,
        id: RecordId,
        payload: &PrescriptionPayload,
    ) -> ApiResult<Option<Prescription>> {
        self.write(Method::PATCH, &Resource::Prescriptions.record_path(id), payload)
            .await
    }

    async fn delete(&self, resource: Resource, id: RecordId) -> ApiResult<()> {
        let path = resource.record_path(id);
        self.send(&path, self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}
