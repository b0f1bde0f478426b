//! # Clinic Core
//!
//! Client-side logic of the clinic admin console, with no I/O:
//! - entity models and the wire date boundary
//! - in-memory foreign-key joins across independently fetched collections
//! - the patient → diagnosis cascade on the prescription form
//! - form validation and coercion into request payloads
//! - display views and one-shot notices
//!
//! **No transport concerns**: HTTP, page task management and submission live in `clinic-api`.

pub mod cascade;
pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod forms;
pub mod join;
pub mod models;
pub mod notice;
pub mod validation;
pub mod views;

pub use cascade::{Cascade, DiagnosisCascade, DiagnosisOption};
pub use config::ClientConfig;
pub use error::{ClinicError, ClinicResult, FormError, FormResult};
pub use forms::{validate, FieldErrors, FormInput};
pub use join::{Loadable, Resolved};
pub use models::{
    Appointment, BelongsTo, Diagnosis, Doctor, Identified, Patient, Prescription, RecordId,
    Resource,
};
pub use notice::{Flash, Notice, NoticeKind, Redirect, Route};
