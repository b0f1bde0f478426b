//! Entity models as the backend returns them.
//!
//! The client never owns these records. Each page holds a read snapshot for as long as it is
//! mounted and drops it on navigation.

use crate::dates::{lenient_date, lenient_date_opt, lenient_datetime, lenient_datetime_opt};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric identity of a backend record.
///
/// Foreign keys are compared after numeric coercion, so ids are accepted as JSON numbers or
/// numeric strings and always serialised back as integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Error returned when text is not a record id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a record id: {0:?}")]
pub struct ParseRecordIdError(String);

impl FromStr for RecordId {
    type Err = ParseRecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseRecordIdError(s.to_owned()))
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(Self(v)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Records that carry their own identity.
pub trait Identified {
    fn id(&self) -> RecordId;
}

/// Records that hang off a parent record, and can be filtered by it.
pub trait BelongsTo {
    fn parent_id(&self) -> RecordId;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_date_opt")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub specialisation: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Doctor {
    pub fn display_name(&self) -> String {
        format!("Dr {} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_datetime")]
    pub appointment_date: DateTime<Utc>,
    pub doctor_id: RecordId,
    pub patient_id: RecordId,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: RecordId,
    pub condition: String,
    #[serde(deserialize_with = "lenient_date")]
    pub diagnosis_date: NaiveDate,
    pub patient_id: RecordId,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub diagnosis_id: RecordId,
    pub medication: String,
    pub dosage: String,
    #[serde(deserialize_with = "lenient_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "lenient_date")]
    pub end_date: NaiveDate,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> RecordId {
                self.id
            }
        })*
    };
}

impl_identified!(Patient, Doctor, Appointment, Diagnosis, Prescription);

impl BelongsTo for Diagnosis {
    fn parent_id(&self) -> RecordId {
        self.patient_id
    }
}

/// Backend resource collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Appointments,
    Diagnoses,
    Prescriptions,
    Patients,
    Doctors,
}

impl Resource {
    /// Path segment of the collection, e.g. `diagnoses`.
    pub const fn segment(self) -> &'static str {
        match self {
            Resource::Appointments => "appointments",
            Resource::Diagnoses => "diagnoses",
            Resource::Prescriptions => "prescriptions",
            Resource::Patients => "patients",
            Resource::Doctors => "doctors",
        }
    }

    /// Capitalised singular noun used in user-facing messages.
    pub const fn label(self) -> &'static str {
        match self {
            Resource::Appointments => "Appointment",
            Resource::Diagnoses => "Diagnosis",
            Resource::Prescriptions => "Prescription",
            Resource::Patients => "Patient",
            Resource::Doctors => "Doctor",
        }
    }

    pub fn collection_path(self) -> String {
        format!("/{}", self.segment())
    }

    pub fn record_path(self, id: RecordId) -> String {
        format!("/{}/{id}", self.segment())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.segment())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn patient(id: u64, first: &str, last: &str) -> Patient {
        Patient {
            id: RecordId::new(id),
            first_name: first.into(),
            last_name: last.into(),
            phone: "0871234567".into(),
            email: format!("{}@example.ie", first.to_lowercase()),
            address: "1 Main Street".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn doctor(id: u64, first: &str, last: &str) -> Doctor {
        Doctor {
            id: RecordId::new(id),
            first_name: first.into(),
            last_name: last.into(),
            specialisation: "General Practice".into(),
            phone: "0870000000".into(),
            email: "dr@example.ie".into(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn appointment(id: u64, doctor_id: u64, patient_id: u64, epoch: i64) -> Appointment {
        Appointment {
            id: RecordId::new(id),
            appointment_date: DateTime::from_timestamp(epoch, 0).expect("valid epoch"),
            doctor_id: RecordId::new(doctor_id),
            patient_id: RecordId::new(patient_id),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn diagnosis(id: u64, patient_id: u64, condition: &str) -> Diagnosis {
        Diagnosis {
            id: RecordId::new(id),
            condition: condition.into(),
            diagnosis_date: NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date"),
            patient_id: RecordId::new(patient_id),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn prescription(id: u64, patient_id: u64, doctor_id: u64, diagnosis_id: u64) -> Prescription {
        Prescription {
            id: RecordId::new(id),
            patient_id: RecordId::new(patient_id),
            doctor_id: RecordId::new(doctor_id),
            diagnosis_id: RecordId::new(diagnosis_id),
            medication: "Amoxicillin".into(),
            dosage: "500mg".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 8).expect("valid date"),
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_accepts_numbers_and_numeric_strings() {
        let a: RecordId = serde_json::from_str("3").expect("number");
        let b: RecordId = serde_json::from_str("\"3\"").expect("string");
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&b).expect("serialise"), "3");
        assert!(serde_json::from_str::<RecordId>("\"three\"").is_err());
    }

    #[test]
    fn test_appointment_decodes_epoch_and_camel_case_timestamps() {
        let json = r#"{
            "id": 1,
            "appointment_date": 1700000000,
            "doctor_id": 5,
            "patient_id": "9",
            "createdAt": "2023-11-01T10:00:00.000Z",
            "updatedAt": null
        }"#;
        let appt: Appointment = serde_json::from_str(json).expect("decode appointment");
        assert_eq!(appt.patient_id, RecordId::new(9));
        assert_eq!(appt.appointment_date.timestamp(), 1_700_000_000);
        assert!(appt.created_at.is_some());
        assert!(appt.updated_at.is_none());
    }

    #[test]
    fn test_patient_date_of_birth_accepts_either_encoding() {
        let iso: Patient = serde_json::from_str(
            r#"{"id":1,"first_name":"Aoife","last_name":"Byrne","date_of_birth":"1990-05-17"}"#,
        )
        .expect("iso dob");
        let epoch: Patient = serde_json::from_str(
            r#"{"id":1,"first_name":"Aoife","last_name":"Byrne","date_of_birth":642902400}"#,
        )
        .expect("epoch dob");
        assert_eq!(iso.date_of_birth, epoch.date_of_birth);
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let json = r#"{"id":10,"condition":"Flu","diagnosis_date":"2024-01-01","patient_id":3,"severity":"mild"}"#;
        let d: Diagnosis = serde_json::from_str(json).expect("decode with extra field");
        assert_eq!(d.parent_id(), RecordId::new(3));
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(Resource::Diagnoses.collection_path(), "/diagnoses");
        assert_eq!(
            Resource::Appointments.record_path(RecordId::new(7)),
            "/appointments/7"
        );
        assert_eq!(Resource::Prescriptions.label(), "Prescription");
    }

    #[test]
    fn test_display_names() {
        assert_eq!(fixtures::doctor(1, "Mary", "Quinn").display_name(), "Dr Mary Quinn");
        assert_eq!(fixtures::patient(2, "Sean", "Kelly").full_name(), "Sean Kelly");
    }
}
