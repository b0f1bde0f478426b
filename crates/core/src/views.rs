//! Display-ready composites built from a page's fetched slices.
//!
//! Views never dereference a reference that has not resolved: unresolved joins become
//! [`Cell::Loading`] and render as [`LOADING_PLACEHOLDER`].

use crate::constants::{DISPLAY_DATETIME_FORMAT, DISPLAY_DATE_FORMAT, LOADING_PLACEHOLDER};
use crate::join::{resolve, resolve_one, KeyedIndex, Loadable, Resolved};
use crate::models::{Appointment, Diagnosis, Doctor, Identified, Patient, Prescription, RecordId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// One joined field of a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Loading,
}

impl Cell {
    pub fn from_resolved<T>(resolved: Resolved<T>, render: impl FnOnce(T) -> String) -> Self {
        match resolved {
            Resolved::Found(v) => Cell::Text(render(v)),
            Resolved::Pending => Cell::Loading,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Cell::Loading)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Cell::Text(t) => Some(t),
            Cell::Loading => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.text().unwrap_or(LOADING_PLACEHOLDER))
    }
}

/// Serialises as the text, or `null` while loading.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.text().serialize(serializer)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn format_datetime(at: DateTime<Utc>) -> String {
    at.format(DISPLAY_DATETIME_FORMAT).to_string()
}

fn index_of<T: Identified>(side: &Loadable<Vec<T>>) -> Option<KeyedIndex<'_, T>> {
    side.loaded().map(|items| KeyedIndex::build(items))
}

fn indexed_cell<T>(
    index: Option<&KeyedIndex<'_, T>>,
    id: RecordId,
    render: impl FnOnce(&T) -> String,
) -> Cell
where
    T: Identified,
{
    let resolved: Resolved<&T> = index.and_then(|i| i.get(id)).into();
    Cell::from_resolved(resolved, render)
}

/// An entry of a select field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub id: RecordId,
    pub label: String,
}

pub fn doctor_options(doctors: &Loadable<Vec<Doctor>>) -> Loadable<Vec<SelectOption>> {
    doctors.as_ref().map(|doctors| {
        doctors
            .iter()
            .map(|d| SelectOption {
                id: d.id,
                label: d.display_name(),
            })
            .collect()
    })
}

pub fn patient_options(patients: &Loadable<Vec<Patient>>) -> Loadable<Vec<SelectOption>> {
    patients.as_ref().map(|patients| {
        patients
            .iter()
            .map(|p| SelectOption {
                id: p.id,
                label: p.full_name(),
            })
            .collect()
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppointmentRow {
    pub id: RecordId,
    pub appointment_date: DateTime<Utc>,
    pub doctor: Cell,
    pub patient: Cell,
}

/// Rows of the appointments index, earliest first.
///
/// Doctors and patients may arrive in any order relative to the appointments; rows whose
/// references have not resolved show placeholders.
pub fn appointment_rows(
    appointments: &Loadable<Vec<Appointment>>,
    doctors: &Loadable<Vec<Doctor>>,
    patients: &Loadable<Vec<Patient>>,
) -> Loadable<Vec<AppointmentRow>> {
    let doctors = index_of(doctors);
    let patients = index_of(patients);

    appointments.as_ref().map(|appointments| {
        let mut rows: Vec<AppointmentRow> = appointments
            .iter()
            .map(|a| AppointmentRow {
                id: a.id,
                appointment_date: a.appointment_date,
                doctor: indexed_cell(doctors.as_ref(), a.doctor_id, Doctor::display_name),
                patient: indexed_cell(patients.as_ref(), a.patient_id, Patient::full_name),
            })
            .collect();
        rows.sort_by_key(|r| r.appointment_date);
        rows
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiagnosisRow {
    pub id: RecordId,
    pub patient: Cell,
    pub condition: String,
    pub diagnosis_date: NaiveDate,
}

pub fn diagnosis_rows(
    diagnoses: &Loadable<Vec<Diagnosis>>,
    patients: &Loadable<Vec<Patient>>,
) -> Loadable<Vec<DiagnosisRow>> {
    let patients = index_of(patients);
    diagnoses.as_ref().map(|diagnoses| {
        diagnoses
            .iter()
            .map(|d| DiagnosisRow {
                id: d.id,
                patient: indexed_cell(patients.as_ref(), d.patient_id, Patient::full_name),
                condition: d.condition.clone(),
                diagnosis_date: d.diagnosis_date,
            })
            .collect()
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DoctorRow {
    pub id: RecordId,
    pub name: String,
    pub specialisation: String,
    pub phone: String,
    pub email: String,
}

pub fn doctor_rows(doctors: &Loadable<Vec<Doctor>>) -> Loadable<Vec<DoctorRow>> {
    doctors.as_ref().map(|doctors| {
        doctors
            .iter()
            .map(|d| DoctorRow {
                id: d.id,
                name: d.display_name(),
                specialisation: d.specialisation.clone(),
                phone: d.phone.clone(),
                email: d.email.clone(),
            })
            .collect()
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientAppointmentRow {
    pub id: RecordId,
    pub appointment_date: DateTime<Utc>,
    pub doctor: Cell,
    pub created_at: Option<DateTime<Utc>>,
}

/// A patient's own appointment list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientAppointments {
    pub patient: Cell,
    pub appointments: Loadable<Vec<PatientAppointmentRow>>,
}

pub fn patient_appointments(
    patient_id: RecordId,
    patient: &Loadable<Patient>,
    appointments: &Loadable<Vec<Appointment>>,
    doctors: &Loadable<Vec<Doctor>>,
) -> PatientAppointments {
    let rows = appointments.as_ref().map(|appointments| {
        let mut rows: Vec<PatientAppointmentRow> = appointments
            .iter()
            .map(|a| PatientAppointmentRow {
                id: a.id,
                appointment_date: a.appointment_date,
                doctor: Cell::from_resolved(resolve(doctors, a.doctor_id), Doctor::display_name),
                created_at: a.created_at,
            })
            .collect();
        rows.sort_by_key(|r| r.appointment_date);
        rows
    });

    PatientAppointments {
        patient: Cell::from_resolved(resolve_one(patient, patient_id), Patient::full_name),
        appointments: rows,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppointmentDetail {
    pub id: RecordId,
    pub appointment_date: DateTime<Utc>,
    pub doctor: Cell,
    pub patient: Cell,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The appointment card. The doctor and patient are fetched once the appointment is known.
pub fn appointment_detail(
    appointment: &Loadable<Appointment>,
    doctor: &Loadable<Doctor>,
    patient: &Loadable<Patient>,
) -> Loadable<AppointmentDetail> {
    appointment.as_ref().map(|a| AppointmentDetail {
        id: a.id,
        appointment_date: a.appointment_date,
        doctor: Cell::from_resolved(resolve_one(doctor, a.doctor_id), Doctor::display_name),
        patient: Cell::from_resolved(resolve_one(patient, a.patient_id), Patient::full_name),
        created_at: a.created_at,
        updated_at: a.updated_at,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiagnosisDetail {
    pub id: RecordId,
    pub patient: Cell,
    pub condition: String,
    pub diagnosis_date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn diagnosis_detail(
    diagnosis: &Loadable<Diagnosis>,
    patient: &Loadable<Patient>,
) -> Loadable<DiagnosisDetail> {
    diagnosis.as_ref().map(|d| DiagnosisDetail {
        id: d.id,
        patient: Cell::from_resolved(resolve_one(patient, d.patient_id), Patient::full_name),
        condition: d.condition.clone(),
        diagnosis_date: d.diagnosis_date,
        created_at: d.created_at,
        updated_at: d.updated_at,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrescriptionDetail {
    pub id: RecordId,
    pub patient: Cell,
    pub doctor: Cell,
    pub condition: Cell,
    pub medication: String,
    pub dosage: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn prescription_detail(
    prescription: &Loadable<Prescription>,
    patient: &Loadable<Patient>,
    doctor: &Loadable<Doctor>,
    diagnosis: &Loadable<Diagnosis>,
) -> Loadable<PrescriptionDetail> {
    prescription.as_ref().map(|p| PrescriptionDetail {
        id: p.id,
        patient: Cell::from_resolved(resolve_one(patient, p.patient_id), Patient::full_name),
        doctor: Cell::from_resolved(resolve_one(doctor, p.doctor_id), Doctor::display_name),
        condition: Cell::from_resolved(resolve_one(diagnosis, p.diagnosis_id), |d| {
            d.condition.clone()
        }),
        medication: p.medication.clone(),
        dosage: p.dosage.clone(),
        start_date: p.start_date,
        end_date: p.end_date,
        created_at: p.created_at,
        updated_at: p.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{appointment, diagnosis, doctor, patient, prescription};

    #[test]
    fn test_unloaded_doctors_render_placeholder() {
        let appointments = Loadable::Loaded(vec![appointment(1, 5, 9, 1_700_000_000)]);
        let rows = appointment_rows(&appointments, &Loadable::Loading, &Loadable::Loading);
        let rows = rows.loaded().expect("appointments loaded");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].doctor, Cell::Loading);
        assert_eq!(rows[0].doctor.to_string(), LOADING_PLACEHOLDER);
    }

    #[test]
    fn test_rows_resolve_and_sort_by_date() {
        let appointments = Loadable::Loaded(vec![
            appointment(1, 5, 9, 1_700_000_000),
            appointment(2, 4, 9, 1_600_000_000),
        ]);
        let doctors = Loadable::Loaded(vec![doctor(5, "Tom", "Ryan")]);
        let patients = Loadable::Loaded(vec![patient(9, "Niamh", "Walsh")]);

        let rows = appointment_rows(&appointments, &doctors, &patients);
        let rows = rows.loaded().expect("loaded");
        assert_eq!(rows.iter().map(|r| r.id.get()).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(rows[1].doctor.text(), Some("Dr Tom Ryan"));
        assert_eq!(rows[1].patient.text(), Some("Niamh Walsh"));
        assert!(rows[0].doctor.is_loading(), "doctor 4 is absent from the loaded list");
    }

    #[test]
    fn test_primary_still_loading_yields_no_rows() {
        let rows = diagnosis_rows(&Loadable::Loading, &Loadable::Loaded(vec![]));
        assert!(!rows.is_loaded());
    }

    #[test]
    fn test_cell_serialises_as_text_or_null() {
        let rows = diagnosis_rows(
            &Loadable::Loaded(vec![diagnosis(10, 3, "Flu"), diagnosis(11, 4, "Cold")]),
            &Loadable::Loaded(vec![patient(3, "Aoife", "Byrne")]),
        );
        let json = serde_json::to_value(&rows).expect("json");
        assert_eq!(json["state"], "loaded");
        assert_eq!(json["value"][0]["patient"], "Aoife Byrne");
        assert!(json["value"][1]["patient"].is_null());
    }

    #[test]
    fn test_detail_ignores_side_record_with_wrong_id() {
        let detail = prescription_detail(
            &Loadable::Loaded(prescription(1, 3, 5, 10)),
            &Loadable::Loaded(patient(3, "Aoife", "Byrne")),
            &Loadable::Loaded(doctor(6, "Stale", "Doctor")),
            &Loadable::Loading,
        );
        let detail = detail.loaded().expect("prescription loaded");
        assert_eq!(detail.patient.text(), Some("Aoife Byrne"));
        assert!(detail.doctor.is_loading());
        assert!(detail.condition.is_loading());
    }

    #[test]
    fn test_patient_appointments_join_doctors() {
        let view = patient_appointments(
            RecordId::new(9),
            &Loadable::Loaded(patient(9, "Niamh", "Walsh")),
            &Loadable::Loaded(vec![appointment(1, 5, 9, 1_700_000_000)]),
            &Loadable::Loaded(vec![doctor(5, "Tom", "Ryan")]),
        );
        assert_eq!(view.patient.text(), Some("Niamh Walsh"));
        let rows = view.appointments.loaded().expect("loaded");
        assert_eq!(rows[0].doctor.text(), Some("Dr Tom Ryan"));
    }

    #[test]
    fn test_select_options_follow_loading_state() {
        assert!(!doctor_options(&Loadable::Loading).is_loaded());
        let options = patient_options(&Loadable::Loaded(vec![patient(3, "Aoife", "Byrne")]));
        assert_eq!(
            options,
            Loadable::Loaded(vec![SelectOption {
                id: RecordId::new(3),
                label: "Aoife Byrne".into()
            }])
        );
    }

    #[test]
    fn test_display_formats() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).expect("epoch");
        assert_eq!(format_datetime(at), "14/11/2023 22:13");
        assert_eq!(format_date(at.date_naive()), "14/11/2023");
    }
}
