//! Page loaders for every console screen.
//!
//! Mounting a page starts its fetches immediately. Views are computed from whatever has arrived,
//! so they can be rendered at any point; [`Page::scope`] gives access to settling and notices.

use crate::backend::RecordsBackend;
use crate::page::{PageScope, Slice};
use clinic_core::forms::{AppointmentForm, DiagnosisForm, PatientForm, PrescriptionForm};
use clinic_core::views::{
    self, AppointmentDetail, AppointmentRow, DiagnosisDetail, DiagnosisRow, DoctorRow,
    PatientAppointments, PrescriptionDetail, SelectOption,
};
use clinic_core::{
    Appointment, Diagnosis, DiagnosisCascade, DiagnosisOption, Doctor, Loadable, Patient,
    Prescription, RecordId,
};
use std::sync::Arc;

pub type Backend = Arc<dyn RecordsBackend>;

/// Whether a form screen creates a record or edits an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

pub trait Page {
    fn scope(&mut self) -> &mut PageScope;
}

macro_rules! impl_page {
    ($($ty:ty),* $(,)?) => {
        $(impl Page for $ty {
            fn scope(&mut self) -> &mut PageScope {
                &mut self.scope
            }
        })*
    };
}

/// Dependent fetch of the record `$from` refers to, refetched whenever the reference changes.
macro_rules! fetch_ref {
    ($scope:expr, $what:literal, $from:expr => $slice:expr, $backend:expr, $key:expr, |$b:ident, $id:ident| $call:expr) => {{
        let backend = Arc::clone($backend);
        $scope.fetch_when($what, &$from, $key, &$slice, move |$id| {
            let $b = Arc::clone(&backend);
            async move { $call.await }
        });
    }};
}

macro_rules! fetch {
    ($scope:expr, $what:literal, $slice:expr, $backend:expr, |$b:ident| $call:expr) => {{
        let $b = Arc::clone($backend);
        $scope.fetch($what, &$slice, async move { $call.await });
    }};
}

pub struct AppointmentsIndex {
    pub appointments: Slice<Vec<Appointment>>,
    pub doctors: Slice<Vec<Doctor>>,
    pub patients: Slice<Vec<Patient>>,
    scope: PageScope,
}

impl AppointmentsIndex {
    pub fn mount(backend: &Backend) -> Self {
        let mut page = Self {
            appointments: Slice::new(),
            doctors: Slice::new(),
            patients: Slice::new(),
            scope: PageScope::new("appointments_index"),
        };
        fetch!(page.scope, "appointments", page.appointments, backend, |b| b.list_appointments());
        fetch!(page.scope, "doctors", page.doctors, backend, |b| b.list_doctors());
        fetch!(page.scope, "patients", page.patients, backend, |b| b.list_patients());
        page
    }

    pub fn rows(&self) -> Loadable<Vec<AppointmentRow>> {
        views::appointment_rows(
            &self.appointments.get(),
            &self.doctors.get(),
            &self.patients.get(),
        )
    }

    /// Drop a deleted appointment from the list without refetching.
    pub fn remove(&self, id: RecordId) {
        self.appointments.update(|list| list.retain(|a| a.id != id));
    }
}

pub struct AppointmentShow {
    pub id: RecordId,
    pub appointment: Slice<Appointment>,
    pub doctor: Slice<Doctor>,
    pub patient: Slice<Patient>,
    scope: PageScope,
}

impl AppointmentShow {
    pub fn mount(backend: &Backend, id: RecordId) -> Self {
        let mut page = Self {
            id,
            appointment: Slice::new(),
            doctor: Slice::new(),
            patient: Slice::new(),
            scope: PageScope::new("appointment_show"),
        };
        fetch!(page.scope, "appointment", page.appointment, backend, |b| b.get_appointment(id));

        fetch_ref!(page.scope, "doctor", page.appointment => page.doctor, backend,
            |a: &Appointment| Some(a.doctor_id), |b, ref_id| b.get_doctor(ref_id));
        fetch_ref!(page.scope, "patient", page.appointment => page.patient, backend,
            |a: &Appointment| Some(a.patient_id), |b, ref_id| b.get_patient(ref_id));
        page
    }

    pub fn detail(&self) -> Loadable<AppointmentDetail> {
        views::appointment_detail(&self.appointment.get(), &self.doctor.get(), &self.patient.get())
    }
}

pub struct AppointmentFormPage {
    pub mode: FormMode,
    pub record: Slice<Appointment>,
    pub doctors: Slice<Vec<Doctor>>,
    pub patients: Slice<Vec<Patient>>,
    scope: PageScope,
}

impl AppointmentFormPage {
    pub fn mount(backend: &Backend, mode: FormMode) -> Self {
        let mut page = Self {
            mode,
            record: Slice::new(),
            doctors: Slice::new(),
            patients: Slice::new(),
            scope: PageScope::new("appointment_form"),
        };
        fetch!(page.scope, "doctors", page.doctors, backend, |b| b.list_doctors());
        fetch!(page.scope, "patients", page.patients, backend, |b| b.list_patients());
        if let FormMode::Edit(id) = mode {
            fetch!(page.scope, "appointment", page.record, backend, |b| b.get_appointment(id));
        }
        page
    }

    /// Initial form values: blank on create, the fetched record on edit.
    pub fn prefill(&self) -> Loadable<AppointmentForm> {
        match self.mode {
            FormMode::Create => Loadable::Loaded(AppointmentForm::default()),
            FormMode::Edit(_) => self.record.get().map(|a| AppointmentForm::from_record(&a)),
        }
    }

    pub fn doctor_options(&self) -> Loadable<Vec<SelectOption>> {
        views::doctor_options(&self.doctors.get())
    }

    pub fn patient_options(&self) -> Loadable<Vec<SelectOption>> {
        views::patient_options(&self.patients.get())
    }
}

pub struct DiagnosesIndex {
    pub diagnoses: Slice<Vec<Diagnosis>>,
    pub patients: Slice<Vec<Patient>>,
    scope: PageScope,
}

impl DiagnosesIndex {
    pub fn mount(backend: &Backend) -> Self {
        let mut page = Self {
            diagnoses: Slice::new(),
            patients: Slice::new(),
            scope: PageScope::new("diagnoses_index"),
        };
        fetch!(page.scope, "diagnoses", page.diagnoses, backend, |b| b.list_diagnoses());
        fetch!(page.scope, "patients", page.patients, backend, |b| b.list_patients());
        page
    }

    pub fn rows(&self) -> Loadable<Vec<DiagnosisRow>> {
        views::diagnosis_rows(&self.diagnoses.get(), &self.patients.get())
    }

    pub fn remove(&self, id: RecordId) {
        self.diagnoses.update(|list| list.retain(|d| d.id != id));
    }
}

pub struct DiagnosisShow {
    pub id: RecordId,
    pub diagnosis: Slice<Diagnosis>,
    pub patient: Slice<Patient>,
    scope: PageScope,
}

impl DiagnosisShow {
    pub fn mount(backend: &Backend, id: RecordId) -> Self {
        let mut page = Self {
            id,
            diagnosis: Slice::new(),
            patient: Slice::new(),
            scope: PageScope::new("diagnosis_show"),
        };
        fetch!(page.scope, "diagnosis", page.diagnosis, backend, |b| b.get_diagnosis(id));
        fetch_ref!(page.scope, "patient", page.diagnosis => page.patient, backend,
            |d: &Diagnosis| Some(d.patient_id), |b, ref_id| b.get_patient(ref_id));
        page
    }

    pub fn detail(&self) -> Loadable<DiagnosisDetail> {
        views::diagnosis_detail(&self.diagnosis.get(), &self.patient.get())
    }
}

pub struct DiagnosisFormPage {
    pub mode: FormMode,
    pub record: Slice<Diagnosis>,
    pub patients: Slice<Vec<Patient>>,
    scope: PageScope,
}

impl DiagnosisFormPage {
    pub fn mount(backend: &Backend, mode: FormMode) -> Self {
        let mut page = Self {
            mode,
            record: Slice::new(),
            patients: Slice::new(),
            scope: PageScope::new("diagnosis_form"),
        };
        fetch!(page.scope, "patients", page.patients, backend, |b| b.list_patients());
        if let FormMode::Edit(id) = mode {
            fetch!(page.scope, "diagnosis", page.record, backend, |b| b.get_diagnosis(id));
        }
        page
    }

    pub fn prefill(&self) -> Loadable<DiagnosisForm> {
        match self.mode {
            FormMode::Create => Loadable::Loaded(DiagnosisForm::default()),
            FormMode::Edit(_) => self.record.get().map(|d| DiagnosisForm::from_record(&d)),
        }
    }

    pub fn patient_options(&self) -> Loadable<Vec<SelectOption>> {
        views::patient_options(&self.patients.get())
    }
}

pub struct PrescriptionShow {
    pub id: RecordId,
    pub prescription: Slice<Prescription>,
    pub patient: Slice<Patient>,
    pub doctor: Slice<Doctor>,
    pub diagnosis: Slice<Diagnosis>,
    scope: PageScope,
}

impl PrescriptionShow {
    pub fn mount(backend: &Backend, id: RecordId) -> Self {
        let mut page = Self {
            id,
            prescription: Slice::new(),
            patient: Slice::new(),
            doctor: Slice::new(),
            diagnosis: Slice::new(),
            scope: PageScope::new("prescription_show"),
        };
        fetch!(page.scope, "prescription", page.prescription, backend, |b| b.get_prescription(id));

        fetch_ref!(page.scope, "diagnosis", page.prescription => page.diagnosis, backend,
            |p: &Prescription| Some(p.diagnosis_id), |b, ref_id| b.get_diagnosis(ref_id));
        fetch_ref!(page.scope, "doctor", page.prescription => page.doctor, backend,
            |p: &Prescription| Some(p.doctor_id), |b, ref_id| b.get_doctor(ref_id));
        fetch_ref!(page.scope, "patient", page.prescription => page.patient, backend,
            |p: &Prescription| Some(p.patient_id), |b, ref_id| b.get_patient(ref_id));
        page
    }

    pub fn detail(&self) -> Loadable<PrescriptionDetail> {
        views::prescription_detail(
            &self.prescription.get(),
            &self.patient.get(),
            &self.doctor.get(),
            &self.diagnosis.get(),
        )
    }
}

/// The prescription form, with the patient → condition cascade.
pub struct PrescriptionFormPage {
    pub mode: FormMode,
    pub record: Slice<Prescription>,
    /// The record's current condition, fetched on its own on edit.
    pub current_diagnosis: Slice<Diagnosis>,
    pub patients: Slice<Vec<Patient>>,
    pub doctors: Slice<Vec<Doctor>>,
    pub diagnoses: Slice<Vec<Diagnosis>>,
    scope: PageScope,
}

impl PrescriptionFormPage {
    pub fn mount(backend: &Backend, mode: FormMode) -> Self {
        let mut page = Self {
            mode,
            record: Slice::new(),
            current_diagnosis: Slice::new(),
            patients: Slice::new(),
            doctors: Slice::new(),
            diagnoses: Slice::new(),
            scope: PageScope::new("prescription_form"),
        };
        fetch!(page.scope, "doctors", page.doctors, backend, |b| b.list_doctors());
        fetch!(page.scope, "patients", page.patients, backend, |b| b.list_patients());
        fetch!(page.scope, "diagnoses", page.diagnoses, backend, |b| b.list_diagnoses());
        if let FormMode::Edit(id) = mode {
            fetch!(page.scope, "prescription", page.record, backend, |b| b.get_prescription(id));
            fetch_ref!(page.scope, "current condition", page.record => page.current_diagnosis, backend,
                |p: &Prescription| Some(p.diagnosis_id), |b, ref_id| b.get_diagnosis(ref_id));
        }
        page
    }

    pub fn prefill(&self) -> Loadable<PrescriptionForm> {
        match self.mode {
            FormMode::Create => Loadable::Loaded(PrescriptionForm::default()),
            FormMode::Edit(_) => self
                .record
                .get()
                .map(|p| PrescriptionForm::from_record(&p)),
        }
    }

    /// The condition cascade for the patient currently chosen on the form.
    ///
    /// Built from the latest slices on every call. On edit, the record's own condition stays
    /// selectable while the form still names that condition's patient.
    pub fn cascade(&self, patient_id: &str) -> DiagnosisCascade {
        let mut cascade = DiagnosisCascade::new();
        if let Loadable::Loaded(diagnoses) = self.diagnoses.get() {
            cascade.set_children(diagnoses);
        }
        cascade.select_parent_str(patient_id);
        if let Loadable::Loaded(current) = self.current_diagnosis.get() {
            if cascade.parent() == Some(current.patient_id) {
                cascade.pin(current);
            }
        }
        cascade
    }

    pub fn condition_options(&self, patient_id: &str) -> Vec<DiagnosisOption> {
        self.cascade(patient_id).diagnosis_options()
    }

    pub fn doctor_options(&self) -> Loadable<Vec<SelectOption>> {
        views::doctor_options(&self.doctors.get())
    }

    pub fn patient_options(&self) -> Loadable<Vec<SelectOption>> {
        views::patient_options(&self.patients.get())
    }
}

pub struct PatientAppointmentsPage {
    pub id: RecordId,
    pub patient: Slice<Patient>,
    pub appointments: Slice<Vec<Appointment>>,
    pub doctors: Slice<Vec<Doctor>>,
    scope: PageScope,
}

impl PatientAppointmentsPage {
    pub fn mount(backend: &Backend, id: RecordId) -> Self {
        let mut page = Self {
            id,
            patient: Slice::new(),
            appointments: Slice::new(),
            doctors: Slice::new(),
            scope: PageScope::new("patient_appointments"),
        };
        fetch!(page.scope, "patient", page.patient, backend, |b| b.get_patient(id));
        fetch!(page.scope, "appointments", page.appointments, backend, |b| b
            .list_patient_appointments(id));
        fetch!(page.scope, "doctors", page.doctors, backend, |b| b.list_doctors());
        page
    }

    pub fn view(&self) -> PatientAppointments {
        views::patient_appointments(
            self.id,
            &self.patient.get(),
            &self.appointments.get(),
            &self.doctors.get(),
        )
    }
}

pub struct PatientEditPage {
    pub id: RecordId,
    pub patient: Slice<Patient>,
    scope: PageScope,
}

impl PatientEditPage {
    pub fn mount(backend: &Backend, id: RecordId) -> Self {
        let mut page = Self {
            id,
            patient: Slice::new(),
            scope: PageScope::new("patient_edit"),
        };
        fetch!(page.scope, "patient", page.patient, backend, |b| b.get_patient(id));
        page
    }

    pub fn prefill(&self) -> Loadable<PatientForm> {
        self.patient.get().map(|p| PatientForm::from_record(&p))
    }
}

pub struct DoctorsIndex {
    pub doctors: Slice<Vec<Doctor>>,
    scope: PageScope,
}

impl DoctorsIndex {
    pub fn mount(backend: &Backend) -> Self {
        let mut page = Self {
            doctors: Slice::new(),
            scope: PageScope::new("doctors_index"),
        };
        fetch!(page.scope, "doctors", page.doctors, backend, |b| b.list_doctors());
        page
    }

    pub fn rows(&self) -> Loadable<Vec<DoctorRow>> {
        views::doctor_rows(&self.doctors.get())
    }
}

impl_page!(
    AppointmentsIndex,
    AppointmentShow,
    AppointmentFormPage,
    DiagnosesIndex,
    DiagnosisShow,
    DiagnosisFormPage,
    PrescriptionShow,
    PrescriptionFormPage,
    PatientAppointmentsPage,
    PatientEditPage,
    DoctorsIndex,
);
