use super::{coerce_date, coerce_id, coerce_with, FieldErrors, FieldRules, FormInput, Rule};
use crate::cascade::DiagnosisCascade;
use crate::dates::{serialize_wire_date, to_wire_date};
use crate::error::{FormError, FormResult};
use crate::models::{Prescription, RecordId};
use chrono::NaiveDate;
use clinic_types::NonEmptyText;
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrescriptionForm {
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis_id: String,
    pub medication: String,
    pub dosage: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrescriptionPayload {
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub diagnosis_id: RecordId,
    pub medication: NonEmptyText,
    pub dosage: NonEmptyText,
    #[serde(serialize_with = "serialize_wire_date")]
    pub start_date: NaiveDate,
    #[serde(serialize_with = "serialize_wire_date")]
    pub end_date: NaiveDate,
}

impl PrescriptionForm {
    pub fn from_record(prescription: &Prescription) -> Self {
        Self {
            patient_id: prescription.patient_id.to_string(),
            doctor_id: prescription.doctor_id.to_string(),
            diagnosis_id: prescription.diagnosis_id.to_string(),
            medication: prescription.medication.clone(),
            dosage: prescription.dosage.clone(),
            start_date: to_wire_date(prescription.start_date),
            end_date: to_wire_date(prescription.end_date),
        }
    }

    /// Validate, then require the chosen condition to be one the cascade offers for the chosen
    /// patient.
    ///
    /// The membership check only applies once the diagnoses have loaded and the cascade is
    /// following this form's patient. Before that the backend remains the judge.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Invalid`] for schema or coercion failures, or when the condition
    /// belongs to a different patient.
    pub fn validate_with(&self, cascade: &DiagnosisCascade) -> FormResult<PrescriptionPayload> {
        let payload = super::validate(self)?;
        let following = cascade.parent() == Some(payload.patient_id);
        if cascade.is_ready() && following && !cascade.offers(payload.diagnosis_id) {
            let mut errors = FieldErrors::new();
            errors.add(
                "diagnosis_id",
                "Condition does not belong to the selected patient",
            );
            return Err(FormError::Invalid(errors));
        }
        Ok(payload)
    }
}

impl FormInput for PrescriptionForm {
    type Payload = PrescriptionPayload;

    const SCHEMA: &'static [FieldRules] = &[
        FieldRules::trimmed("patient_id", &[Rule::Required("Patient is required")]),
        FieldRules::trimmed("doctor_id", &[Rule::Required("Doctor is required")]),
        FieldRules::trimmed("diagnosis_id", &[Rule::Required("Condition is required")]),
        FieldRules::trimmed("medication", &[Rule::Required("Medication is required")]),
        FieldRules::trimmed("dosage", &[Rule::Required("Dosage is required")]),
        FieldRules::trimmed("start_date", &[Rule::Required("Start Date is required")]),
        FieldRules::trimmed("end_date", &[Rule::Required("End Date is required")]),
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "patient_id" => &self.patient_id,
            "doctor_id" => &self.doctor_id,
            "diagnosis_id" => &self.diagnosis_id,
            "medication" => &self.medication,
            "dosage" => &self.dosage,
            "start_date" => &self.start_date,
            "end_date" => &self.end_date,
            _ => "",
        }
    }

    fn coerce(&self) -> Result<PrescriptionPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let patient_id = coerce_id(&mut errors, "patient_id", &self.patient_id);
        let doctor_id = coerce_id(&mut errors, "doctor_id", &self.doctor_id);
        let diagnosis_id = coerce_id(&mut errors, "diagnosis_id", &self.diagnosis_id);
        let medication = coerce_with(&mut errors, "medication", NonEmptyText::new(&self.medication));
        let dosage = coerce_with(&mut errors, "dosage", NonEmptyText::new(&self.dosage));
        let start_date = coerce_date(&mut errors, "start_date", &self.start_date);
        let end_date = coerce_date(&mut errors, "end_date", &self.end_date);

        match (patient_id, doctor_id, diagnosis_id, medication, dosage, start_date, end_date) {
            (
                Some(patient_id),
                Some(doctor_id),
                Some(diagnosis_id),
                Some(medication),
                Some(dosage),
                Some(start_date),
                Some(end_date),
            ) => Ok(PrescriptionPayload {
                patient_id,
                doctor_id,
                diagnosis_id,
                medication,
                dosage,
                start_date,
                end_date,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::validate;
    use crate::models::fixtures::{diagnosis, prescription};

    fn form(patient: &str, diagnosis: &str) -> PrescriptionForm {
        PrescriptionForm {
            patient_id: patient.into(),
            doctor_id: "5".into(),
            diagnosis_id: diagnosis.into(),
            medication: "Amoxicillin".into(),
            dosage: "500mg".into(),
            start_date: "2024-02-01T00:00:00.000Z".into(),
            end_date: "2024-02-08".into(),
        }
    }

    fn cascade_for(patient: u64) -> DiagnosisCascade {
        let mut cascade = DiagnosisCascade::new();
        cascade.set_children(vec![diagnosis(10, 3, "Flu"), diagnosis(11, 4, "Cold")]);
        cascade.select_parent(RecordId::new(patient));
        cascade
    }

    #[test]
    fn test_payload_coerces_ids_and_dates() {
        let json = serde_json::to_value(validate(&form("3", "10")).expect("valid")).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "patient_id": 3,
                "doctor_id": 5,
                "diagnosis_id": 10,
                "medication": "Amoxicillin",
                "dosage": "500mg",
                "start_date": "2024-02-01",
                "end_date": "2024-02-08"
            })
        );
    }

    #[test]
    fn test_missing_condition_message() {
        let FormError::Invalid(errors) = validate(&form("3", "")).expect_err("no condition");
        assert_eq!(errors.first("diagnosis_id"), Some("Condition is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_condition_of_another_patient_is_rejected() {
        let cascade = cascade_for(3);
        assert!(form("3", "10").validate_with(&cascade).is_ok());

        let FormError::Invalid(errors) = form("3", "11")
            .validate_with(&cascade)
            .expect_err("Cold belongs to patient 4");
        assert_eq!(
            errors.first("diagnosis_id"),
            Some("Condition does not belong to the selected patient")
        );
    }

    #[test]
    fn test_membership_is_not_checked_before_diagnoses_load() {
        let mut cascade = DiagnosisCascade::new();
        cascade.select_parent(RecordId::new(3));
        assert!(form("3", "11").validate_with(&cascade).is_ok());
    }

    #[test]
    fn test_from_record_prefills_edit_screen() {
        let form = PrescriptionForm::from_record(&prescription(1, 3, 5, 10));
        assert_eq!(form.diagnosis_id, "10");
        assert_eq!(form.end_date, "2024-02-08");
        assert!(form.validate_with(&cascade_for(3)).is_ok());
    }
}
