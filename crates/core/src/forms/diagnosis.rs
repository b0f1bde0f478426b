use super::{coerce_date, coerce_id, coerce_with, FieldErrors, FieldRules, FormInput, Rule};
use crate::dates::{serialize_wire_date, to_wire_date};
use crate::models::{Diagnosis, RecordId};
use chrono::NaiveDate;
use clinic_types::NonEmptyText;
use serde::Serialize;

/// Raw input of the diagnosis create and edit screens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosisForm {
    pub condition: String,
    pub diagnosis_date: String,
    pub patient_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosisPayload {
    pub condition: NonEmptyText,
    #[serde(serialize_with = "serialize_wire_date")]
    pub diagnosis_date: NaiveDate,
    pub patient_id: RecordId,
}

impl DiagnosisForm {
    pub fn from_record(diagnosis: &Diagnosis) -> Self {
        Self {
            condition: diagnosis.condition.clone(),
            diagnosis_date: to_wire_date(diagnosis.diagnosis_date),
            patient_id: diagnosis.patient_id.to_string(),
        }
    }
}

impl FormInput for DiagnosisForm {
    type Payload = DiagnosisPayload;

    const SCHEMA: &'static [FieldRules] = &[
        FieldRules::trimmed("condition", &[Rule::Required("Condition is required")]),
        FieldRules::trimmed("diagnosis_date", &[Rule::Required("You must pick a date")]),
        FieldRules::trimmed("patient_id", &[Rule::Required("Patient is required")]),
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "condition" => &self.condition,
            "diagnosis_date" => &self.diagnosis_date,
            "patient_id" => &self.patient_id,
            _ => "",
        }
    }

    fn coerce(&self) -> Result<DiagnosisPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let condition = coerce_with(&mut errors, "condition", NonEmptyText::new(&self.condition));
        let diagnosis_date = coerce_date(&mut errors, "diagnosis_date", &self.diagnosis_date);
        let patient_id = coerce_id(&mut errors, "patient_id", &self.patient_id);

        match (condition, diagnosis_date, patient_id) {
            (Some(condition), Some(diagnosis_date), Some(patient_id)) => Ok(DiagnosisPayload {
                condition,
                diagnosis_date,
                patient_id,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::validate;
    use crate::models::fixtures::diagnosis;
    use crate::FormError;

    #[test]
    fn test_picked_datetime_is_sent_as_date() {
        let form = DiagnosisForm {
            condition: " Flu ".into(),
            diagnosis_date: "2024-02-01T00:00:00.000Z".into(),
            patient_id: "3".into(),
        };
        let json = serde_json::to_value(validate(&form).expect("valid")).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({"condition": "Flu", "diagnosis_date": "2024-02-01", "patient_id": 3})
        );
    }

    #[test]
    fn test_unparsable_date_is_a_field_error() {
        let form = DiagnosisForm {
            condition: "Flu".into(),
            diagnosis_date: "yesterday".into(),
            patient_id: "x".into(),
        };
        let FormError::Invalid(errors) = validate(&form).expect_err("bad input");
        assert!(errors.get("diagnosis_date").is_some());
        assert!(errors.get("patient_id").is_some());
        assert!(errors.get("condition").is_none());
    }

    #[test]
    fn test_from_record_prefills_edit_screen() {
        let form = DiagnosisForm::from_record(&diagnosis(10, 3, "Flu"));
        assert_eq!(form.patient_id, "3");
        assert_eq!(form.diagnosis_date, "2024-02-01");
    }
}
