use super::{coerce_id, coerce_instant, FieldErrors, FieldRules, FormInput, Rule};
use crate::dates::{serialize_wire_datetime, to_wire_datetime};
use crate::models::{Appointment, RecordId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Raw input of the appointment create and edit screens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppointmentForm {
    pub doctor_id: String,
    pub patient_id: String,
    pub appointment_date: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppointmentPayload {
    pub doctor_id: RecordId,
    pub patient_id: RecordId,
    #[serde(serialize_with = "serialize_wire_datetime")]
    pub appointment_date: DateTime<Utc>,
}

impl AppointmentForm {
    /// Pre-fill the edit screen from a fetched appointment. The full instant is kept, so an edit
    /// that leaves the date alone sends the stored time back unchanged.
    pub fn from_record(appointment: &Appointment) -> Self {
        Self {
            doctor_id: appointment.doctor_id.to_string(),
            patient_id: appointment.patient_id.to_string(),
            appointment_date: to_wire_datetime(appointment.appointment_date),
        }
    }
}

impl FormInput for AppointmentForm {
    type Payload = AppointmentPayload;

    const SCHEMA: &'static [FieldRules] = &[
        FieldRules::trimmed("doctor_id", &[Rule::Required("Doctor is required")]),
        FieldRules::trimmed("patient_id", &[Rule::Required("Patient is required")]),
        FieldRules::trimmed(
            "appointment_date",
            &[Rule::Required("Appointment date is required")],
        ),
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "doctor_id" => &self.doctor_id,
            "patient_id" => &self.patient_id,
            "appointment_date" => &self.appointment_date,
            _ => "",
        }
    }

    fn coerce(&self) -> Result<AppointmentPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let doctor_id = coerce_id(&mut errors, "doctor_id", &self.doctor_id);
        let patient_id = coerce_id(&mut errors, "patient_id", &self.patient_id);
        let appointment_date =
            coerce_instant(&mut errors, "appointment_date", &self.appointment_date);

        match (doctor_id, patient_id, appointment_date) {
            (Some(doctor_id), Some(patient_id), Some(appointment_date)) => Ok(AppointmentPayload {
                doctor_id,
                patient_id,
                appointment_date,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::validate;
    use crate::models::fixtures::appointment;
    use crate::FormError;

    #[test]
    fn test_payload_has_integer_ids_and_wire_datetime() {
        let form = AppointmentForm {
            doctor_id: "5".into(),
            patient_id: "9".into(),
            appointment_date: "2024-06-03".into(),
        };
        let payload = validate(&form).expect("valid appointment");
        let json = serde_json::to_value(&payload).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({
                "doctor_id": 5,
                "patient_id": 9,
                "appointment_date": "2024-06-03T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_empty_form_reports_all_three_fields() {
        let FormError::Invalid(errors) =
            validate(&AppointmentForm::default()).expect_err("empty form");
        assert_eq!(errors.first("doctor_id"), Some("Doctor is required"));
        assert_eq!(errors.first("patient_id"), Some("Patient is required"));
        assert_eq!(
            errors.first("appointment_date"),
            Some("Appointment date is required")
        );
    }

    #[test]
    fn test_from_record_round_trips_through_validation() {
        let record = appointment(1, 5, 9, 1_700_000_000);
        let form = AppointmentForm::from_record(&record);
        assert_eq!(form.appointment_date, "2023-11-14T22:13:20Z");
        let payload = validate(&form).expect("prefilled form is valid");
        assert_eq!(payload.doctor_id, record.doctor_id);
        assert_eq!(payload.appointment_date, record.appointment_date);
    }

    #[test]
    fn test_changing_only_the_doctor_keeps_the_time_of_day() {
        let record = appointment(1, 5, 9, 1_700_000_000);
        let mut form = AppointmentForm::from_record(&record);
        form.doctor_id = "4".into();
        let json = serde_json::to_value(validate(&form).expect("valid edit")).expect("serialise");
        assert_eq!(json["appointment_date"], "2023-11-14T22:13:20Z");
        assert_eq!(json["doctor_id"], 4);
    }

    #[test]
    fn test_date_time_with_offset_is_normalised_to_utc() {
        let form = AppointmentForm {
            doctor_id: "5".into(),
            patient_id: "9".into(),
            appointment_date: "2024-06-03T09:30:00+02:00".into(),
        };
        let payload = validate(&form).expect("valid appointment");
        assert_eq!(to_wire_datetime(payload.appointment_date), "2024-06-03T07:30:00Z");
    }
}
