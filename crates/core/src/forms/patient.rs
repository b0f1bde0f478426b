use super::{coerce_date, coerce_with, FieldErrors, FieldRules, FormInput, Rule};
use crate::dates::{serialize_wire_date, to_wire_date};
use crate::models::Patient;
use chrono::NaiveDate;
use clinic_types::{EmailAddress, NonEmptyText, PhoneNumber};
use serde::Serialize;

/// Longest first or last name the patient screen accepts.
pub const NAME_MAX_CHARS: usize = 15;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub date_of_birth: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientPayload {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub phone: PhoneNumber,
    pub email: EmailAddress,
    pub address: NonEmptyText,
    #[serde(serialize_with = "serialize_wire_date")]
    pub date_of_birth: NaiveDate,
}

impl PatientForm {
    /// Pre-fill the edit screen. A missing date of birth leaves the field blank.
    pub fn from_record(patient: &Patient) -> Self {
        Self {
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            phone: patient.phone.clone(),
            email: patient.email.clone(),
            address: patient.address.clone(),
            date_of_birth: patient.date_of_birth.map(to_wire_date).unwrap_or_default(),
        }
    }
}

impl FormInput for PatientForm {
    type Payload = PatientPayload;

    const SCHEMA: &'static [FieldRules] = &[
        FieldRules::trimmed(
            "first_name",
            &[
                Rule::Required("First name is required"),
                Rule::MaxLen(NAME_MAX_CHARS, "First name is too long"),
            ],
        ),
        FieldRules::trimmed(
            "last_name",
            &[
                Rule::Required("Last name is required"),
                Rule::MaxLen(NAME_MAX_CHARS, "Last name is too long"),
            ],
        ),
        FieldRules::compact(
            "phone",
            &[
                Rule::MinLen(PhoneNumber::DIGITS, "Phone is required"),
                Rule::MaxLen(PhoneNumber::DIGITS, "Phone number is too long"),
                Rule::DigitsOnly("Phone number must contain only digits"),
            ],
        ),
        FieldRules::trimmed("email", &[Rule::Email("Invalid email address")]),
        FieldRules::trimmed("address", &[Rule::Required("Address is required")]),
        FieldRules::trimmed(
            "date_of_birth",
            &[Rule::Required("Date of Birth is required")],
        ),
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "phone" => &self.phone,
            "email" => &self.email,
            "address" => &self.address,
            "date_of_birth" => &self.date_of_birth,
            _ => "",
        }
    }

    fn coerce(&self) -> Result<PatientPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let first_name = coerce_with(
            &mut errors,
            "first_name",
            NonEmptyText::bounded(&self.first_name, NAME_MAX_CHARS),
        );
        let last_name = coerce_with(
            &mut errors,
            "last_name",
            NonEmptyText::bounded(&self.last_name, NAME_MAX_CHARS),
        );
        let phone = coerce_with(&mut errors, "phone", PhoneNumber::parse(&self.phone));
        let email = coerce_with(&mut errors, "email", EmailAddress::parse(&self.email));
        let address = coerce_with(&mut errors, "address", NonEmptyText::new(&self.address));
        let date_of_birth = coerce_date(&mut errors, "date_of_birth", &self.date_of_birth);

        match (first_name, last_name, phone, email, address, date_of_birth) {
            (
                Some(first_name),
                Some(last_name),
                Some(phone),
                Some(email),
                Some(address),
                Some(date_of_birth),
            ) => Ok(PatientPayload {
                first_name,
                last_name,
                phone,
                email,
                address,
                date_of_birth,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::validate;
    use crate::models::fixtures::patient;
    use crate::FormError;

    fn valid_form() -> PatientForm {
        PatientForm {
            first_name: "Aoife".into(),
            last_name: "Byrne".into(),
            phone: "087 123 4567".into(),
            email: "aoife@example.ie".into(),
            address: "4 Quay Street, Galway".into(),
            date_of_birth: "1990-05-17".into(),
        }
    }

    fn errors_for(form: &PatientForm) -> FieldErrors {
        let FormError::Invalid(errors) = validate(form).expect_err("form should be invalid");
        errors
    }

    #[test]
    fn test_valid_patient_payload() {
        let json = serde_json::to_value(validate(&valid_form()).expect("valid")).expect("json");
        assert_eq!(json["phone"], "0871234567");
        assert_eq!(json["date_of_birth"], "1990-05-17");
        assert_eq!(json["first_name"], "Aoife");
    }

    #[test]
    fn test_phone_length_and_digits() {
        let mut form = valid_form();
        form.phone = "087123456".into();
        assert_eq!(errors_for(&form).first("phone"), Some("Phone is required"));

        form.phone = "08712345678".into();
        assert_eq!(errors_for(&form).first("phone"), Some("Phone number is too long"));

        form.phone = "087-123-456".into();
        let errors = errors_for(&form);
        assert_eq!(
            errors.first("phone"),
            Some("Phone number is too long"),
            "eleven characters once whitespace is gone"
        );
        assert!(errors
            .get("phone")
            .expect("phone errors")
            .contains(&"Phone number must contain only digits".to_string()));
    }

    #[test]
    fn test_every_violated_field_is_reported() {
        let form = PatientForm {
            first_name: "Bartholomew-Alexander".into(),
            last_name: String::new(),
            phone: String::new(),
            email: "not-an-email".into(),
            address: " ".into(),
            date_of_birth: String::new(),
        };
        let errors = errors_for(&form);
        assert_eq!(errors.len(), 6);
        assert_eq!(errors.first("first_name"), Some("First name is too long"));
        assert_eq!(errors.first("last_name"), Some("Last name is required"));
        assert_eq!(errors.first("email"), Some("Invalid email address"));
        assert_eq!(errors.first("address"), Some("Address is required"));
        assert_eq!(
            errors.first("date_of_birth"),
            Some("Date of Birth is required")
        );
    }

    #[test]
    fn test_from_record_prefills_and_validates() {
        let form = PatientForm::from_record(&patient(2, "Sean", "Kelly"));
        assert_eq!(form.date_of_birth, "1990-01-15");
        assert!(validate(&form).is_ok());
    }
}
