//! Form validation and coercion.
//!
//! Each form holds the raw strings a user typed or picked. Submitting runs two passes:
//!
//! 1. the form's static schema (required fields, length bounds, digit counts, email format),
//!    collecting every message for every violated field;
//! 2. only if the schema passed, coercion into a typed payload: ids become integers, dates
//!    become `YYYY-MM-DD` and date-times become RFC 3339 UTC. Anything that cannot be coerced
//!    is reported as a field error too.
//!
//! A payload only exists for input that passed both.

pub mod appointment;
pub mod diagnosis;
pub mod patient;
pub mod prescription;

pub use appointment::{AppointmentForm, AppointmentPayload};
pub use diagnosis::{DiagnosisForm, DiagnosisPayload};
pub use patient::{PatientForm, PatientPayload};
pub use prescription::{PrescriptionForm, PrescriptionPayload};

use crate::dates::{parse_form_date, parse_instant};
use crate::error::{FormError, FormResult};
use crate::models::RecordId;
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::{strip_whitespace, EmailAddress};
use serde::Serialize;

/// One check applied to a field value.
#[derive(Clone, Copy, Debug)]
pub enum Rule {
    /// At least one non-whitespace character.
    Required(&'static str),
    MinLen(usize, &'static str),
    MaxLen(usize, &'static str),
    DigitsOnly(&'static str),
    Email(&'static str),
}

/// How a field value is normalised before its rules run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalise {
    Trim,
    StripWhitespace,
}

/// The rules for one named field.
#[derive(Clone, Copy, Debug)]
pub struct FieldRules {
    pub field: &'static str,
    pub normalise: Normalise,
    pub rules: &'static [Rule],
}

impl FieldRules {
    pub const fn trimmed(field: &'static str, rules: &'static [Rule]) -> Self {
        Self {
            field,
            normalise: Normalise::Trim,
            rules,
        }
    }

    pub const fn compact(field: &'static str, rules: &'static [Rule]) -> Self {
        Self {
            field,
            normalise: Normalise::StripWhitespace,
            rules,
        }
    }
}

/// Field-level validation messages, in schema order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(&'static str, Vec<String>)>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        let message = message.into();
        match self.0.iter_mut().find(|(f, _)| *f == field) {
            Some((_, messages)) => messages.push(message),
            None => self.0.push((field, vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one message.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_slice())
    }

    /// The message a form shows next to `field`.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(|m| m.first())
            .map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> + '_ {
        self.0.iter().map(|(f, m)| (*f, m.as_slice()))
    }

    pub fn into_result(self) -> FormResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FormError::Invalid(self))
        }
    }
}

impl Serialize for FieldErrors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, messages) in &self.0 {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A form that can be validated and turned into a request payload.
pub trait FormInput {
    type Payload: Serialize;

    const SCHEMA: &'static [FieldRules];

    /// Raw value of `field`. Unknown fields read as empty.
    fn value(&self, field: &str) -> &str;

    /// Build the payload from input that already passed the schema.
    fn coerce(&self) -> Result<Self::Payload, FieldErrors>;
}

fn check_rule(rule: &Rule, value: &str) -> Option<&'static str> {
    let len = value.chars().count();
    match *rule {
        Rule::Required(msg) => value.is_empty().then_some(msg),
        Rule::MinLen(min, msg) => (len < min).then_some(msg),
        Rule::MaxLen(max, msg) => (len > max).then_some(msg),
        Rule::DigitsOnly(msg) => (!value.bytes().all(|b| b.is_ascii_digit())).then_some(msg),
        Rule::Email(msg) => EmailAddress::parse(value).is_err().then_some(msg),
    }
}

/// Run the schema of `form`, returning every violation.
pub fn check_schema<F: FormInput>(form: &F) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field_rules in F::SCHEMA {
        let raw = form.value(field_rules.field);
        let normalised = match field_rules.normalise {
            Normalise::Trim => raw.trim().to_owned(),
            Normalise::StripWhitespace => strip_whitespace(raw),
        };
        for rule in field_rules.rules {
            if let Some(message) = check_rule(rule, &normalised) {
                errors.add(field_rules.field, message);
            }
        }
    }
    errors
}

/// Validate `form` and coerce it into its payload.
///
/// # Errors
///
/// Returns [`FormError::Invalid`] with every violated field if the schema or coercion fails.
pub fn validate<F: FormInput>(form: &F) -> FormResult<F::Payload> {
    check_schema(form).into_result()?;
    form.coerce().map_err(FormError::Invalid)
}

pub(crate) fn coerce_id(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<RecordId> {
    match raw.parse::<RecordId>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "Must be a valid selection");
            None
        }
    }
}

pub(crate) fn coerce_date(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
) -> Option<NaiveDate> {
    let parsed = parse_form_date(raw);
    if parsed.is_none() {
        errors.add(field, "Must be a date in YYYY-MM-DD format");
    }
    parsed
}

/// Like [`coerce_date`] but keeps the time of day. A bare date means UTC midnight.
pub(crate) fn coerce_instant(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
) -> Option<DateTime<Utc>> {
    let parsed = parse_instant(raw);
    if parsed.is_none() {
        errors.add(field, "Must be a date (YYYY-MM-DD) or an RFC 3339 date-time");
    }
    parsed
}

pub(crate) fn coerce_with<T, E>(
    errors: &mut FieldErrors,
    field: &'static str,
    result: Result<T, E>,
) -> Option<T>
where
    E: std::fmt::Display,
{
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SampleForm {
        name: String,
        code: String,
    }

    impl FormInput for SampleForm {
        type Payload = String;

        const SCHEMA: &'static [FieldRules] = &[
            FieldRules::trimmed(
                "name",
                &[Rule::Required("Name is required"), Rule::MaxLen(4, "Name is too long")],
            ),
            FieldRules::compact(
                "code",
                &[
                    Rule::MinLen(3, "Code is too short"),
                    Rule::DigitsOnly("Code must be digits"),
                ],
            ),
        ];

        fn value(&self, field: &str) -> &str {
            match field {
                "name" => &self.name,
                "code" => &self.code,
                _ => "",
            }
        }

        fn coerce(&self) -> Result<String, FieldErrors> {
            Ok(format!("{}-{}", self.name.trim(), strip_whitespace(&self.code)))
        }
    }

    #[test]
    fn test_every_violated_field_is_reported() {
        let form = SampleForm {
            name: "   ".into(),
            code: "1 a".into(),
        };
        let errors = check_schema(&form);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first("name"), Some("Name is required"));
        assert_eq!(
            errors.get("code"),
            Some(&["Code is too short".to_string(), "Code must be digits".to_string()][..])
        );
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["name", "code"],
            "schema order is kept"
        );
    }

    #[test]
    fn test_compact_fields_ignore_inner_whitespace() {
        let form = SampleForm {
            name: "Ann".into(),
            code: "1 2 3".into(),
        };
        assert!(check_schema(&form).is_empty());
        assert_eq!(validate(&form).expect("valid"), "Ann-123");
    }

    #[test]
    fn test_validate_blocks_coercion_when_schema_fails() {
        let form = SampleForm {
            name: "Bartholomew".into(),
            code: "123".into(),
        };
        let err = validate(&form).expect_err("name too long");
        let FormError::Invalid(errors) = err;
        assert_eq!(errors.first("name"), Some("Name is too long"));
        assert_eq!(errors.to_string(), "name: Name is too long");
    }

    #[test]
    fn test_coercion_helpers_record_field_errors() {
        let mut errors = FieldErrors::new();
        assert_eq!(coerce_id(&mut errors, "doctor_id", "12"), Some(RecordId::new(12)));
        assert_eq!(coerce_id(&mut errors, "doctor_id", "Dr Who"), None);
        assert!(coerce_date(&mut errors, "start_date", "2024-13-40").is_none());
        assert!(coerce_instant(&mut errors, "appointment_date", "soon").is_none());
        assert_eq!(errors.len(), 3);
    }
}
