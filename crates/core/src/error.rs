use crate::forms::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: &'static str },
    #[error("invalid HTTP timeout {0:?}: expected a whole number of seconds")]
    InvalidTimeout(String),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

/// A form that cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("form has invalid fields: {0}")]
    Invalid(FieldErrors),
}

impl FormError {
    pub fn field_errors(&self) -> &FieldErrors {
        match self {
            FormError::Invalid(errors) => errors,
        }
    }
}

pub type FormResult<T> = std::result::Result<T, FormError>;
