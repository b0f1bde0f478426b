//! Validated text primitives shared across the clinic admin crates.
//!
//! Every type here is constructed through a checking constructor, so holding a value means the
//! check already passed. Form payloads are built from these types after schema validation.

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input text is longer than the permitted number of characters
    #[error("Text exceeds maximum length of {max} characters")]
    TooLong { max: usize },
    /// The input is not a plausible email address
    #[error("Invalid email address")]
    InvalidEmail,
    /// The phone number does not have the required number of digits
    #[error("Phone number must have {expected} digits, got {actual}")]
    PhoneLength { expected: usize, actual: usize },
    /// The phone number contains something other than digits
    #[error("Phone number must contain only digits")]
    PhoneNotDigits,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a `NonEmptyText` that is also at most `max` characters long.
    pub fn bounded(input: impl AsRef<str>, max: usize) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.chars().count() > max {
            return Err(TextError::TooLong { max });
        }
        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An email address that passed a structural check.
///
/// The check mirrors what a browser form library accepts: a single `@`, a non-empty local part,
/// and a dotted domain whose last label is at least two letters. No whitespace anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let value = input.as_ref().trim();
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(TextError::InvalidEmail);
        }

        let (local, domain) = value.split_once('@').ok_or(TextError::InvalidEmail)?;
        if local.is_empty() || domain.contains('@') {
            return Err(TextError::InvalidEmail);
        }
        if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
            return Err(TextError::InvalidEmail);
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 {
            return Err(TextError::InvalidEmail);
        }
        let labels_ok = labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        });
        let tld_ok = labels
            .last()
            .is_some_and(|tld| tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic()));
        if !labels_ok || !tld_ok {
            return Err(TextError::InvalidEmail);
        }

        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A phone number normalised to a fixed count of digits.
///
/// All whitespace is removed before checking, so `"020 7946 0018"` becomes `"02079460018"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Number of digits a stored phone number carries.
    pub const DIGITS: usize = 10;

    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let compact = strip_whitespace(input.as_ref());
        if compact.is_empty() {
            return Err(TextError::Empty);
        }
        if !compact.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::PhoneNotDigits);
        }
        if compact.len() != Self::DIGITS {
            return Err(TextError::PhoneLength {
                expected: Self::DIGITS,
                actual: compact.len(),
            });
        }
        Ok(Self(compact))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Removes every whitespace character from `input`.
pub fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

macro_rules! impl_text_traits {
    ($ty:ident, $ctor:path) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $ctor(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_text_traits!(NonEmptyText, NonEmptyText::new);
impl_text_traits!(EmailAddress, EmailAddress::parse);
impl_text_traits!(PhoneNumber, PhoneNumber::parse);
