//! Input validation utilities.
//!
//! This module contains functions for validating configuration inputs before they are used to
//! build a client.

use crate::{ClinicError, ClinicResult};

/// Validates and normalises the backend base URL.
///
/// The URL is used as a prefix for every resource path (`{base}/appointments/7`), so it must:
/// - be non-empty after trimming
/// - use the `http` or `https` scheme and name a host
/// - contain no whitespace, query or fragment
///
/// Trailing slashes are removed so that joining never produces `//`.
///
/// # Errors
///
/// Returns [`ClinicError::InvalidBaseUrl`] if the URL is unusable.
pub fn validate_api_base_url(url: &str) -> ClinicResult<String> {
    let trimmed = url.trim();
    let invalid = |reason| ClinicError::InvalidBaseUrl {
        url: url.to_owned(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("cannot be empty"));
    }

    if trimmed.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| invalid("scheme must be http or https"))?;

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Err(invalid("must include a host"));
    }

    if rest.contains(['?', '#']) {
        return Err(invalid("must not contain a query or fragment"));
    }

    Ok(trimmed.trim_end_matches('/').to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        assert_eq!(
            validate_api_base_url(" http://localhost:3000/ ").expect("valid"),
            "http://localhost:3000"
        );
        assert_eq!(
            validate_api_base_url("https://clinic.example.ie/api//").expect("valid"),
            "https://clinic.example.ie/api"
        );
    }

    #[test]
    fn test_rejects_unusable_urls() {
        for bad in ["", "   ", "ftp://host", "localhost:3000", "http://", "http://a b", "http://h/?x=1"] {
            assert!(
                matches!(validate_api_base_url(bad), Err(ClinicError::InvalidBaseUrl { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
