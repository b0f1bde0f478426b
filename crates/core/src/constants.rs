//! Constants used throughout the clinic client crates.

/// Backend used when neither the environment nor the command line names one.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "CLINIC_API_URL";

/// Environment variable holding the bearer token issued by the auth service.
pub const API_TOKEN_ENV: &str = "CLINIC_API_TOKEN";

/// Environment variable holding an optional per-request timeout, in seconds.
pub const HTTP_TIMEOUT_ENV: &str = "CLINIC_HTTP_TIMEOUT_SECS";

/// Shown in place of a joined field whose record has not resolved.
pub const LOADING_PLACEHOLDER: &str = "…";

/// Date format used when rendering dates on screen.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Date-time format used when rendering appointment times on screen.
pub const DISPLAY_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M";
