use clinic_core::FormError;
use clinic_core::Notice;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    #[error("unexpected response from {path} at {field}: {message}")]
    Decode {
        path: String,
        field: String,
        message: String,
    },
    #[error("failed to encode request body for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of the response, if one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Why a form submission did not go through.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Blocked before any request was made.
    #[error(transparent)]
    Invalid(#[from] FormError),
    /// The backend rejected or never received the write.
    #[error("{notice}")]
    Request {
        notice: Notice,
        #[source]
        source: ApiError,
    },
}

pub type SubmitResult<T> = std::result::Result<T, SubmitError>;
