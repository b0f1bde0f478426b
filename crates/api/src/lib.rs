//! # Clinic API
//!
//! Everything that talks to the records backend:
//! - [`RecordsBackend`], the seam every page and submission goes through
//! - [`ApiClient`], its HTTP implementation over `reqwest`
//! - page-scoped fetch state ([`page`]) and the loaders for each screen ([`pages`])
//! - form submission and deletion ([`submit`])
//!
//! Pure client logic (joins, cascade, validation, views) lives in `clinic-core`.

pub mod backend;
pub mod client;
pub mod error;
pub mod page;
pub mod pages;
pub mod submit;

pub use backend::RecordsBackend;
pub use client::ApiClient;
pub use error::{ApiError, ApiResult, SubmitError, SubmitResult};
pub use page::{PageScope, Slice};
pub use pages::{Backend, FormMode, Page};
