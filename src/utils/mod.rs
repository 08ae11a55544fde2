//! Utility modules supporting the pipeline.
//!
//! - [`HttpClient`]: HTTP client with explicit timeouts
//! - [`title_filename`]: turn a citation title into a safe `<title>.pdf`
//! - [`ValidationError`]: errors from filename validation

mod http;
mod validate;

pub use http::{default_user_agent, HttpClient};
pub use validate::{title_filename, ValidationError};
