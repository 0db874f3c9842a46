//! Client library for the AllClients CRM HTTP API.
//!
//! The API is a set of named methods (`AddContact`, `GetContacts`, …), each
//! reached by POSTing form-encoded fields to `{endpoint}{Method}.aspx` and
//! answered with a small XML document. [`ApiClient::invoke`] performs one such
//! call; the [`api::response`] module interprets the result, separating
//! transport and parse failures from business-level `<error>` responses.

pub mod api;
pub mod config;

pub use api::response;
pub use api::{ApiClient, ApiError};
pub use config::Config;

/// The standard AllClients API endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://www.allclients.com/api/2/";
