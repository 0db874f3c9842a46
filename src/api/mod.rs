mod client;
pub mod response;
mod time;

pub use client::{ApiClient, ApiError, DEFAULT_TIMEOUT};
pub use time::{parse_api_datetime, API_DATETIME_FORMAT};
