use chrono::{DateTime, SecondsFormat};
use poem_openapi::Object;

/// Response model for health check endpoint
#[derive(Object, Debug)]
pub struct HealthResponse {
    /// "healthy", or "degraded" when the database does not answer
    pub status: String,

    /// "up" or "down"
    pub database: String,

    pub version: String,

    /// Timestamp of the health check (ISO 8601 format)
    pub timestamp: String,
}

/// Plain acknowledgement
#[derive(Object, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Page metadata returned with paginated listings
#[derive(Object, Debug, PartialEq)]
pub struct Pagination {
    pub page: u64,
    pub size: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, size: u64, total: u64) -> Self {
        Self {
            page,
            size,
            total,
            pages: total.div_ceil(size.max(1)),
        }
    }
}

/// Render unix seconds as RFC 3339 UTC with a `Z` suffix
pub fn format_timestamp(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

pub fn format_optional_timestamp(seconds: Option<i64>) -> Option<String> {
    seconds.map(format_timestamp)
}
