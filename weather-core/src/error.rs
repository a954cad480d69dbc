use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a failed lookup.
///
/// Every kind is terminal for the request that produced it; nothing at this
/// layer retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Network,
    Parse,
    NotFound,
    Unauthorized,
    RateLimit,
    Data,
    /// Any unmapped non-success HTTP status.
    Http(u16),
}

impl ErrorKind {
    /// Message shown to the user in the inline error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => {
                "City not found. Try a different spelling or include country (e.g., \"Paris, FR\")."
            }
            ErrorKind::Unauthorized => "Invalid or missing API key.",
            ErrorKind::RateLimit => "Rate limit reached. Try again later.",
            ErrorKind::Network => "Network error. Check your connection.",
            ErrorKind::Data => "No forecast data for this location.",
            ErrorKind::Validation => "City name is required.",
            ErrorKind::Parse | ErrorKind::Http(_) => "Something went wrong.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => f.write_str("VALIDATION"),
            ErrorKind::Network => f.write_str("NETWORK"),
            ErrorKind::Parse => f.write_str("PARSE"),
            ErrorKind::NotFound => f.write_str("NOT_FOUND"),
            ErrorKind::Unauthorized => f.write_str("UNAUTHORIZED"),
            ErrorKind::RateLimit => f.write_str("RATE_LIMIT"),
            ErrorKind::Data => f.write_str("DATA"),
            ErrorKind::Http(status) => write!(f, "HTTP_{status}"),
        }
    }
}

/// HTTP status and weatherapi.com error code attached to provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDetail {
    pub status: u16,
    pub provider_code: Option<i64>,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct WeatherError {
    kind: ErrorKind,
    message: String,
    detail: Option<ErrorDetail>,
    #[source]
    source: Option<BoxError>,
}

impl WeatherError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), detail: None, source: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<ErrorDetail> {
        self.detail
    }
}
