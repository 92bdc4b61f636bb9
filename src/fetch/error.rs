use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Failure of a backend call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// No response within the request ceiling.
    #[error("search timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    /// The backend answered with a non-success status.
    #[error("search service returned HTTP {code}")]
    Status { code: u16 },

    /// The request could not be sent or the connection failed.
    #[error("could not reach the search service: {0}")]
    Transport(String),

    /// The backend answered with a body we could not parse.
    #[error("unexpected response from the search service: {0}")]
    Decode(String),
}

/// The only distinction the UI error path cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorKind {
    Timeout,
    Other,
}

impl FetchError {
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Timeout { .. } => FetchErrorKind::Timeout,
            _ => FetchErrorKind::Other,
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind(), FetchErrorKind::Timeout)
    }
}
