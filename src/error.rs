//! Error types for the sippy client library.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The API answered with a non-200 status.
    #[error("API server returned {status}")]
    Api { status: u16 },

    /// Transport or decode failure. Carries the attempted URL so the user
    /// can retry it by hand.
    #[error("API call failed: {url}\n{message}")]
    Http { url: String, message: String },

    /// The in-flight request was aborted by the user. Not a failure; callers
    /// render the cancelled table instead of an error.
    #[error("request cancelled")]
    Cancelled,

    #[error("invalid {field} value: {value:?}")]
    InvalidParam { field: &'static str, value: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub(crate) fn http(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            message: message.into(),
        }
    }
}
