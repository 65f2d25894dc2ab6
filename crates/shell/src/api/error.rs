//! Backend API errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Outlay backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code of the response.
        status: StatusCode,
        /// Message extracted from the response body, or a generic fallback.
        message: String,
    },

    /// A 2xx response body could not be decoded.
    #[error("invalid response body: {0}")]
    Parse(String),

    /// The backend returned no content where a body was expected.
    #[error("backend returned an empty response")]
    EmptyBody,
}

impl ApiError {
    /// HTTP status of the failed request, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_display() {
        let err = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: "request failed with status 502".to_string(),
        };
        assert_eq!(err.to_string(), "request failed with status 502");
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_non_status_errors_have_no_status() {
        assert_eq!(ApiError::EmptyBody.status(), None);
        assert_eq!(ApiError::Parse("boom".to_string()).status(), None);
    }
}
