use thiserror::Error;

/// Errors surfaced by backend adapters.
///
/// Authorization failures are kept apart from transport failures: callers
/// retry some of the latter but must never retry the former.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not authorized (status {status})")]
    Unauthorized { status: u16 },

    #[error("not found")]
    NotFound,

    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Network failures and server-side (5xx) errors.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short human-readable reason, preferring the server's own message.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Status { message, .. } if !message.trim().is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_not_transient() {
        let err = ApiError::Unauthorized { status: 403 };
        assert!(err.is_unauthorized());
        assert!(!err.is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let server = ApiError::Status {
            status: 503,
            message: "unavailable".into(),
        };
        let client = ApiError::Status {
            status: 422,
            message: "bad".into(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(ApiError::Transport("reset".into()).is_transient());
    }

    #[test]
    fn reason_prefers_server_message() {
        let err = ApiError::Status {
            status: 400,
            message: "Option C is required".into(),
        };
        assert_eq!(err.reason(), "Option C is required");
        assert_eq!(ApiError::NotFound.reason(), "not found");
    }
}
