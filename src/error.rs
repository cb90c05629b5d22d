use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt::Display;

/// Why an outbound call to the recommendation service failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    Connect,
    Status(u16),
    Other,
}

impl Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkErrorKind::Timeout => write!(f, "timeout"),
            NetworkErrorKind::Connect => write!(f, "connect"),
            NetworkErrorKind::Status(code) => write!(f, "status {}", code),
            NetworkErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Recommendation service unavailable ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("Malformed recommendation payload: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn network(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        AppError::Network {
            kind,
            message: message.into(),
        }
    }

    /// Oracle failures the caller may recover from with a fallback listing
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Network { .. } | AppError::Decode(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return AppError::Decode(e.to_string());
        }

        let kind = if e.is_timeout() {
            NetworkErrorKind::Timeout
        } else if e.is_connect() {
            NetworkErrorKind::Connect
        } else if let Some(status) = e.status() {
            NetworkErrorKind::Status(status.as_u16())
        } else {
            NetworkErrorKind::Other
        };

        AppError::network(kind, e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Network {
                kind: NetworkErrorKind::Timeout,
                ..
            } => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::Network { .. } | AppError::Decode(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let err = AppError::network(NetworkErrorKind::Status(503), "upstream down");
        assert_eq!(
            err.to_string(),
            "Recommendation service unavailable (status 503): upstream down"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(AppError::network(NetworkErrorKind::Timeout, "slow").is_recoverable());
        assert!(AppError::Decode("bad id".to_string()).is_recoverable());
        assert!(!AppError::NotFound("product 1".to_string()).is_recoverable());
        assert!(!AppError::Internal("boom".to_string()).is_recoverable());
    }

    #[test]
    fn test_status_mapping() {
        let timeout = AppError::network(NetworkErrorKind::Timeout, "slow").into_response();
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let refused = AppError::network(NetworkErrorKind::Connect, "refused").into_response();
        assert_eq!(refused.status(), StatusCode::BAD_GATEWAY);

        let decode = AppError::Decode("id".to_string()).into_response();
        assert_eq!(decode.status(), StatusCode::BAD_GATEWAY);

        let missing = AppError::NotFound("product 7".to_string()).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
