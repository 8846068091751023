use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not authorized, check the API token")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Server(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid base_url: {0}")]
    InvalidUrl(String),
}

/// Error bodies come as `{"detail": ...}` from the import service and
/// `{"message": ...}` from the proxy in front of it.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    detail: Option<Value>,
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        match self.detail {
            Some(Value::String(detail)) => Some(detail),
            Some(Value::Null) | None => self.message,
            Some(other) => Some(other.to_string()),
        }
    }
}

impl ClientError {
    pub(crate) fn from_status(status: StatusCode, body: Option<ErrorBody>) -> Self {
        let message = body
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("server error ({status})"));

        match status.as_u16() {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict(message),
            422 => Self::Validation(message),
            _ => Self::Server(message),
        }
    }
}
