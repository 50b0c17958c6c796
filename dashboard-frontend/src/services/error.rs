use serde::Deserialize;
use thiserror::Error;

/// Failure of one call to the dashboard API.
///
/// `status` is the HTTP status, or 0 when no response was received.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code} ({status}): {message}")]
pub struct ApiError {
    pub code: String,
    pub status: u16,
    pub message: String,
    pub request_id: Option<String>,
    pub endpoint: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// Error body returned by the backend.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    details: Option<serde_json::Value>,
    #[serde(alias = "request_id")]
    request_id: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            status,
            message: message.into(),
            request_id: None,
            endpoint: None,
            details: None,
        }
    }

    /// Build from a non-2xx response. Bodies that are not the backend's
    /// error shape still produce an error keyed by the status code.
    pub fn from_response(
        status: u16,
        body: &[u8],
        request_id: Option<String>,
        endpoint: &str,
    ) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        let message = parsed
            .message
            .filter(|m| !m.is_empty())
            .or_else(|| {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "An error occurred".to_string());

        Self {
            code: parsed.error.unwrap_or_else(|| format!("HTTP_{}", status)),
            status,
            message,
            request_id: parsed.request_id.or(request_id),
            endpoint: Some(endpoint.to_string()),
            details: parsed.details,
        }
    }

    pub fn network(endpoint: &str, err: impl std::fmt::Display) -> Self {
        Self {
            endpoint: Some(endpoint.to_string()),
            ..Self::new("NETWORK_ERROR", 0, err.to_string())
        }
    }

    pub fn timeout(endpoint: &str) -> Self {
        Self {
            endpoint: Some(endpoint.to_string()),
            ..Self::new("TIMEOUT", 0, "The request timed out")
        }
    }

    /// A 2xx response whose body did not match the expected shape.
    pub fn decode(endpoint: &str, err: impl std::fmt::Display) -> Self {
        Self {
            endpoint: Some(endpoint.to_string()),
            ..Self::new("INVALID_RESPONSE", 0, err.to_string())
        }
    }

    /// Message suitable for a toast or an inline empty-state.
    pub fn user_message(&self) -> String {
        match self.code.as_str() {
            "UNAUTHORIZED" | "TOKEN_EXPIRED" => {
                "Your session has expired. Please sign in again.".to_string()
            }
            "FORBIDDEN" => "You do not have permission to perform this action.".to_string(),
            "NOT_FOUND" => "The requested resource was not found.".to_string(),
            "VALIDATION_ERROR" => "Please check your input and try again.".to_string(),
            "RATE_LIMIT_EXCEEDED" => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            "SERVER_ERROR" => "A server error occurred. Please try again later.".to_string(),
            "NETWORK_ERROR" => {
                "Network connection failed. Please check your internet connection.".to_string()
            }
            _ => self.message.clone(),
        }
    }

    /// Whether a manual retry has a chance of succeeding. Nothing in this
    /// crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.status >= 500
            || self.status == 429
            || self.code == "NETWORK_ERROR"
            || self.code == "TIMEOUT"
    }
}

impl From<ApiError> for service_core::error::AppError {
    fn from(err: ApiError) -> Self {
        service_core::error::AppError::from_upstream(err.status, err.user_message())
    }
}
