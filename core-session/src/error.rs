use bridge_traits::http::HttpResponse;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

/// Fallback shown when a 400 body carries no `errors` list.
pub const MSG_INVALID_REQUEST: &str = "Invalid request.";

/// An HTTP-level failure as the server sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ErrorResponse {
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            body: response.body.clone(),
        }
    }

    /// Body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// The body's `message` field.
    pub fn message(&self) -> Option<String> {
        self.json()?
            .get("message")?
            .as_str()
            .map(str::to_string)
    }

    /// The body's `errors` list; non-string entries are rendered as JSON.
    pub fn validation_errors(&self) -> Option<Vec<String>> {
        let body = self.json()?;
        let errors = body.get("errors")?.as_array()?;
        Some(
            errors
                .iter()
                .map(|entry| match entry {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    /// No response arrived. Carries no detail on purpose: callers only learn
    /// that the backend is unreachable.
    #[error("Server unavailable.")]
    Connectivity,

    #[error("{message}")]
    Validation {
        message: String,
        response: ErrorResponse,
    },

    #[error("Unauthorized (HTTP {})", .response.status)]
    Unauthorized { response: ErrorResponse },

    #[error("Forbidden (HTTP {})", .response.status)]
    Forbidden { response: ErrorResponse },

    #[error("Server error (HTTP {})", .response.status)]
    Server { response: ErrorResponse },

    #[error("Request failed with HTTP {}", .response.status)]
    Unclassified { response: ErrorResponse },

    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Credential storage failed: {0}")]
    Storage(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Too many redirects while navigating to '{requested}'")]
    RedirectLoop { requested: String },
}

impl SessionError {
    /// Classify a non-success response by status code.
    pub fn from_response(response: &HttpResponse) -> Self {
        let response = ErrorResponse::from_response(response);
        match response.status {
            400 => {
                let message = response
                    .validation_errors()
                    .filter(|errors| !errors.is_empty())
                    .map(|errors| errors.join("\n"))
                    .unwrap_or_else(|| MSG_INVALID_REQUEST.to_string());
                SessionError::Validation { message, response }
            }
            401 => SessionError::Unauthorized { response },
            403 => SessionError::Forbidden { response },
            status if status >= 500 => SessionError::Server { response },
            _ => SessionError::Unclassified { response },
        }
    }

    /// The server response behind an HTTP-level error.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            SessionError::Validation { response, .. }
            | SessionError::Unauthorized { response }
            | SessionError::Forbidden { response }
            | SessionError::Server { response }
            | SessionError::Unclassified { response } => Some(response),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, SessionError::Connectivity)
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, body.to_string())
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = SessionError::from_response(&response(400, r#"{"errors":["A","B"]}"#));
        assert_eq!(err.to_string(), "A\nB");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_validation_without_errors_list_is_generic() {
        let err = SessionError::from_response(&response(400, r#"{"message":"nope"}"#));
        assert_eq!(err.to_string(), MSG_INVALID_REQUEST);

        let err = SessionError::from_response(&response(400, "<html>"));
        assert_eq!(err.to_string(), MSG_INVALID_REQUEST);
    }

    #[test]
    fn test_non_string_validation_entries() {
        let err =
            SessionError::from_response(&response(400, r#"{"errors":["cpf",{"field":"cnpj"}]}"#));
        assert_eq!(err.to_string(), "cpf\n{\"field\":\"cnpj\"}");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            SessionError::from_response(&response(401, "")),
            SessionError::Unauthorized { .. }
        ));
        assert!(matches!(
            SessionError::from_response(&response(403, "")),
            SessionError::Forbidden { .. }
        ));
        assert!(matches!(
            SessionError::from_response(&response(503, "")),
            SessionError::Server { .. }
        ));
        assert!(matches!(
            SessionError::from_response(&response(404, "")),
            SessionError::Unclassified { .. }
        ));
    }

    #[test]
    fn test_message_field() {
        let body = ErrorResponse {
            status: 409,
            body: Bytes::from_static(br#"{"message":"CPF already registered"}"#),
        };
        assert_eq!(body.message().as_deref(), Some("CPF already registered"));
    }

    #[test]
    fn test_connectivity_error_is_opaque() {
        let err = SessionError::Connectivity;
        assert_eq!(err.to_string(), "Server unavailable.");
        assert!(err.response().is_none());
        assert!(err.is_connectivity());
    }
}
