//! Error types for action dispatch
//!
//! Library code returns [`ActionError`]; the binary wraps it with `anyhow`
//! context before printing.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, ActionError>;

/// Errors surfaced by the action dispatcher
#[derive(Error, Debug)]
pub enum ActionError {
    /// Method name has no handler
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// Required parameter absent or not a string
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    /// Parameter present but unusable
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    /// OS name that does not map to a public image family
    #[error("Unknown operating system image: {0}")]
    UnknownImage(String),

    /// Credential resolution or token minting failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] gcp_auth::Error),

    /// The provider rejected the call. `error` is the provider's error object as returned.
    #[error("API request failed: {status}: {}", provider_message(.error))]
    Provider { status: u16, error: Value },

    /// A long-running operation finished with errors
    #[error("Operation failed: {}", operation_message(.0))]
    OperationFailed(Value),

    /// Instance has no NAT IP on its first access config
    #[error("No external IP")]
    NoExternalIp,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ActionError {
    /// Returns true for 404 responses from the provider
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ActionError::Provider { status: 404, .. })
    }

    /// Returns true for 401/403 responses from the provider
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ActionError::Provider { status: 401 | 403, .. })
    }

    /// HTTP status of a provider rejection, if that is what this is
    pub fn status(&self) -> Option<u16> {
        match self {
            ActionError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn provider_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.as_str().map(str::to_string))
        .unwrap_or_else(|| "no details".to_string())
}

// Operation errors look like {"errors": [{"code": .., "message": ..}, ..]}
fn operation_message(error: &Value) -> String {
    let messages: Vec<&str> = error
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if messages.is_empty() {
        error.to_string()
    } else {
        messages.join("; ")
    }
}
