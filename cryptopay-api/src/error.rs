//! Error types for the Crypto Pay client

use serde::Serialize;
use thiserror::Error;

use crate::binder::{Bind, BindResult, Fields};

/// Errors raised by the outbound API side of the client
#[derive(Error, Debug)]
pub enum ApiError {
    /// The transport could not complete the request
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response was valid JSON but the envelope did not report success
    #[error("Unexpected response: {body}")]
    Rejected {
        /// Raw response body, kept for diagnostics
        body: String,
        /// The envelope's `error` object, when it carried one
        error: Option<ApiErrorDetail>,
    },

    /// The response body was not valid JSON
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The `result` could not be bound into the expected record
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    /// Method parameters could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Whether the API itself answered with a failure envelope
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Error detail reported by the API, if any
    pub fn detail(&self) -> Option<&ApiErrorDetail> {
        match self {
            Self::Rejected { error, .. } => error.as_ref(),
            _ => None,
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// The `error` object of a failed response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorDetail {
    /// Numeric error code (mirrors the HTTP status)
    pub code: Option<i64>,
    /// Machine-readable name, e.g. `UNAUTHORIZED`
    pub name: Option<String>,
}

impl Bind for ApiErrorDetail {
    fn bind(fields: &Fields<'_>) -> BindResult<Self> {
        Ok(Self {
            code: fields.optional("code")?,
            name: fields.optional("name")?,
        })
    }
}

/// Failure to construct a typed record from an untyped mapping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A required field had no key (or a `null` value)
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A field was present but could not be converted
    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// The input was not a JSON object
    #[error("Expected an object, found {found}")]
    NotAnObject { found: &'static str },
}

impl BindingError {
    /// Name of the offending field, if the error concerns one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field } | Self::InvalidField { field, .. } => Some(field),
            Self::NotAnObject { .. } => None,
        }
    }

    /// Prefix the field path with the parent field the error surfaced under
    pub(crate) fn within(self, parent: &str) -> Self {
        match self {
            Self::MissingField { field } => Self::MissingField {
                field: format!("{}.{}", parent, field),
            },
            Self::InvalidField { field, reason } => Self::InvalidField {
                field: format!("{}.{}", parent, field),
                reason,
            },
            Self::NotAnObject { found } => Self::InvalidField {
                field: parent.to_string(),
                reason: format!("expected object, found {}", found),
            },
        }
    }
}

/// Errors surfaced by a [`Transport`](crate::Transport) implementation
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, TLS or protocol failure
    #[error("Request failed: {0}")]
    Request(String),

    /// The transport gave up waiting for a response
    #[error("Request timed out")]
    Timeout,

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting was not provided
    #[error("Configuration key not found: {0}")]
    MissingKey(String),

    /// A setting was provided with an unusable value
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// The configuration source could not be read or parsed
    #[error("Failed to load configuration: {0}")]
    LoadError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_error_within_prefixes_path() {
        let err = BindingError::MissingField {
            field: "invoice_id".into(),
        }
        .within("payload");
        assert_eq!(err.field(), Some("payload.invoice_id"));
        assert_eq!(err.to_string(), "Missing required field: payload.invoice_id");
    }

    #[test]
    fn test_not_an_object_within_becomes_invalid_field() {
        let err = BindingError::NotAnObject { found: "string" }.within("payload");
        assert_eq!(
            err,
            BindingError::InvalidField {
                field: "payload".into(),
                reason: "expected object, found string".into(),
            }
        );
    }

    #[test]
    fn test_rejected_detail() {
        let err = ApiError::Rejected {
            body: r#"{"ok":false}"#.into(),
            error: Some(ApiErrorDetail {
                code: Some(401),
                name: Some("UNAUTHORIZED".into()),
            }),
        };
        assert!(err.is_rejected());
        assert_eq!(err.detail().and_then(|d| d.code), Some(401));
        assert!(err.to_string().contains(r#"{"ok":false}"#));
    }
}
