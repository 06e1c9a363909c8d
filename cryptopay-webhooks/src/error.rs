//! Error types for webhook processing

use cryptopay_api::ApiError;
use thiserror::Error;

use crate::signature::RejectReason;

/// Error returned by an update handler
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by an update handler
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Errors that can occur while processing a webhook update
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The update failed authenticity verification
    #[error("Webhook data not verified: {0}")]
    Verification(RejectReason),

    /// The verified body is not a valid update
    #[error("Invalid update: {0}")]
    InvalidUpdate(#[from] ApiError),

    /// Reading the request body failed
    #[error("Failed to read request body: {0}")]
    Body(#[from] std::io::Error),

    /// A handler failed; later handlers for the update did not run
    #[error("Handler for {update_type} failed: {source}")]
    Handler {
        update_type: String,
        #[source]
        source: HandlerError,
    },

    /// A named handler was registered without a container to resolve it
    #[error("Named handlers require a container; call with_container first")]
    NoContainer,

    /// The container has no handler under the given name
    #[error("Handler not found in container: {0}")]
    HandlerNotFound(String),
}

impl WebhookError {
    /// Whether the update was rejected at verification
    pub fn is_verification(&self) -> bool {
        matches!(self, Self::Verification(_))
    }
}

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Alias of [`Result`] for use alongside other crates' result types
pub type WebhookResult<T> = Result<T>;
