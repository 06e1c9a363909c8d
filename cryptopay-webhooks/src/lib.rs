//! Webhook updates for Crypto Pay
//!
//! Crypto Pay delivers events such as `invoice_paid` as signed HTTP
//! requests. This crate verifies the signature, binds the body to a typed
//! [`Update`](cryptopay_api::Update) and runs the handlers registered for
//! its type.
//!
//! # Features
//!
//! - **Signature Verification**: HMAC-SHA256 keyed by the SHA-256 of the API token
//! - **Failure Policy**: rejections surface as errors or as `false`
//! - **Handler Registry**: ordered handlers per update type, closures or named
//!   handlers resolved from a container
//! - **Request Sources**: `http::Request<Bytes>` or any [`WebhookSource`]
//!
//! # Example
//!
//! ```rust,no_run
//! use cryptopay_api::{Credential, Update};
//! use cryptopay_webhooks::{BufferedWebhook, HandlerRegistry, WebhookProcessor};
//!
//! # async fn run(body: Vec<u8>, signature: String) -> cryptopay_webhooks::Result<()> {
//! let mut registry = HandlerRegistry::new();
//! registry.on("invoice_paid", |update: &Update| {
//!     if let Some(invoice) = update.invoice() {
//!         println!("invoice {} paid", invoice.invoice_id);
//!     }
//!     Ok(())
//! });
//!
//! let processor = WebhookProcessor::new(&Credential::new("1234:AAA..."), registry);
//! processor
//!     .process(BufferedWebhook::new(body).with_signature(signature))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod processor;
mod receiver;
mod registry;
mod signature;

pub use error::{HandlerError, HandlerResult, Result, WebhookError, WebhookResult};
pub use processor::WebhookProcessor;
pub use receiver::{BufferedWebhook, IncomingWebhook, WebhookSource};
pub use registry::{Container, HandlerRegistry, UpdateHandler};
pub use signature::{
    FailurePolicy, RejectReason, SIGNATURE_HEADER, Verification, WebhookSignature,
    verify_webhook,
};
