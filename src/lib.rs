// Crypto Pay - typed client and webhook pipeline for the Crypto Pay API
//
// The outbound client lives in `cryptopay-api`; webhook verification and
// dispatch live in `cryptopay-webhooks` behind the `webhooks` feature.

// Re-export the API client
pub use cryptopay_api::*;

// Re-export webhook handling
#[cfg(feature = "webhooks")]
pub use cryptopay_webhooks;

#[cfg(feature = "webhooks")]
pub use cryptopay_webhooks::{
    BufferedWebhook, Container, FailurePolicy, HandlerError, HandlerRegistry, HandlerResult,
    IncomingWebhook, RejectReason, SIGNATURE_HEADER, UpdateHandler, Verification, WebhookError,
    WebhookProcessor, WebhookResult, WebhookSignature, WebhookSource, verify_webhook,
};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ApiError,
        ApiResult,
        Asset,
        ClientConfig,
        CreateInvoiceRequest,
        CryptoPay,
        Credential,
        GetInvoicesRequest,
        Invoice,
        InvoiceStatus,
        Network,
        PaidButtonName,
        Transfer,
        TransferRequest,
        Update,
        UpdateType,
    };

    // Webhook types
    #[cfg(feature = "webhooks")]
    pub use crate::{
        FailurePolicy, HandlerRegistry, HandlerResult, UpdateHandler, WebhookError,
        WebhookProcessor,
    };
}
