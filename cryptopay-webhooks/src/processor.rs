//! Webhook processing entry point

use std::sync::Arc;

use cryptopay_api::{Credential, bind_update};
use tracing::{debug, warn};

use crate::receiver::{IncomingWebhook, WebhookSource};
use crate::registry::HandlerRegistry;
use crate::signature::{FailurePolicy, Verification, WebhookSignature};
use crate::Result;

/// Verifies incoming updates and dispatches them to registered handlers
///
/// The processor is cheap to clone and can be shared across concurrent
/// deliveries; the registry is read-only once the processor is built.
#[derive(Debug, Clone)]
pub struct WebhookProcessor {
    signature: WebhookSignature,
    registry: Arc<HandlerRegistry>,
    policy: FailurePolicy,
}

impl WebhookProcessor {
    /// Create a processor for the app identified by `token`
    pub fn new(token: &Credential, registry: impl Into<Arc<HandlerRegistry>>) -> Self {
        Self {
            signature: WebhookSignature::new(token),
            registry: registry.into(),
            policy: FailurePolicy::default(),
        }
    }

    /// Choose how verification failures are signalled
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The handler registry
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Verify one incoming update and dispatch it
    ///
    /// Returns `Ok(true)` once a verified update has been dispatched, even
    /// when no handler is registered for its type. A rejected update is never
    /// dispatched: it yields an error or `Ok(false)` depending on the failure
    /// policy.
    pub async fn process<S: WebhookSource>(&self, source: S) -> Result<bool> {
        let mut incoming = IncomingWebhook::new(source);
        let body = incoming.body().await?;
        let signature = incoming.signature();

        let verification = self.signature.verify(body.as_deref(), signature.as_deref());
        let Some(body) = body.filter(|_| verification.is_verified()) else {
            if let Verification::Rejected(reason) = verification {
                warn!(%reason, "Rejected webhook update");
            }
            return verification.into_result(self.policy);
        };

        let update = bind_update(&body)?;
        let handlers = self.registry.dispatch(&update)?;
        debug!(
            update_id = update.update_id,
            update_type = %update.update_type,
            handlers,
            "Processed webhook update"
        );
        Ok(true)
    }
}
