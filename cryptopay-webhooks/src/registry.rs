//! Update handler registry
//!
//! Handlers are registered per update type and run in registration order
//! when a verified update of that type arrives.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cryptopay_api::{Update, UpdateType};
use tracing::debug;

use crate::{HandlerResult, Result, WebhookError};

/// Reacts to a verified webhook update
pub trait UpdateHandler: Send + Sync {
    /// Handle one update
    ///
    /// `container` is the registry's container, if one was attached.
    fn handle(&self, update: &Update, container: Option<&dyn Container>) -> HandlerResult;
}

impl<F> UpdateHandler for F
where
    F: Fn(&Update) -> HandlerResult + Send + Sync,
{
    fn handle(&self, update: &Update, _container: Option<&dyn Container>) -> HandlerResult {
        self(update)
    }
}

/// Resolves handlers by name
pub trait Container: Send + Sync {
    /// Look up a handler
    fn handler(&self, name: &str) -> Option<Arc<dyn UpdateHandler>>;
}

impl Container for HashMap<String, Arc<dyn UpdateHandler>> {
    fn handler(&self, name: &str) -> Option<Arc<dyn UpdateHandler>> {
        self.get(name).cloned()
    }
}

/// Handlers keyed by update type
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<UpdateType, Vec<Arc<dyn UpdateHandler>>>,
    container: Option<Arc<dyn Container>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a container for named handlers
    pub fn with_container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = Some(container);
        self
    }

    /// The attached container
    pub fn container(&self) -> Option<&dyn Container> {
        self.container.as_deref()
    }

    /// Register a handler for an update type
    pub fn register<H>(&mut self, update_type: impl Into<UpdateType>, handler: H) -> &mut Self
    where
        H: UpdateHandler + 'static,
    {
        self.push(update_type.into(), Arc::new(handler))
    }

    /// Register a closure for an update type
    pub fn on<F>(&mut self, update_type: impl Into<UpdateType>, handler: F) -> &mut Self
    where
        F: Fn(&Update) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(update_type, handler)
    }

    /// Register a handler resolved by name from the attached container
    pub fn register_named(
        &mut self,
        update_type: impl Into<UpdateType>,
        name: &str,
    ) -> Result<&mut Self> {
        let container = self.container.as_ref().ok_or(WebhookError::NoContainer)?;
        let handler = container
            .handler(name)
            .ok_or_else(|| WebhookError::HandlerNotFound(name.to_string()))?;
        Ok(self.push(update_type.into(), handler))
    }

    fn push(&mut self, update_type: UpdateType, handler: Arc<dyn UpdateHandler>) -> &mut Self {
        debug!(update_type = %update_type, "Registering webhook handler");
        self.handlers.entry(update_type).or_default().push(handler);
        self
    }

    /// Handlers for an update type, in registration order
    pub fn handlers_for(&self, update_type: &UpdateType) -> &[Arc<dyn UpdateHandler>] {
        self.handlers
            .get(update_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Whether no handlers are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every handler registered for the update's type
    ///
    /// Handlers run in registration order on the calling task. The first
    /// failing handler stops dispatch. Returns the number of handlers run.
    pub fn dispatch(&self, update: &Update) -> Result<usize> {
        let handlers = self.handlers_for(&update.update_type);
        debug!(
            update_type = %update.update_type,
            update_id = update.update_id,
            handlers = handlers.len(),
            "Dispatching webhook update"
        );

        for handler in handlers {
            handler
                .handle(update, self.container())
                .map_err(|source| WebhookError::Handler {
                    update_type: update.update_type.to_string(),
                    source,
                })?;
        }

        Ok(handlers.len())
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(update_type, handlers)| (update_type.as_str(), handlers.len()))
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .field("container", &self.container.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn update(update_type: &str) -> Update {
        Update {
            update_id: 1,
            update_type: UpdateType::from(update_type),
            request_date: "2024-01-01T00:00:00Z".to_string(),
            payload: None,
            raw_payload: None,
        }
    }

    /// Handler that appends its tag to a shared log
    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl UpdateHandler for Recorder {
        fn handle(&self, _update: &Update, _container: Option<&dyn Container>) -> HandlerResult {
            self.log.lock().unwrap().push(self.tag);
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry
            .register("invoice_paid", Recorder { tag: "h1", log: log.clone() })
            .register("invoice_paid", Recorder { tag: "h2", log: log.clone() });

        let ran = registry.dispatch(&update("invoice_paid")).unwrap();
        assert_eq!(ran, 2);
        assert_eq!(*log.lock().unwrap(), vec!["h1", "h2"]);
    }

    #[test]
    fn test_unregistered_type_is_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.register("invoice_paid", Recorder { tag: "h1", log: log.clone() });

        assert_eq!(registry.dispatch(&update("invoice_expired")).unwrap(), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_first_error_stops_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry
            .on("invoice_paid", |_update| Err("boom".into()))
            .register("invoice_paid", Recorder { tag: "h2", log: log.clone() });

        let err = registry.dispatch(&update("invoice_paid")).unwrap_err();
        assert!(matches!(err, WebhookError::Handler { ref update_type, .. } if update_type == "invoice_paid"));
        assert_eq!(err.to_string(), "Handler for invoice_paid failed: boom");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_named_handler_requires_container() {
        let mut registry = HandlerRegistry::new();
        let err = registry.register_named("invoice_paid", "listener").unwrap_err();
        assert!(matches!(err, WebhookError::NoContainer));
    }

    #[test]
    fn test_named_handler_from_container() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut container: HashMap<String, Arc<dyn UpdateHandler>> = HashMap::new();
        container.insert(
            "listener".to_string(),
            Arc::new(Recorder { tag: "named", log: log.clone() }),
        );

        let mut registry = HandlerRegistry::new().with_container(Arc::new(container));
        registry.register_named("invoice_paid", "listener").unwrap();

        assert!(matches!(
            registry.register_named("invoice_paid", "missing"),
            Err(WebhookError::HandlerNotFound(ref name)) if name == "missing"
        ));

        registry.dispatch(&update("invoice_paid")).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["named"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_handlers_receive_container() {
        struct NeedsContainer;

        impl UpdateHandler for NeedsContainer {
            fn handle(&self, _update: &Update, container: Option<&dyn Container>) -> HandlerResult {
                container
                    .and_then(|c| c.handler("helper"))
                    .map(|_| ())
                    .ok_or_else(|| "helper missing".into())
            }
        }

        let mut container: HashMap<String, Arc<dyn UpdateHandler>> = HashMap::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        container.insert("helper".to_string(), Arc::new(Recorder { tag: "helper", log }));

        let mut registry = HandlerRegistry::new().with_container(Arc::new(container));
        registry.register("invoice_paid", NeedsContainer);
        assert_eq!(registry.dispatch(&update("invoice_paid")).unwrap(), 1);

        let mut bare = HandlerRegistry::new();
        bare.register("invoice_paid", NeedsContainer);
        assert!(bare.dispatch(&update("invoice_paid")).is_err());
    }
}
