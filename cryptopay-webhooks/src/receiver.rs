//! Access to the raw body and headers of an incoming webhook request

use std::collections::HashMap;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;

use crate::signature::SIGNATURE_HEADER;

/// Something an incoming webhook can be read from
///
/// Implemented for `http::Request<Bytes>`, so any framework that exposes
/// `http` types can hand requests over directly, and for [`BufferedWebhook`].
#[async_trait]
pub trait WebhookSource: Send {
    /// Read the full request body
    async fn read_body(&mut self) -> io::Result<Bytes>;

    /// Value of a header, matched case-insensitively
    fn header(&self, name: &str) -> Option<String>;
}

#[async_trait]
impl WebhookSource for http::Request<Bytes> {
    async fn read_body(&mut self) -> io::Result<Bytes> {
        Ok(std::mem::take(self.body_mut()))
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }
}

/// A request already held in memory
#[derive(Debug, Clone, Default)]
pub struct BufferedWebhook {
    headers: HashMap<String, String>,
    body: Bytes,
}

impl BufferedWebhook {
    /// Create from a body without headers
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add the signature header
    pub fn with_signature(self, signature: impl Into<String>) -> Self {
        self.with_header(SIGNATURE_HEADER, signature)
    }
}

#[async_trait]
impl WebhookSource for BufferedWebhook {
    async fn read_body(&mut self) -> io::Result<Bytes> {
        Ok(self.body.clone())
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }
}

/// An incoming webhook whose body is read from the source at most once
pub struct IncomingWebhook<S> {
    source: S,
    body: Option<Bytes>,
}

impl<S: WebhookSource> IncomingWebhook<S> {
    /// Wrap a source
    pub fn new(source: S) -> Self {
        Self {
            source,
            body: None,
        }
    }

    /// The raw body, or `None` when the request had no body
    ///
    /// The first call reads the source; later calls return the cached bytes.
    pub async fn body(&mut self) -> io::Result<Option<Bytes>> {
        if self.body.is_none() {
            self.body = Some(self.source.read_body().await?);
        }
        Ok(self.body.clone().filter(|body| !body.is_empty()))
    }

    /// Value of the signature header
    pub fn signature(&self) -> Option<String> {
        self.source.header(SIGNATURE_HEADER)
    }

    /// Value of any header
    pub fn header(&self, name: &str) -> Option<String> {
        self.source.header(name)
    }

    /// The wrapped source
    pub fn into_inner(self) -> S {
        self.source
    }
}
