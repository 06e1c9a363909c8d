//! Outbound HTTP transport

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::error::TransportError;

/// A single outbound request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Full method URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Query parameters
    pub query: Vec<(String, String)>,
}

impl TransportRequest {
    /// A GET request
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
        }
    }

    /// A POST request
    pub fn post(url: Url) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(url)
        }
    }

    /// Add a header
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the query parameters
    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// URL with the query string applied
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }
}

/// Capability to issue a request and return the response body
///
/// Implementations return the body for any HTTP status the server answered
/// with; only failures to obtain a body are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request
    async fn issue(&self, request: TransportRequest) -> Result<Bytes, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn issue(&self, request: TransportRequest) -> Result<Bytes, TransportError> {
        (**self).issue(request).await
    }
}

/// [`Transport`] backed by `reqwest`
#[cfg(feature = "reqwest")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestTransport {
    /// Create a transport with a default `reqwest` client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl Transport for ReqwestTransport {
    async fn issue(&self, request: TransportRequest) -> Result<Bytes, TransportError> {
        let url = request.full_url();
        let response = self
            .client
            .request(request.method, url)
            .headers(request.headers)
            .send()
            .await?;

        tracing::debug!(status = response.status().as_u16(), "Received API response");
        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_encodes_query() {
        let request = TransportRequest::get(Url::parse("https://pay.crypt.bot/api/getInvoices").unwrap())
            .query(vec![
                ("asset".into(), "TON".into()),
                ("description".into(), "a b&c".into()),
            ]);
        assert_eq!(
            request.full_url().as_str(),
            "https://pay.crypt.bot/api/getInvoices?asset=TON&description=a+b%26c"
        );
    }

    #[test]
    fn test_full_url_without_query() {
        let request = TransportRequest::post(Url::parse("https://pay.crypt.bot/api/getMe").unwrap());
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.full_url().as_str(), "https://pay.crypt.bot/api/getMe");
    }

    #[cfg(feature = "reqwest")]
    #[tokio::test]
    async fn test_reqwest_transport_returns_body_for_error_status() {
        use wiremock::matchers::{header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/getMe"))
            .and(header("Crypto-Pay-API-Token", "secret"))
            .and(query_param("x", "1"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"ok":false}"#))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/api/getMe", server.uri())).unwrap();
        let request = TransportRequest::get(url)
            .header(
                HeaderName::from_static("crypto-pay-api-token"),
                HeaderValue::from_static("secret"),
            )
            .query(vec![("x".into(), "1".into())]);

        let body = ReqwestTransport::new().issue(request).await.unwrap();
        assert_eq!(&body[..], br#"{"ok":false}"#);
    }
}
