//! The Crypto Pay API client

use std::sync::Arc;
use std::time::Instant;

use http::{HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::binder::{bind, bind_list};
use crate::config::ClientConfig;
use crate::envelope::{decode_envelope, decode_items};
use crate::error::{ApiResult, ConfigError};
use crate::methods::{
    ApiMethod, CreateInvoiceRequest, GetInvoicesRequest, Params, TransferRequest, encode_params,
};
use crate::transport::{Transport, TransportRequest};
use crate::types::{AppInfo, Balance, Currency, ExchangeRate, Invoice, Transfer};

#[cfg(feature = "reqwest")]
use crate::transport::ReqwestTransport;

/// Header carrying the API token on every request
pub const TOKEN_HEADER: &str = "Crypto-Pay-API-Token";

/// Client for the Crypto Pay API
///
/// Each method performs exactly one request through the transport. Retries
/// are left to the caller; transfers stay idempotent through their spend ID.
pub struct CryptoPay<T: Transport> {
    transport: Arc<T>,
    config: Arc<ClientConfig>,
    token_header: HeaderValue,
}

#[cfg(feature = "reqwest")]
impl CryptoPay<ReqwestTransport> {
    /// Create a client using `reqwest`
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        Self::with_transport(config, ReqwestTransport::new())
    }

    /// Create a client configured from `CRYPTO_PAY_*` environment variables
    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> CryptoPay<T> {
    /// Create a client over a custom transport
    pub fn with_transport(config: ClientConfig, transport: T) -> ApiResult<Self> {
        let mut token_header =
            HeaderValue::from_str(config.token().expose()).map_err(|_| ConfigError::InvalidValue {
                key: "token".to_string(),
                reason: "contains characters not allowed in an HTTP header".to_string(),
            })?;
        token_header.set_sensitive(true);

        Ok(Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            token_header,
        })
    }

    /// The client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Test the token; returns basic information about the app
    pub async fn get_me(&self) -> ApiResult<AppInfo> {
        let result = self.request("getMe", Params::new()).await?;
        Ok(bind(&result)?)
    }

    /// Create a new invoice
    pub async fn create_invoice(&self, request: &CreateInvoiceRequest) -> ApiResult<Invoice> {
        let result = self.call(request).await?;
        Ok(bind(&result)?)
    }

    /// Get invoices of the app, optionally filtered
    pub async fn get_invoices(
        &self,
        request: Option<&GetInvoicesRequest>,
    ) -> ApiResult<Vec<Invoice>> {
        let params = match request {
            Some(request) => encode_params(request)?,
            None => Params::new(),
        };
        let result = self.request(GetInvoicesRequest::NAME, params).await?;
        decode_items(&result)
    }

    /// Send coins from the app balance to a user
    pub async fn transfer(&self, request: &TransferRequest) -> ApiResult<Transfer> {
        let result = self.call(request).await?;
        Ok(bind(&result)?)
    }

    /// Balance of the app per asset
    pub async fn get_balance(&self) -> ApiResult<Vec<Balance>> {
        let result = self.request("getBalance", Params::new()).await?;
        Ok(bind_list(&result)?)
    }

    /// Exchange rates of supported currencies
    pub async fn get_exchange_rates(&self) -> ApiResult<Vec<ExchangeRate>> {
        let result = self.request("getExchangeRates", Params::new()).await?;
        Ok(bind_list(&result)?)
    }

    /// Supported currencies
    pub async fn get_currencies(&self) -> ApiResult<Vec<Currency>> {
        let result = self.request("getCurrencies", Params::new()).await?;
        Ok(bind_list(&result)?)
    }

    /// Call a method with encoded parameters and return the raw `result`
    pub async fn call<M: ApiMethod>(&self, method: &M) -> ApiResult<Value> {
        let params = encode_params(method)?;
        self.request(M::NAME, params).await
    }

    /// Issue one request to `method` and decode the envelope
    pub async fn request(&self, method: &str, params: Params) -> ApiResult<Value> {
        let url = self.config.method_url(method)?;
        let request = TransportRequest::get(url)
            .header(
                HeaderName::from_static("crypto-pay-api-token"),
                self.token_header.clone(),
            )
            .query(params.to_query());

        debug!(method, params = params.len(), "Calling Crypto Pay API");
        let started = Instant::now();
        let body = self.transport.issue(request).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match decode_envelope(&body) {
            Ok(result) => {
                debug!(method, elapsed_ms, "Crypto Pay API call succeeded");
                Ok(result)
            }
            Err(err) => {
                warn!(method, elapsed_ms, error = %err, "Crypto Pay API call failed");
                Err(err)
            }
        }
    }
}

impl<T: Transport> Clone for CryptoPay<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            token_header: self.token_header.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, TransportError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    /// Transport answering every request with the same body
    struct CannedTransport {
        body: &'static str,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl CannedTransport {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn issue(&self, request: TransportRequest) -> Result<Bytes, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(Bytes::from_static(self.body.as_bytes()))
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn issue(&self, _request: TransportRequest) -> Result<Bytes, TransportError> {
            Err(TransportError::Timeout)
        }
    }

    fn client(body: &'static str) -> CryptoPay<CannedTransport> {
        CryptoPay::with_transport(ClientConfig::testnet("1234:token"), CannedTransport::new(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_invoice_sends_encoded_params() {
        let client = client(r#"{"ok":true,"result":{"invoice_id":5,"status":"active","amount":"10"}}"#);
        let request = CreateInvoiceRequest::new("TON", "10").allow_comments(false);

        let invoice = client.create_invoice(&request).await.unwrap();
        assert_eq!(invoice.invoice_id, 5);

        let seen = client.transport().seen.lock().unwrap();
        let sent = &seen[0];
        assert_eq!(
            sent.url.as_str(),
            "https://testnet-pay.crypt.bot/api/createInvoice"
        );
        assert_eq!(
            sent.headers.get(TOKEN_HEADER).unwrap().to_str().unwrap(),
            "1234:token"
        );
        assert!(sent.headers.get(TOKEN_HEADER).unwrap().is_sensitive());
        assert!(sent.query.contains(&("allow_comments".into(), "false".into())));
        assert!(!sent.query.iter().any(|(name, _)| name == "description"));
    }

    #[tokio::test]
    async fn test_get_invoices_reads_items() {
        let client = client(
            r#"{"ok":true,"result":{"items":[{"invoice_id":1,"status":"paid"},{"invoice_id":2,"status":"expired"}]}}"#,
        );
        let invoices = client.get_invoices(None).await.unwrap();
        assert_eq!(invoices.len(), 2);
        assert!(client.transport().seen.lock().unwrap()[0].query.is_empty());
    }

    #[tokio::test]
    async fn test_get_invoices_without_items_is_empty() {
        let client = client(r#"{"ok":true,"result":{}}"#);
        let request = GetInvoicesRequest::new().status("paid");
        assert!(client.get_invoices(Some(&request)).await.unwrap().is_empty());
    }

    #[test]
    fn test_rejected_envelope() {
        let client = client(r#"{"ok":false,"error":{"code":400,"name":"AMOUNT_TOO_SMALL"}}"#);
        let err = tokio_test::block_on(client.get_me()).unwrap_err();
        assert_eq!(
            err.detail().and_then(|d| d.name.as_deref()),
            Some("AMOUNT_TOO_SMALL")
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct_from_rejection() {
        let client =
            CryptoPay::with_transport(ClientConfig::new("token"), FailingTransport).unwrap();
        let err = client.get_balance().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Timeout)));
        assert!(!err.is_rejected());
    }

    #[tokio::test]
    async fn test_list_endpoints() {
        let client = client(
            r#"{"ok":true,"result":[{"is_valid":true,"is_crypto":true,"is_fiat":false,"source":"TON","target":"USD","rate":"5.20"}]}"#,
        );
        let rates = client.get_exchange_rates().await.unwrap();
        assert_eq!(rates[0].rate, "5.20");
        assert_eq!(rates[0].rate_decimal().unwrap().to_string(), "5.20");
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let result = CryptoPay::with_transport(ClientConfig::new("bad\ntoken"), FailingTransport);
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[cfg(feature = "reqwest")]
    #[tokio::test]
    async fn test_reqwest_client_round_trip() {
        use url::Url;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/getMe"))
            .and(header(TOKEN_HEADER, "1234:token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ok":true,"result":{"app_id":77,"name":"shop","payment_processing_bot_username":"CryptoTestnetBot"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let client = CryptoPay::new(ClientConfig::new("1234:token").with_endpoint(endpoint)).unwrap();

        let app = client.get_me().await.unwrap();
        assert_eq!(app.app_id, 77);
        assert_eq!(app.payment_processing_bot_username, "CryptoTestnetBot");
    }
}
