//! Client configuration
//!
//! Configuration can be built in code, read from `CRYPTO_PAY_*` environment
//! variables (optionally seeded from a `.env` file) or parsed from TOML:
//!
//! ```toml
//! token = "1234:AAA..."
//! network = "testnet"
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CRYPTO_PAY";

const MAINNET_ENDPOINT: &str = "https://pay.crypt.bot/api";
const TESTNET_ENDPOINT: &str = "https://testnet-pay.crypt.bot/api";

/// API token of the app
///
/// The token is never printed; `Debug` output is redacted.
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a token
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into().into_boxed_str()))
    }

    /// Raw token bytes, for authentication and key derivation only
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

/// Which API deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Base endpoint of the deployment
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_ENDPOINT,
            Self::Testnet => TESTNET_ENDPOINT,
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            other => Err(ConfigError::InvalidValue {
                key: "network".to_string(),
                reason: format!("unknown network {:?}", other),
            }),
        }
    }
}

/// Client configuration
#[derive(Debug)]
pub struct ClientConfig {
    token: Credential,
    network: Network,
    endpoint: Option<Url>,
}

#[derive(Deserialize)]
struct FileConfig {
    token: String,
    #[serde(default)]
    network: Network,
    endpoint: Option<String>,
}

impl ClientConfig {
    /// Mainnet configuration for a token
    pub fn new(token: impl Into<Credential>) -> Self {
        Self {
            token: token.into(),
            network: Network::Mainnet,
            endpoint: None,
        }
    }

    /// Testnet configuration for a token
    pub fn testnet(token: impl Into<Credential>) -> Self {
        Self::new(token).with_network(Network::Testnet)
    }

    /// Select the network
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Override the base endpoint (takes precedence over the network)
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Load from `CRYPTO_PAY_API_TOKEN`, `CRYPTO_PAY_NETWORK` and
    /// `CRYPTO_PAY_ENDPOINT`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(format!("{}_{}", ENV_PREFIX, key)).ok())
    }

    /// Load a `.env` file into the environment, then read it like
    /// [`from_env`](Self::from_env)
    ///
    /// Without a path, a missing `.env` in the working directory is ignored.
    pub fn from_dotenv(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Self::from_env()
    }

    /// Parse a TOML document with `token`, `network` and `endpoint` keys
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content)
            .map_err(|e| ConfigError::LoadError(format!("TOML parse error: {}", e)))?;
        let endpoint = file.endpoint.as_deref().map(parse_endpoint).transpose()?;
        Self::validated(file.token, file.network, endpoint)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("API_TOKEN")
            .ok_or_else(|| ConfigError::MissingKey(format!("{}_API_TOKEN", ENV_PREFIX)))?;
        let network = lookup("NETWORK")
            .map(|value| value.parse::<Network>())
            .transpose()?
            .unwrap_or_default();
        let endpoint = lookup("ENDPOINT")
            .as_deref()
            .map(parse_endpoint)
            .transpose()?;
        Self::validated(token, network, endpoint)
    }

    fn validated(token: String, network: Network, endpoint: Option<Url>) -> Result<Self, ConfigError> {
        if token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "token".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            token: Credential::new(token),
            network,
            endpoint,
        })
    }

    /// The API token
    pub fn token(&self) -> &Credential {
        &self.token
    }

    /// The selected network
    pub fn network(&self) -> Network {
        self.network
    }

    /// Base endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_ref()
            .map(Url::as_str)
            .unwrap_or_else(|| self.network.endpoint())
    }

    /// URL of a single API method
    pub fn method_url(&self, method: &str) -> Result<Url, ConfigError> {
        let raw = format!("{}/{}", self.endpoint().trim_end_matches('/'), method);
        parse_endpoint(&raw)
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: "endpoint".to_string(),
        reason: e.to_string(),
    })
}
