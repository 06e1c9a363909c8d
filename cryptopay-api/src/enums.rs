//! Wire constants accepted by the API

use std::fmt;

use serde::{Serialize, Serializer};

/// Cryptocurrency codes supported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Usdt,
    Ton,
    Btc,
    Eth,
    Ltc,
    Bnb,
    Trx,
    Usdc,
    /// Testnet only
    Jet,
}

impl Asset {
    /// All supported assets
    pub const ALL: [Asset; 9] = [
        Asset::Usdt,
        Asset::Ton,
        Asset::Btc,
        Asset::Eth,
        Asset::Ltc,
        Asset::Bnb,
        Asset::Trx,
        Asset::Usdc,
        Asset::Jet,
    ];

    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usdt => "USDT",
            Self::Ton => "TON",
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Ltc => "LTC",
            Self::Bnb => "BNB",
            Self::Trx => "TRX",
            Self::Usdc => "USDC",
            Self::Jet => "JET",
        }
    }

    /// Parse a wire code, case-insensitively
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|asset| asset.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.code().to_string()
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Button shown to the payer after an invoice is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaidButtonName {
    #[serde(rename = "viewItem")]
    ViewItem,
    #[serde(rename = "openChannel")]
    OpenChannel,
    #[serde(rename = "openBot")]
    OpenBot,
    #[serde(rename = "callback")]
    Callback,
}

impl PaidButtonName {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewItem => "viewItem",
            Self::OpenChannel => "openChannel",
            Self::OpenBot => "openBot",
            Self::Callback => "callback",
        }
    }
}

impl fmt::Display for PaidButtonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
