//! Records returned by the Crypto Pay API

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::binder::{Bind, BindResult, FieldValue, Fields};
use crate::error::ApiResult;

/// An invoice created by the app
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    /// Unique ID for this invoice
    pub invoice_id: i64,
    /// Hash of the invoice
    pub hash: String,
    /// Type of the price, `crypto` or `fiat`
    pub currency_type: String,
    /// Cryptocurrency code
    pub asset: Option<String>,
    /// Fiat currency code
    pub fiat: Option<String>,
    /// Amount the invoice was created for
    pub amount: String,
    /// Cryptocurrency the invoice was paid in
    pub paid_asset: Option<String>,
    /// Amount the invoice was paid for
    pub paid_amount: Option<String>,
    /// Rate of `paid_asset` in the fiat currency
    pub paid_fiat_rate: Option<String>,
    /// Assets which can be used to pay the invoice
    pub accepted_assets: Option<Vec<String>>,
    /// Asset of the service fee charged on payment
    pub fee_asset: Option<String>,
    /// Amount of the service fee charged on payment
    pub fee_amount: Option<String>,
    /// Payment URL (deprecated by the API in favour of `bot_invoice_url`)
    pub pay_url: Option<String>,
    /// Payment URL to hand to the user
    pub bot_invoice_url: String,
    /// Description shown to the payer
    pub description: Option<String>,
    /// Current status
    pub status: InvoiceStatus,
    /// Creation date, ISO 8601
    pub created_at: String,
    /// Price of the asset in USD (deprecated)
    pub usd_rate: Option<String>,
    /// Price of the paid asset in USD
    pub paid_usd_rate: Option<String>,
    /// Whether the payer may leave a comment
    pub allow_comments: Option<bool>,
    /// Whether the payer may pay anonymously
    pub allow_anonymous: Option<bool>,
    /// Expiration date, ISO 8601
    pub expiration_date: Option<String>,
    /// Payment date, ISO 8601
    pub paid_at: Option<String>,
    /// Whether the invoice was paid anonymously
    pub paid_anonymously: bool,
    /// Comment left by the payer
    pub comment: Option<String>,
    /// Message shown to the payer after payment
    pub hidden_message: Option<String>,
    /// Data attached to the invoice when it was created
    pub payload: Option<String>,
    /// Label of the button shown after payment
    pub paid_btn_name: Option<String>,
    /// URL opened by the button shown after payment
    pub paid_btn_url: Option<String>,
}

impl Invoice {
    /// Whether the invoice has been paid
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// The invoiced amount as a decimal
    pub fn amount_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        Decimal::from_str(&self.amount)
    }

    /// Creation date, if it parses as RFC 3339
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    /// Payment date, if present and parseable
    pub fn paid_at_utc(&self) -> Option<DateTime<Utc>> {
        self.paid_at.as_deref().and_then(parse_timestamp)
    }
}

impl Bind for Invoice {
    fn bind(fields: &Fields<'_>) -> BindResult<Self> {
        Ok(Self {
            invoice_id: fields.required("invoice_id")?,
            hash: fields.or_default("hash")?,
            currency_type: fields.or_default("currency_type")?,
            asset: fields.optional("asset")?,
            fiat: fields.optional("fiat")?,
            amount: fields.or_default("amount")?,
            paid_asset: fields.optional("paid_asset")?,
            paid_amount: fields.optional("paid_amount")?,
            paid_fiat_rate: fields.optional("paid_fiat_rate")?,
            accepted_assets: fields.optional("accepted_assets")?,
            fee_asset: fields.optional("fee_asset")?,
            fee_amount: fields.optional("fee_amount")?,
            pay_url: fields.optional("pay_url")?,
            bot_invoice_url: fields.or_default("bot_invoice_url")?,
            description: fields.optional("description")?,
            status: fields.required("status")?,
            created_at: fields.or_default("created_at")?,
            usd_rate: fields.optional("usd_rate")?,
            paid_usd_rate: fields.optional("paid_usd_rate")?,
            allow_comments: fields.optional("allow_comments")?,
            allow_anonymous: fields.optional("allow_anonymous")?,
            expiration_date: fields.optional("expiration_date")?,
            paid_at: fields.optional("paid_at")?,
            paid_anonymously: fields.or_default("paid_anonymously")?,
            comment: fields.optional("comment")?,
            hidden_message: fields.optional("hidden_message")?,
            payload: fields.optional("payload")?,
            paid_btn_name: fields.optional("paid_btn_name")?,
            paid_btn_url: fields.optional("paid_btn_url")?,
        })
    }
}

/// Invoice status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceStatus {
    Active,
    Paid,
    Expired,
    /// A status this client does not know about yet
    Unknown(String),
}

impl InvoiceStatus {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Paid => "paid",
            Self::Expired => "expired",
            Self::Unknown(other) => other,
        }
    }
}

impl From<&str> for InvoiceStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "paid" => Self::Paid,
            "expired" => Self::Expired,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldValue for InvoiceStatus {
    fn from_field(value: &Value) -> Result<Self, String> {
        String::from_field(value).map(|s| Self::from(s.as_str()))
    }
}

impl Serialize for InvoiceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A completed transfer from the app balance to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    /// Unique ID for this transfer
    pub transfer_id: i64,
    /// Idempotency token the transfer was requested with
    pub spend_id: Option<String>,
    /// Telegram user ID the transfer was sent to
    pub user_id: i64,
    /// Cryptocurrency code
    pub asset: String,
    /// Amount of the transfer
    pub amount: String,
    /// Status, currently only `completed`
    pub status: String,
    /// Completion date, ISO 8601
    pub completed_at: String,
    /// Comment shown to the recipient
    pub comment: Option<String>,
}

impl Transfer {
    /// The transferred amount as a decimal
    pub fn amount_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        Decimal::from_str(&self.amount)
    }

    /// Completion date, if it parses as RFC 3339
    pub fn completed_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.completed_at)
    }
}

impl Bind for Transfer {
    fn bind(fields: &Fields<'_>) -> BindResult<Self> {
        Ok(Self {
            transfer_id: fields.required("transfer_id")?,
            spend_id: fields.optional("spend_id")?,
            user_id: fields.or_default("user_id")?,
            asset: fields.or_default("asset")?,
            amount: fields.or_default("amount")?,
            status: fields.or_default("status")?,
            completed_at: fields.or_default("completed_at")?,
            comment: fields.optional("comment")?,
        })
    }
}

/// Webhook update type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpdateType {
    /// Sent when an invoice is paid
    InvoicePaid,
    /// An update type this client does not know about yet
    Other(String),
}

impl UpdateType {
    /// Wire tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvoicePaid => "invoice_paid",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for UpdateType {
    fn from(s: &str) -> Self {
        match s {
            "invoice_paid" => Self::InvoicePaid,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for UpdateType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldValue for UpdateType {
    fn from_field(value: &Value) -> Result<Self, String> {
        String::from_field(value).map(Self::from)
    }
}

impl Serialize for UpdateType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single webhook notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    /// Non-unique update ID
    pub update_id: i64,
    /// Which event this update describes
    pub update_type: UpdateType,
    /// Date the request was sent, ISO 8601
    pub request_date: String,
    /// The invoice an `invoice_paid` update is about
    pub payload: Option<Invoice>,
    /// Untyped payload of an update type this client does not know about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<Value>,
}

impl Update {
    /// Parse and bind a raw webhook body
    pub fn from_json(body: &[u8]) -> ApiResult<Self> {
        bind_update(body)
    }

    /// The paid invoice carried by an `invoice_paid` update
    pub fn invoice(&self) -> Option<&Invoice> {
        self.payload.as_ref()
    }

    /// Request date, if it parses as RFC 3339
    pub fn request_date_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.request_date)
    }
}

impl Bind for Update {
    fn bind(fields: &Fields<'_>) -> BindResult<Self> {
        let update_type: UpdateType = fields.required("update_type")?;
        // the payload's shape is chosen by the update type
        let (payload, raw_payload) = match update_type {
            UpdateType::InvoicePaid => (fields.nested::<Invoice>("payload")?, None),
            UpdateType::Other(_) => (None, fields.optional::<Value>("payload")?),
        };

        Ok(Self {
            update_id: fields.required("update_id")?,
            update_type,
            request_date: fields.required("request_date")?,
            payload,
            raw_payload,
        })
    }
}

/// Parse a webhook body and bind it into an [`Update`]
pub fn bind_update(body: &[u8]) -> ApiResult<Update> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(crate::binder::bind(&value)?)
}

/// Basic information about the app (`getMe`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub app_id: i64,
    pub name: String,
    pub payment_processing_bot_username: String,
}

impl Bind for AppInfo {
    fn bind(fields: &Fields<'_>) -> BindResult<Self> {
        Ok(Self {
            app_id: fields.required("app_id")?,
            name: fields.or_default("name")?,
            payment_processing_bot_username: fields.or_default("payment_processing_bot_username")?,
        })
    }
}

/// Balance of one asset (`getBalance`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub currency_code: String,
    pub available: String,
    pub onhold: String,
}

impl Bind for Balance {
    fn bind(fields: &Fields<'_>) -> BindResult<Self> {
        Ok(Self {
            currency_code: fields.required("currency_code")?,
            available: fields.or_default("available")?,
            onhold: fields.or_default("onhold")?,
        })
    }
}

/// Exchange rate between two currencies (`getExchangeRates`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeRate {
    pub is_valid: bool,
    pub is_crypto: bool,
    pub is_fiat: bool,
    pub source: String,
    pub target: String,
    pub rate: String,
}

impl ExchangeRate {
    /// The rate as a decimal
    pub fn rate_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        Decimal::from_str(&self.rate)
    }
}

impl Bind for ExchangeRate {
    fn bind(fields: &Fields<'_>) -> BindResult<Self> {
        Ok(Self {
            is_valid: fields.or_default("is_valid")?,
            is_crypto: fields.or_default("is_crypto")?,
            is_fiat: fields.or_default("is_fiat")?,
            source: fields.required("source")?,
            target: fields.required("target")?,
            rate: fields.or_default("rate")?,
        })
    }
}

/// A supported currency (`getCurrencies`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub is_blockchain: bool,
    pub is_stablecoin: bool,
    pub is_fiat: bool,
    pub name: String,
    pub code: String,
    pub url: Option<String>,
    pub decimals: i64,
}

impl Bind for Currency {
    fn bind(fields: &Fields<'_>) -> BindResult<Self> {
        Ok(Self {
            is_blockchain: fields.or_default("is_blockchain")?,
            is_stablecoin: fields.or_default("is_stablecoin")?,
            is_fiat: fields.or_default("is_fiat")?,
            name: fields.or_default("name")?,
            code: fields.required("code")?,
            url: fields.optional("url")?,
            decimals: fields.or_default("decimals")?,
        })
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
