//! API method parameters and their wire encoding

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::binder::value_kind;
use crate::enums::PaidButtonName;
use crate::error::{ApiError, ApiResult};

/// Parameters of a single API method
pub trait ApiMethod: Serialize {
    /// Method name as it appears in the request path
    const NAME: &'static str;
}

/// Encoded method parameters, ordered by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    /// No parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether a parameter is present
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Render as query-string pairs
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(name, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), rendered)
            })
            .collect()
    }

    /// The underlying map
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

/// Encode method parameters for the wire
///
/// Unset fields are left out, booleans become the strings `"true"` and
/// `"false"`, and every other value is copied as is. The same rule applies to
/// every field of every method.
pub fn encode_params<M: ApiMethod>(method: &M) -> ApiResult<Params> {
    let value = serde_json::to_value(method).map_err(|e| ApiError::Encode(e.to_string()))?;
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(ApiError::Encode(format!(
                "{} parameters must serialize to an object, got {}",
                M::NAME,
                value_kind(&other)
            )));
        }
    };

    let params = map
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::Bool(flag) => Some((name, Value::String(flag.to_string()))),
            other => Some((name, other)),
        })
        .collect();

    Ok(Params(params))
}

/// Parameters of `createInvoice`
#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoiceRequest {
    /// Cryptocurrency code
    pub asset: String,
    /// Amount, e.g. `125.50`
    pub amount: String,
    /// `crypto` or `fiat`
    pub currency_type: Option<String>,
    /// Fiat currency code when `currency_type` is `fiat`
    pub fiat: Option<String>,
    /// Comma-separated assets the payer may use
    pub accepted_assets: Option<String>,
    /// Shown to the payer, up to 1024 characters
    pub description: Option<String>,
    /// Shown after payment, up to 2048 characters
    pub hidden_message: Option<String>,
    /// Button shown after payment
    pub paid_btn_name: Option<PaidButtonName>,
    /// URL opened by the button, required with `paid_btn_name`
    pub paid_btn_url: Option<String>,
    /// Arbitrary data attached to the invoice, up to 4kb
    pub payload: Option<String>,
    /// Allow the payer to add a comment
    pub allow_comments: Option<bool>,
    /// Allow the payer to pay anonymously
    pub allow_anonymous: Option<bool>,
    /// Payment time limit in seconds
    pub expires_in: Option<u32>,
}

impl CreateInvoiceRequest {
    /// Create an invoice request for an amount of an asset
    pub fn new(asset: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            amount: amount.into(),
            currency_type: None,
            fiat: None,
            accepted_assets: None,
            description: None,
            hidden_message: None,
            paid_btn_name: None,
            paid_btn_url: None,
            payload: None,
            allow_comments: None,
            allow_anonymous: None,
            expires_in: None,
        }
    }

    /// Price the invoice in a fiat currency
    pub fn fiat(mut self, fiat: impl Into<String>) -> Self {
        self.currency_type = Some("fiat".to_string());
        self.fiat = Some(fiat.into());
        self
    }

    /// Restrict the assets the payer may use
    pub fn accepted_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined = assets
            .into_iter()
            .map(Into::into)
            .collect::<Vec<String>>()
            .join(",");
        self.accepted_assets = Some(joined);
        self
    }

    /// With description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With hidden message
    pub fn hidden_message(mut self, message: impl Into<String>) -> Self {
        self.hidden_message = Some(message.into());
        self
    }

    /// With a button shown after payment
    pub fn paid_button(mut self, name: PaidButtonName, url: impl Into<String>) -> Self {
        self.paid_btn_name = Some(name);
        self.paid_btn_url = Some(url.into());
        self
    }

    /// With payload
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Allow or forbid payer comments
    pub fn allow_comments(mut self, allow: bool) -> Self {
        self.allow_comments = Some(allow);
        self
    }

    /// Allow or forbid anonymous payment
    pub fn allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = Some(allow);
        self
    }

    /// Expire the invoice after a number of seconds
    pub fn expires_in(mut self, seconds: u32) -> Self {
        self.expires_in = Some(seconds);
        self
    }
}

impl ApiMethod for CreateInvoiceRequest {
    const NAME: &'static str = "createInvoice";
}

/// Parameters of `getInvoices`
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetInvoicesRequest {
    /// Comma-separated cryptocurrency codes
    pub asset: Option<String>,
    /// Comma-separated fiat currency codes
    pub fiat: Option<String>,
    /// Comma-separated invoice IDs
    pub invoice_ids: Option<String>,
    /// `active` or `paid`
    pub status: Option<String>,
    /// Offset into the result set
    pub offset: Option<u32>,
    /// Number of invoices to return, 1-1000
    pub count: Option<u32>,
}

impl GetInvoicesRequest {
    /// No filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by asset
    pub fn asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    /// Filter by fiat currency
    pub fn fiat(mut self, fiat: impl Into<String>) -> Self {
        self.fiat = Some(fiat.into());
        self
    }

    /// Only the given invoices
    pub fn invoice_ids<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        let joined = ids
            .into_iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.invoice_ids = Some(joined);
        self
    }

    /// Filter by status
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Page through results
    pub fn page(mut self, offset: u32, count: u32) -> Self {
        self.offset = Some(offset);
        self.count = Some(count);
        self
    }
}

impl ApiMethod for GetInvoicesRequest {
    const NAME: &'static str = "getInvoices";
}

/// Parameters of `transfer`
///
/// `spend_id` makes the request idempotent: the API accepts only one transfer
/// per spend ID, so a retried request cannot pay twice.
#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    /// Telegram user ID of the recipient
    pub user_id: i64,
    /// Cryptocurrency code
    pub asset: String,
    /// Amount, e.g. `125.50`
    pub amount: String,
    /// Idempotency token, up to 64 symbols
    pub spend_id: String,
    /// Shown to the recipient, up to 1024 symbols
    pub comment: Option<String>,
    /// Suppress the recipient notification
    pub disable_send_notification: Option<bool>,
}

impl TransferRequest {
    /// Create a transfer request with a caller-supplied spend ID
    pub fn new(
        user_id: i64,
        asset: impl Into<String>,
        amount: impl Into<String>,
        spend_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            asset: asset.into(),
            amount: amount.into(),
            spend_id: spend_id.into(),
            comment: None,
            disable_send_notification: None,
        }
    }

    /// Create a transfer request with a freshly generated spend ID
    ///
    /// Keep the generated ID if the request may be retried.
    pub fn with_generated_spend_id(
        user_id: i64,
        asset: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self::new(user_id, asset, amount, generate_spend_id())
    }

    /// With comment
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Do not notify the recipient
    pub fn silent(mut self) -> Self {
        self.disable_send_notification = Some(true);
        self
    }
}

impl ApiMethod for TransferRequest {
    const NAME: &'static str = "transfer";
}

/// A random 32-character spend ID
pub fn generate_spend_id() -> String {
    Uuid::new_v4().simple().to_string()
}
