//! Crypto Pay API client
//!
//! Typed access to the Crypto Pay payment API: invoices, transfers,
//! balances and exchange rates.
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CryptoPay client                       │
//! │  get_me | create_invoice | get_invoices | transfer | ...      │
//! └──────────────────────────────────────────────────────────────┘
//!        │ encode_params                      ▲ bind / bind_list
//!        ▼                                    │
//! ┌──────────────┐   TransportRequest   ┌──────────────────────┐
//! │  Transport   │ ───────────────────▶ │   decode_envelope    │
//! │ (reqwest)    │      body bytes      │ {ok, result | error} │
//! └──────────────┘                      └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cryptopay_api::{Asset, ClientConfig, CreateInvoiceRequest, CryptoPay};
//!
//! # async fn run() -> cryptopay_api::ApiResult<()> {
//! let client = CryptoPay::new(ClientConfig::testnet("1234:AAA..."))?;
//!
//! let invoice = client
//!     .create_invoice(
//!         &CreateInvoiceRequest::new(Asset::Usdt, "125.50")
//!             .description("Order #1234")
//!             .allow_comments(false),
//!     )
//!     .await?;
//!
//! println!("pay at {}", invoice.bot_invoice_url);
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod client;
pub mod config;
pub mod enums;
pub mod envelope;
pub mod error;
pub mod methods;
pub mod transport;
pub mod types;

pub use binder::{Bind, BindResult, FieldValue, Fields, bind, bind_list, bind_map};
pub use client::{CryptoPay, TOKEN_HEADER};
pub use config::{ClientConfig, Credential, Network};
pub use enums::{Asset, PaidButtonName};
pub use envelope::{decode_envelope, decode_items, decode_list, decode_result};
pub use error::*;
pub use methods::{
    ApiMethod, CreateInvoiceRequest, GetInvoicesRequest, Params, TransferRequest, encode_params,
    generate_spend_id,
};
pub use transport::{Transport, TransportRequest};
pub use types::*;

#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
