//! Typed boundary to the ordering backend.
//!
//! # Architecture
//!
//! - [`RemoteGateway`] is the seam the rest of the crate talks to; tests swap
//!   in a scripted implementation
//! - [`HttpGateway`] implements it over `reqwest` against the JSON webhooks
//! - Response rows are converted into domain models here, so callers never
//!   see raw JSON
//!
//! # Operations
//!
//! | Operation | Method | Path |
//! |---|---|---|
//! | Catalog fetch | GET | `produkty` |
//! | Order history | GET | `zamowienia?email=…` |
//! | Login | POST | `login` |
//! | Submit order | POST | `nowe-zamowienie` |
//!
//! Every call resolves to `Ok(payload)`, a backend rejection
//! ([`GatewayError::Rejected`] / [`GatewayError::Malformed`]) or a transport
//! failure (see [`GatewayError::is_transport`]).

mod conversions;
mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Order, Product, User};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Backend answered `success: false`.
    #[error("backend rejected request: {}", .0.as_deref().unwrap_or("(no message)"))]
    Rejected(Option<String>),

    /// Backend answered `success: true` without the expected payload.
    #[error("malformed response: missing {0}")]
    Malformed(&'static str),
}

impl GatewayError {
    /// Returns `true` for transport-level failures: the request never got a
    /// readable answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Parse(_) | Self::Url(_))
    }

    /// The message the backend attached to a rejection, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Rejected(message) => message.as_deref(),
            _ => None,
        }
    }
}

/// The four backend operations the client depends on.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch the full product catalog.
    async fn fetch_catalog(&self) -> Result<Vec<Product>, GatewayError>;

    /// Fetch the order history of the customer identified by `email`.
    ///
    /// Filtering by customer is the backend's job; the client only passes
    /// the email along.
    async fn fetch_orders(&self, email: &str) -> Result<Vec<Order>, GatewayError>;

    /// Check credentials and return the customer identity.
    async fn login(&self, email: &str, password: &SecretString) -> Result<User, GatewayError>;

    /// Place an order.
    async fn submit_order(&self, submission: &OrderSubmission)
    -> Result<OrderReceipt, GatewayError>;
}

/// Order payload sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSubmission {
    pub email: String,
    #[serde(rename = "klient")]
    pub customer_name: String,
    #[serde(rename = "telefon")]
    pub phone: String,
    #[serde(rename = "adresDostawy")]
    pub delivery_address: String,
    #[serde(rename = "produkty")]
    pub lines: Vec<SubmissionLine>,
    /// Cart total rounded to two decimal places.
    #[serde(rename = "suma", with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// One line item of an [`OrderSubmission`].
///
/// Carries no product handle; the backend identifies products by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionLine {
    #[serde(rename = "nazwa")]
    pub name: String,
    #[serde(rename = "ilosc")]
    pub quantity: u32,
    #[serde(rename = "cena", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Backend acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderReceipt {
    /// Backend-issued order number, when the backend reports one.
    pub order_number: Option<String>,
}
