//! HTTP implementation of [`RemoteGateway`].
//!
//! The backend answers every call with a JSON envelope carrying a `success`
//! flag. HTTP status codes are not meaningful on their own: a rejected login
//! may come back as 200 or 401 with the same body, so classification is done
//! on the body.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use super::conversions::{convert_orders, convert_products, convert_receipt, convert_user};
use super::{GatewayError, OrderReceipt, OrderSubmission, RemoteGateway};
use crate::config::ClientConfig;
use crate::models::{Order, Product, User};

const CATALOG_PATH: &str = "produkty";
const ORDERS_PATH: &str = "zamowienia";
const LOGIN_PATH: &str = "login";
const SUBMIT_PATH: &str = "nowe-zamowienie";

const CATALOG_ROWS_KEY: &str = "produkty";
const ORDER_ROWS_KEY: &str = "zamowienia";
const USER_KEY: &str = "user";

/// Maximum number of body characters copied into log lines.
const LOGGED_BODY_CHARS: usize = 300;

/// `reqwest`-backed client for the ordering backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<HttpGatewayInner>,
}

struct HttpGatewayInner {
    client: reqwest::Client,
    catalog_url: Url,
    orders_url: Url,
    login_url: Url,
    submit_url: Url,
}

/// Request body for login.
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    haslo: &'a str,
}

impl HttpGateway {
    /// Create a gateway for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client cannot be built and
    /// `GatewayError::Url` if an endpoint URL cannot be derived from the base
    /// URL.
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        let base = &config.api_base_url;

        Ok(Self {
            inner: Arc::new(HttpGatewayInner {
                client,
                catalog_url: base.join(CATALOG_PATH)?,
                orders_url: base.join(ORDERS_PATH)?,
                login_url: base.join(LOGIN_PATH)?,
                submit_url: base.join(SUBMIT_PATH)?,
            }),
        })
    }

    /// Read a response and unwrap its `success` envelope.
    async fn read_envelope(
        response: reqwest::Response,
    ) -> Result<Map<String, Value>, GatewayError> {
        let status = response.status();
        let body = response.text().await?;

        let envelope: Map<String, Value> = serde_json::from_str(&body).map_err(|e| {
            warn!(
                status = %status,
                error = %e,
                body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "Backend returned a body that is not a JSON object"
            );
            e
        })?;

        if !status.is_success() {
            debug!(status = %status, "Backend returned non-success status with a JSON body");
        }

        if envelope.get("success") == Some(&Value::Bool(true)) {
            Ok(envelope)
        } else {
            Err(GatewayError::Rejected(rejection_message(&envelope)))
        }
    }
}

/// The backend's explanation for `success: false`, if it sent one.
fn rejection_message(envelope: &Map<String, Value>) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|key| envelope.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(String::from)
}

/// Take the row array stored under `key`.
fn take_rows(
    envelope: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Vec<Value>, GatewayError> {
    match envelope.remove(key) {
        Some(Value::Array(rows)) => Ok(rows),
        _ => Err(GatewayError::Malformed(key)),
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<Product>, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.inner.catalog_url.clone())
            .send()
            .await?;

        let mut envelope = Self::read_envelope(response).await?;
        let products = convert_products(take_rows(&mut envelope, CATALOG_ROWS_KEY)?);
        debug!(count = products.len(), "Fetched catalog");
        Ok(products)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn fetch_orders(&self, email: &str) -> Result<Vec<Order>, GatewayError> {
        let mut url = self.inner.orders_url.clone();
        url.query_pairs_mut().append_pair("email", email);

        let response = self.inner.client.get(url).send().await?;

        let mut envelope = Self::read_envelope(response).await?;
        let orders = convert_orders(take_rows(&mut envelope, ORDER_ROWS_KEY)?);
        debug!(count = orders.len(), "Fetched order history");
        Ok(orders)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &str, password: &SecretString) -> Result<User, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.inner.login_url.clone())
            .json(&LoginRequest {
                email,
                haslo: password.expose_secret(),
            })
            .send()
            .await?;

        let envelope = Self::read_envelope(response).await?;
        envelope
            .get(USER_KEY)
            .and_then(|user| convert_user(user, email))
            .ok_or(GatewayError::Malformed(USER_KEY))
    }

    #[instrument(
        skip(self, submission),
        fields(lines = submission.lines.len(), total = %submission.total)
    )]
    async fn submit_order(
        &self,
        submission: &OrderSubmission,
    ) -> Result<OrderReceipt, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.inner.submit_url.clone())
            .json(submission)
            .send()
            .await?;

        let envelope = Self::read_envelope(response).await?;
        Ok(convert_receipt(&envelope))
    }
}
