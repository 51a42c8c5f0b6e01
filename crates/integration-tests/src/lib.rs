//! Integration tests for the Feedstore client.
//!
//! The tests in `tests/` drive the real `reqwest` gateway and the
//! `Storefront` context against [`FakeBackend`], an axum server bound to an
//! ephemeral port on localhost that speaks the backend's JSON envelope.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p feedstore-integration-tests
//! ```
//!
//! No external services are needed.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unused_async)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use feedstore_client::{ClientConfig, HttpGateway, Storefront};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Path prefix the fake mounts the webhooks under.
const API_PREFIX: &str = "/webhook";

/// A canned response.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    Raw(StatusCode, &'static str),
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Self::Json(status, body) => (status, Json(body)).into_response(),
            Self::Raw(status, body) => (status, body).into_response(),
        }
    }
}

struct Account {
    password: String,
    user: Value,
}

#[derive(Default)]
struct BackendState {
    catalog: Mutex<Option<Reply>>,
    catalog_rows: Mutex<Vec<Value>>,
    orders: Mutex<HashMap<String, Vec<Value>>>,
    order_queries: Mutex<Vec<String>>,
    accounts: Mutex<HashMap<String, Account>>,
    login_requests: Mutex<Vec<Value>>,
    submit: Mutex<Option<Reply>>,
    submissions: Mutex<Vec<Value>>,
}

/// In-process stand-in for the ordering backend.
///
/// Successful submissions are appended to the customer's order history in
/// the spreadsheet column format, so a following history fetch returns them.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to an ephemeral localhost port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());

        let api = Router::new()
            .route("/produkty", get(catalog))
            .route("/zamowienia", get(orders))
            .route("/login", post(login))
            .route("/nowe-zamowienie", post(submit))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest(API_PREFIX, api);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to read local address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake backend failed");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL to configure the client with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}{API_PREFIX}", self.addr)
    }

    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url())
            .and_then(|config| config.with_timeout_secs(5))
            .expect("Fake backend URL is valid")
    }

    #[must_use]
    pub fn gateway(&self) -> HttpGateway {
        HttpGateway::new(&self.config()).expect("Failed to build gateway")
    }

    #[must_use]
    pub fn storefront(&self) -> Storefront<HttpGateway> {
        Storefront::new(self.gateway())
    }

    /// Register a customer. `user` is the object returned on login.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, user: Value) -> Self {
        self.state.accounts.lock().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user,
            },
        );
        self
    }

    #[must_use]
    pub fn with_catalog_rows(self, rows: Vec<Value>) -> Self {
        *self.state.catalog_rows.lock() = rows;
        self
    }

    #[must_use]
    pub fn with_order_rows(self, email: &str, rows: Vec<Value>) -> Self {
        self.state.orders.lock().insert(email.to_string(), rows);
        self
    }

    /// Answer catalog requests with `reply` instead of the catalog rows.
    pub fn set_catalog_reply(&self, reply: Option<Reply>) {
        *self.state.catalog.lock() = reply;
    }

    /// Answer submissions with `reply` instead of accepting them.
    pub fn set_submit_reply(&self, reply: Option<Reply>) {
        *self.state.submit.lock() = reply;
    }

    /// Emails the order history was requested for, decoded.
    #[must_use]
    pub fn order_queries(&self) -> Vec<String> {
        self.state.order_queries.lock().clone()
    }

    /// Raw login request bodies.
    #[must_use]
    pub fn login_requests(&self) -> Vec<Value> {
        self.state.login_requests.lock().clone()
    }

    /// Raw order submission bodies, accepted or not.
    #[must_use]
    pub fn submissions(&self) -> Vec<Value> {
        self.state.submissions.lock().clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A localhost URL nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    drop(listener);
    format!("http://{addr}{API_PREFIX}")
}

// =============================================================================
// Handlers
// =============================================================================

type Shared = State<Arc<BackendState>>;

async fn catalog(State(state): Shared) -> Response {
    if let Some(reply) = state.catalog.lock().clone() {
        return reply.into_response();
    }
    let rows = state.catalog_rows.lock().clone();
    Json(json!({"success": true, "produkty": rows})).into_response()
}

async fn orders(State(state): Shared, Query(params): Query<HashMap<String, String>>) -> Response {
    let email = params.get("email").cloned().unwrap_or_default();
    state.order_queries.lock().push(email.clone());
    let rows = state.orders.lock().get(&email).cloned().unwrap_or_default();
    Json(json!({"success": true, "zamowienia": rows})).into_response()
}

async fn login(State(state): Shared, Json(body): Json<Value>) -> Response {
    state.login_requests.lock().push(body.clone());

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["haslo"].as_str().unwrap_or_default();
    let accounts = state.accounts.lock();
    match accounts.get(email) {
        Some(account) if account.password == password => {
            Json(json!({"success": true, "user": account.user})).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Nieprawidłowy email lub hasło"})),
        )
            .into_response(),
    }
}

async fn submit(State(state): Shared, Json(body): Json<Value>) -> Response {
    state.submissions.lock().push(body.clone());
    if let Some(reply) = state.submit.lock().clone() {
        return reply.into_response();
    }

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let summary = body["produkty"]
        .as_array()
        .map(|lines| {
            lines
                .iter()
                .map(|line| format!("{} x{}", line["nazwa"].as_str().unwrap_or("?"), line["ilosc"]))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    let mut books = state.orders.lock();
    let book = books.entry(email.clone()).or_default();
    let number = format!("ZAM/2026/{:04}", book.len() + 1);
    book.push(json!({
        "Data": "2026-10-19",
        "Numer_zamowienia": number,
        "Imie_Nazwisko": body["klient"],
        "Email": email,
        "Telefon": body["telefon"],
        "Adres_dostawy": body["adresDostawy"],
        "Produkty": summary,
        "Suma": body["suma"],
        "Status": "W realizacji",
    }));

    Json(json!({"success": true, "numer": number})).into_response()
}
