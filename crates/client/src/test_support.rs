//! Scripted in-memory [`RemoteGateway`] for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use feedstore_core::{Availability, OrderSeq, OrderStatus, Price, ProductId};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Notify;

use crate::gateway::{GatewayError, OrderReceipt, OrderSubmission, RemoteGateway};
use crate::models::{Order, Product, User};

/// How a scripted call fails.
#[derive(Debug, Clone)]
pub enum Failure {
    Rejected(Option<String>),
    Transport,
}

impl Failure {
    fn into_error(self) -> GatewayError {
        match self {
            Self::Rejected(message) => GatewayError::Rejected(message),
            Self::Transport => GatewayError::Parse(
                serde_json::from_str::<serde_json::Value>("<html>502</html>").unwrap_err(),
            ),
        }
    }
}

#[derive(Default)]
pub struct Calls {
    pub catalog: AtomicUsize,
    pub orders: AtomicUsize,
    pub login: AtomicUsize,
    pub submit: AtomicUsize,
}

impl Calls {
    pub fn catalog(&self) -> usize {
        self.catalog.load(Ordering::SeqCst)
    }

    pub fn orders(&self) -> usize {
        self.orders.load(Ordering::SeqCst)
    }

    pub fn login(&self) -> usize {
        self.login.load(Ordering::SeqCst)
    }

    pub fn submit(&self) -> usize {
        self.submit.load(Ordering::SeqCst)
    }
}

/// Backend double: accounts, a catalog, per-customer order books.
///
/// A successful submission is appended to the customer's order book, so a
/// following history fetch sees it.
#[derive(Default)]
pub struct FakeGateway {
    pub calls: Calls,
    catalog: Mutex<Vec<Product>>,
    catalog_failure: Mutex<Option<Failure>>,
    orders: Mutex<HashMap<String, Vec<Order>>>,
    orders_failure: Mutex<Option<Failure>>,
    accounts: Mutex<HashMap<String, (String, User)>>,
    login_failure: Mutex<Option<Failure>>,
    submit_failure: Mutex<Option<Failure>>,
    catalog_gate: Option<Arc<Notify>>,
    login_gate: Option<Arc<Notify>>,
    orders_gate: Option<Arc<Notify>>,
    submit_gate: Option<Arc<Notify>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, password: &str, user: User) -> Self {
        self.accounts
            .lock()
            .insert(user.email.clone(), (password.to_string(), user));
        self
    }

    pub fn with_catalog(self, products: Vec<Product>) -> Self {
        *self.catalog.lock() = products;
        self
    }

    pub fn with_orders(self, email: &str, orders: Vec<Order>) -> Self {
        self.orders.lock().insert(email.to_string(), orders);
        self
    }

    /// Block catalog fetches until `gate` is notified.
    pub fn with_catalog_gate(mut self, gate: Arc<Notify>) -> Self {
        self.catalog_gate = Some(gate);
        self
    }

    /// Block order history fetches until `gate` is notified, once per fetch.
    pub fn with_orders_gate(mut self, gate: Arc<Notify>) -> Self {
        self.orders_gate = Some(gate);
        self
    }

    pub fn with_login_gate(mut self, gate: Arc<Notify>) -> Self {
        self.login_gate = Some(gate);
        self
    }

    pub fn with_submit_gate(mut self, gate: Arc<Notify>) -> Self {
        self.submit_gate = Some(gate);
        self
    }

    pub fn fail_catalog(&self, failure: Option<Failure>) {
        *self.catalog_failure.lock() = failure;
    }

    pub fn fail_orders(&self, failure: Option<Failure>) {
        *self.orders_failure.lock() = failure;
    }

    pub fn fail_login(&self, failure: Option<Failure>) {
        *self.login_failure.lock() = failure;
    }

    pub fn fail_submit(&self, failure: Option<Failure>) {
        *self.submit_failure.lock() = failure;
    }

    pub fn set_catalog(&self, products: Vec<Product>) {
        *self.catalog.lock() = products;
    }

    /// Orders recorded for `email`.
    pub fn orders_of(&self, email: &str) -> Vec<Order> {
        self.orders.lock().get(email).cloned().unwrap_or_default()
    }
}

async fn pass(gate: Option<&Arc<Notify>>) {
    if let Some(gate) = gate {
        gate.notified().await;
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn fetch_catalog(&self) -> Result<Vec<Product>, GatewayError> {
        self.calls.catalog.fetch_add(1, Ordering::SeqCst);
        pass(self.catalog_gate.as_ref()).await;
        let failure = self.catalog_failure.lock().clone();
        match failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(self.catalog.lock().clone()),
        }
    }

    async fn fetch_orders(&self, email: &str) -> Result<Vec<Order>, GatewayError> {
        self.calls.orders.fetch_add(1, Ordering::SeqCst);
        pass(self.orders_gate.as_ref()).await;
        let failure = self.orders_failure.lock().clone();
        match failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(self.orders_of(email)),
        }
    }

    async fn login(&self, email: &str, password: &SecretString) -> Result<User, GatewayError> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        pass(self.login_gate.as_ref()).await;
        let failure = self.login_failure.lock().clone();
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        match self.accounts.lock().get(email) {
            Some((expected, user)) if expected == password.expose_secret() => Ok(user.clone()),
            _ => Err(GatewayError::Rejected(None)),
        }
    }

    async fn submit_order(
        &self,
        submission: &OrderSubmission,
    ) -> Result<OrderReceipt, GatewayError> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        pass(self.submit_gate.as_ref()).await;
        let failure = self.submit_failure.lock().clone();
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }

        let mut books = self.orders.lock();
        let book = books.entry(submission.email.clone()).or_default();
        let seq = u32::try_from(book.len() + 1).unwrap();
        let order_number = format!("ZAM-{seq:04}");
        book.push(Order {
            seq: OrderSeq::new(seq),
            date: "2026-10-19".to_string(),
            order_number: order_number.clone(),
            customer_name: submission.customer_name.clone(),
            email: submission.email.clone(),
            phone: submission.phone.clone(),
            delivery_address: submission.delivery_address.clone(),
            products_summary: submission
                .lines
                .iter()
                .map(|line| format!("{} x{}", line.name, line.quantity))
                .collect::<Vec<_>>()
                .join(", "),
            total: submission.total,
            status: OrderStatus::InProgress,
        });
        Ok(OrderReceipt {
            order_number: Some(order_number),
        })
    }
}

pub fn product(id: u32, name: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        sku: format!("PSZ-{id:03}"),
        unit_price: Price::new(price).unwrap(),
        availability: Availability::Available,
        unit: "worek".to_string(),
    }
}

pub fn user(email: &str, name: &str) -> User {
    User {
        email: email.to_string(),
        display_name: name.to_string(),
        phone: "600100200".to_string(),
        delivery_address: format!("{name}, Polna 1"),
    }
}

pub fn order(seq: u32, order_number: &str, status: OrderStatus) -> Order {
    Order {
        seq: OrderSeq::new(seq),
        date: "2026-09-30".to_string(),
        order_number: order_number.to_string(),
        customer_name: "Jan Kowalski".to_string(),
        email: "jan@example.com".to_string(),
        phone: "600100200".to_string(),
        delivery_address: "Polna 1".to_string(),
        products_summary: "Mix starter x2".to_string(),
        total: Decimal::new(3998, 2),
        status,
    }
}
