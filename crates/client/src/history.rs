//! The logged-in customer's past orders.

use tracing::{info, warn};

use crate::gateway::GatewayError;
use crate::models::{Order, search_needle};

/// Order history from the most recent successful fetch.
#[derive(Debug, Default)]
pub struct OrderHistory {
    orders: Vec<Order>,
    last_error: Option<String>,
}

impl OrderHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Find an order by its backend order number.
    #[must_use]
    pub fn find_by_number(&self, order_number: &str) -> Option<&Order> {
        self.orders
            .iter()
            .find(|order| order.order_number == order_number)
    }

    /// Orders whose number or status label contains `term`, ignoring case.
    ///
    /// An empty or whitespace-only term returns every order.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Order> {
        let Some(needle) = search_needle(term) else {
            return self.orders.iter().collect();
        };
        self.orders
            .iter()
            .filter(|order| order.matches_needle(&needle))
            .collect()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Apply the result of a history fetch. Failure keeps the previous list.
    pub fn apply_refresh(&mut self, result: Result<Vec<Order>, GatewayError>) {
        match result {
            Ok(orders) => {
                info!(count = orders.len(), "Order history refreshed");
                self.orders = orders;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, kept = self.orders.len(), "Order history refresh failed");
                self.last_error = Some(err.to_string());
            }
        }
    }

    pub fn clear(&mut self) {
        self.orders.clear();
        self.last_error = None;
    }
}
