//! Locally held product catalog.

use feedstore_core::ProductId;
use tracing::{info, warn};

use crate::gateway::GatewayError;
use crate::models::{Product, search_needle};

/// The product list from the most recent successful fetch.
///
/// A failed refresh keeps the previous list and records the error, so a
/// flaky backend never empties the catalog out from under the customer.
#[derive(Debug, Default)]
pub struct CatalogCache {
    products: Vec<Product>,
    last_error: Option<String>,
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Products in backend order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by its handle in the current snapshot.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Products whose name or SKU contains `term`, ignoring case.
    ///
    /// An empty or whitespace-only term returns the whole catalog.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Product> {
        match search_needle(term) {
            None => self.products.iter().collect(),
            Some(needle) => self
                .products
                .iter()
                .filter(|product| product.matches_needle(&needle))
                .collect(),
        }
    }

    /// Why the last refresh failed, if it did.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Apply the result of a catalog fetch.
    ///
    /// Success replaces the whole list. Failure leaves it untouched.
    pub fn apply_refresh(&mut self, result: Result<Vec<Product>, GatewayError>) {
        match result {
            Ok(products) => {
                info!(count = products.len(), "Catalog refreshed");
                self.products = products;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, kept = self.products.len(), "Catalog refresh failed");
                self.last_error = Some(err.to_string());
            }
        }
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.products.clear();
        self.last_error = None;
    }
}
