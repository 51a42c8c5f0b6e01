//! Historical order record.

use feedstore_core::{OrderSeq, OrderStatus};
use rust_decimal::Decimal;

use super::{contains_folded, search_needle};

/// An order as recorded by the backend.
///
/// Read-only on the client. Orders only enter local state through a history
/// fetch, never by echoing a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Per-fetch sequence handle (1-based).
    pub seq: OrderSeq,
    /// Order date as the backend formats it.
    pub date: String,
    /// Backend-issued order number.
    pub order_number: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub delivery_address: String,
    /// Free-text list of ordered products.
    pub products_summary: String,
    /// Order total as recorded by the backend.
    pub total: Decimal,
    pub status: OrderStatus,
}

impl Order {
    /// Returns `true` if `term` occurs in the order number or status label,
    /// ignoring case.
    ///
    /// An empty term matches every order.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        search_needle(term).is_none_or(|needle| self.matches_needle(&needle))
    }

    pub(crate) fn matches_needle(&self, needle: &str) -> bool {
        contains_folded(&self.order_number, needle) || contains_folded(self.status.label(), needle)
    }
}
