//! Catalog product.

use feedstore_core::{Availability, Price, ProductId};

use super::{contains_folded, search_needle};

/// A product as listed in the catalog.
///
/// `id` is the row's position in the fetch that produced it. It identifies
/// the product within one catalog snapshot only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Per-fetch sequence handle (1-based).
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Stock keeping unit code.
    pub sku: String,
    /// Price for one `unit`.
    pub unit_price: Price,
    /// Whether the product can currently be ordered.
    pub availability: Availability,
    /// Unit of sale (e.g. `szt`, `kg`, `worek`).
    pub unit: String,
}

impl Product {
    /// Returns `true` if `term` occurs in the name or SKU, ignoring case.
    ///
    /// An empty term matches every product.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        search_needle(term).is_none_or(|needle| self.matches_needle(&needle))
    }

    pub(crate) fn matches_needle(&self, needle: &str) -> bool {
        contains_folded(&self.name, needle) || contains_folded(&self.sku, needle)
    }
}
