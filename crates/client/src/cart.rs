//! The order being assembled.
//!
//! Cart mutations are total: unknown product handles are ignored and
//! quantities are clamped, so there is no cart error type.

use feedstore_core::{ProductId, round_money};
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::Product;

/// One product in the cart.
///
/// Holds a snapshot of the product taken when it was first added, so a later
/// catalog refresh never changes the price of a line already in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    product: Product,
    quantity: u32,
}

impl CartLine {
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// Always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price * quantity` at full precision, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.product.unit_price.times(self.quantity)
    }
}

/// Ordered list of cart lines, at most one per product.
#[derive(Debug, Default, Clone)]
pub struct CartBuilder {
    lines: Vec<CartLine>,
}

impl CartBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in the order products were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> Option<u32> {
        self.line(id).map(CartLine::quantity)
    }

    fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == id)
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product.id == id)
    }

    /// Add one unit of `product`.
    ///
    /// An existing line is incremented in place; otherwise a new line with
    /// quantity 1 is appended. Returns the line's new quantity.
    pub fn add_line(&mut self, product: &Product) -> u32 {
        let quantity = if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(1);
            line.quantity
        } else {
            self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            });
            1
        };
        debug!(product = %product.name, quantity, "Cart line added");
        self.debug_check();
        quantity
    }

    /// Remove the line for `id` regardless of its quantity.
    ///
    /// Returns `false` if there was no such line.
    pub fn remove_line(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product.id != id);
        let removed = self.lines.len() != before;
        if removed {
            debug!(product_id = %id, "Cart line removed");
        }
        removed
    }

    /// Adjust the quantity of the line for `id` by `delta`, never going
    /// below 1.
    ///
    /// Returns the new quantity, or `None` if there was no such line.
    pub fn set_quantity_delta(&mut self, id: ProductId, delta: i64) -> Option<u32> {
        let line = self.line_mut(id)?;
        let target = i64::from(line.quantity).saturating_add(delta);
        line.quantity = u32::try_from(target.max(1)).unwrap_or(u32::MAX);
        let quantity = line.quantity;
        self.debug_check();
        Some(quantity)
    }

    /// Exact sum of line totals.
    ///
    /// Returns `None` if a line total or the sum does not fit in a
    /// `Decimal`, which only happens with absurd prices or quantities.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.lines.iter().try_fold(Decimal::ZERO, |sum, line| {
            line.line_total().and_then(|amount| sum.checked_add(amount))
        })
    }

    /// [`Self::total`] rounded to two decimal places.
    #[must_use]
    pub fn total_rounded(&self) -> Option<Decimal> {
        self.total().map(round_money)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn debug_check(&self) {
        debug_assert!(self.lines.iter().all(|line| line.quantity >= 1));
        debug_assert!(self.lines.iter().enumerate().all(|(i, line)| {
            self.lines
                .iter()
                .take(i)
                .all(|other| other.product.id != line.product.id)
        }));
    }
}
