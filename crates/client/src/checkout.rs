//! Order submission lifecycle.
//!
//! ```text
//! Idle ──begin──▶ Submitting ──finish──▶ Idle
//! ```
//!
//! Success and failure both return to `Idle`; a failure is recorded as the
//! last error but is not a state of its own. The flow only does the local
//! bookkeeping. The network call and the history refresh that follows a
//! success are driven by [`crate::Storefront::submit`].

use tracing::{debug, info, warn};

use crate::cart::CartBuilder;
use crate::error::SubmitError;
use crate::gateway::{OrderReceipt, OrderSubmission, SubmissionLine};
use crate::models::User;

/// Whether a submission is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
}

/// Delivery-address field and the outcome of the last submission.
#[derive(Debug, Default)]
pub struct OrderSubmissionFlow {
    phase: SubmissionPhase,
    delivery_address: String,
    last_order_number: Option<String>,
    last_error: Option<SubmitError>,
}

impl OrderSubmissionFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.phase == SubmissionPhase::Submitting
    }

    /// Address the next order will be delivered to.
    #[must_use]
    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    /// Order number the backend reported for the last successful
    /// submission, if it reported one.
    #[must_use]
    pub fn last_order_number(&self) -> Option<&str> {
        self.last_order_number.as_deref()
    }

    #[must_use]
    pub const fn last_error(&self) -> Option<&SubmitError> {
        self.last_error.as_ref()
    }

    pub fn set_delivery_address(&mut self, address: impl Into<String>) {
        self.delivery_address = address.into();
    }

    /// Restore the delivery address to the user's address on file.
    pub fn reset_address(&mut self, user: &User) {
        self.delivery_address.clone_from(&user.delivery_address);
    }

    /// Validate the preconditions, enter `Submitting` and build the payload.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::InProgress` while another submission is in
    /// flight, `SubmitError::NotLoggedIn` without a user and
    /// `SubmitError::EmptyCart` when the cart has no lines and
    /// `SubmitError::TotalTooLarge` when the total overflows. The phase is
    /// left unchanged in every error case.
    pub fn begin(
        &mut self,
        user: Option<&User>,
        cart: &CartBuilder,
    ) -> Result<OrderSubmission, SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::InProgress);
        }

        let result = match user {
            None => Err(SubmitError::NotLoggedIn),
            Some(_) if cart.is_empty() => Err(SubmitError::EmptyCart),
            Some(user) => self.payload(user, cart),
        };

        match &result {
            Ok(submission) => {
                self.phase = SubmissionPhase::Submitting;
                self.last_error = None;
                debug!(
                    lines = submission.lines.len(),
                    total = %submission.total,
                    "Submitting order"
                );
            }
            Err(err) => self.last_error = Some(err.clone()),
        }
        result
    }

    fn payload(&self, user: &User, cart: &CartBuilder) -> Result<OrderSubmission, SubmitError> {
        let total = cart.total_rounded().ok_or(SubmitError::TotalTooLarge)?;
        Ok(OrderSubmission {
            email: user.email.clone(),
            customer_name: user.display_name.clone(),
            phone: user.phone.clone(),
            delivery_address: self.delivery_address.clone(),
            lines: cart
                .lines()
                .iter()
                .map(|line| SubmissionLine {
                    name: line.product().name.clone(),
                    quantity: line.quantity(),
                    unit_price: line.product().unit_price.amount(),
                })
                .collect(),
            total,
        })
    }

    /// Record a successful submission and reset the address field.
    ///
    /// The phase stays `Submitting` until [`Self::finish`].
    pub fn succeed(&mut self, receipt: &OrderReceipt, user: &User) {
        info!(
            order_number = receipt.order_number.as_deref().unwrap_or("(none)"),
            "Order submitted"
        );
        self.last_order_number.clone_from(&receipt.order_number);
        self.last_error = None;
        self.reset_address(user);
    }

    /// Record a failed submission and return to `Idle`.
    pub fn fail(&mut self, err: &SubmitError) {
        warn!(error = %err, "Order submission failed");
        self.last_error = Some(err.clone());
        self.phase = SubmissionPhase::Idle;
    }

    /// Return to `Idle`.
    pub fn finish(&mut self) {
        self.phase = SubmissionPhase::Idle;
    }

    /// Abandon the order being assembled: empty the cart and restore the
    /// default address.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::InProgress` while a submission is in flight.
    pub fn cancel(&mut self, cart: &mut CartBuilder, user: &User) -> Result<(), SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::InProgress);
        }
        cart.clear();
        self.reset_address(user);
        self.last_error = None;
        Ok(())
    }

    /// Forget everything, including an in-flight phase.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
