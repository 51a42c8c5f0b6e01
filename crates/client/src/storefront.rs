//! Composed application context.
//!
//! [`Storefront`] owns one instance of each component behind a single
//! `parking_lot::Mutex` and drives the network calls between them. The lock
//! is only ever taken inside a block that ends before the next `.await`.
//!
//! Every request records the [`SessionEpoch`](crate::SessionEpoch) it was
//! issued under; a response that comes back after a logout or a new login
//! attempt is dropped.

use std::sync::Arc;

use feedstore_core::ProductId;
use parking_lot::Mutex;
use secrecy::SecretString;
use tracing::{debug, instrument};

use crate::cart::CartBuilder;
use crate::catalog::CatalogCache;
use crate::checkout::OrderSubmissionFlow;
use crate::error::{LoginError, SubmitError};
use crate::gateway::{OrderReceipt, RemoteGateway};
use crate::history::OrderHistory;
use crate::models::User;
use crate::session::{SessionEpoch, SessionManager};

/// Snapshot-readable state of every component.
#[derive(Debug, Default)]
pub struct StorefrontState {
    session: SessionManager,
    catalog: CatalogCache,
    history: OrderHistory,
    cart: CartBuilder,
    checkout: OrderSubmissionFlow,
}

impl StorefrontState {
    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    #[must_use]
    pub const fn history(&self) -> &OrderHistory {
        &self.history
    }

    #[must_use]
    pub const fn cart(&self) -> &CartBuilder {
        &self.cart
    }

    #[must_use]
    pub const fn checkout(&self) -> &OrderSubmissionFlow {
        &self.checkout
    }

    fn reset(&mut self) {
        self.session.logout();
        self.catalog.clear();
        self.history.clear();
        self.cart.clear();
        self.checkout.clear();
    }
}

/// The client application context.
///
/// Cheap to clone; clones share the same state and gateway.
pub struct Storefront<G> {
    inner: Arc<StorefrontInner<G>>,
}

struct StorefrontInner<G> {
    gateway: G,
    state: Mutex<StorefrontState>,
}

impl<G> Clone for Storefront<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: RemoteGateway> Storefront<G> {
    /// Create a logged-out context talking to `gateway`.
    pub fn new(gateway: G) -> Self {
        Self {
            inner: Arc::new(StorefrontInner {
                gateway,
                state: Mutex::new(StorefrontState::default()),
            }),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    /// Run `f` against the current state.
    ///
    /// The state lock is held while `f` runs, so keep it short and never
    /// call back into the `Storefront` from it.
    pub fn view<R>(&self, f: impl FnOnce(&StorefrontState) -> R) -> R {
        f(&self.inner.state.lock())
    }

    /// Log in and populate the catalog and order history.
    ///
    /// The two refreshes run concurrently once the backend accepts the
    /// credentials. Their failures are recorded on the components and do not
    /// fail the login.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::InProgress` or `LoginError::AlreadyLoggedIn`
    /// without a network call, `LoginError::Rejected` or
    /// `LoginError::Connection` when the backend refuses or cannot be
    /// reached, and `LoginError::Cancelled` if the session was logged out
    /// while the request was in flight.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, LoginError> {
        let epoch = self.inner.state.lock().session.begin_login(email)?;

        let result = self.inner.gateway.login(email, password).await;

        let user = {
            let mut state = self.inner.state.lock();
            let user = state.session.complete_login(epoch, result)?;
            state.checkout.reset_address(&user);
            user
        };

        tokio::join!(
            self.refresh_catalog_under(epoch),
            self.refresh_history_under(epoch, &user.email),
        );
        Ok(user)
    }

    /// Log out and forget everything tied to the session.
    ///
    /// In-flight responses for the old session will be discarded when they
    /// arrive.
    pub fn logout(&self) {
        self.inner.state.lock().reset();
    }

    /// Re-fetch the catalog for the current session. No-op when logged out.
    pub async fn refresh_catalog(&self) {
        if let Some((epoch, _)) = self.logged_in() {
            self.refresh_catalog_under(epoch).await;
        }
    }

    /// Re-fetch the order history for the current user. No-op when logged
    /// out.
    pub async fn refresh_history(&self) {
        if let Some((epoch, email)) = self.logged_in() {
            self.refresh_history_under(epoch, &email).await;
        }
    }

    fn logged_in(&self) -> Option<(SessionEpoch, String)> {
        let state = self.inner.state.lock();
        state
            .session
            .user()
            .map(|user| (state.session.epoch(), user.email.clone()))
    }

    async fn refresh_catalog_under(&self, epoch: SessionEpoch) {
        let result = self.inner.gateway.fetch_catalog().await;

        let mut state = self.inner.state.lock();
        if !state.session.is_current(epoch) {
            debug!("Discarding catalog response from a superseded session");
            return;
        }
        state.catalog.apply_refresh(result);
    }

    async fn refresh_history_under(&self, epoch: SessionEpoch, email: &str) {
        let result = self.inner.gateway.fetch_orders(email).await;

        let mut state = self.inner.state.lock();
        if !state.session.is_current(epoch) {
            debug!("Discarding order history response from a superseded session");
            return;
        }
        state.history.apply_refresh(result);
    }

    /// Submit the cart as an order.
    ///
    /// On success the cart is emptied, the delivery address goes back to the
    /// user's default and the order history is re-fetched before this
    /// returns. On failure the cart is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::InProgress`, `SubmitError::NotLoggedIn` or
    /// `SubmitError::EmptyCart` without a network call,
    /// `SubmitError::Rejected` or `SubmitError::Connection` when the backend
    /// refuses or cannot be reached, and `SubmitError::SessionEnded` if the
    /// user logged out while the request was in flight.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<OrderReceipt, SubmitError> {
        let (epoch, submission) = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let submission = state.checkout.begin(state.session.user(), &state.cart)?;
            (state.session.epoch(), submission)
        };

        let result = self.inner.gateway.submit_order(&submission).await;

        let (receipt, email) = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            if !state.session.is_current(epoch) {
                debug!("Discarding submission response from a superseded session");
                return Err(SubmitError::SessionEnded);
            }

            let receipt = match result {
                Ok(receipt) => receipt,
                Err(err) => {
                    let err = SubmitError::from_gateway(&err);
                    state.checkout.fail(&err);
                    return Err(err);
                }
            };

            let Some(user) = state.session.user() else {
                state.checkout.finish();
                return Err(SubmitError::SessionEnded);
            };
            state.cart.clear();
            state.checkout.succeed(&receipt, user);
            (receipt, user.email.clone())
        };

        self.refresh_history_under(epoch, &email).await;

        {
            let mut state = self.inner.state.lock();
            if state.session.is_current(epoch) {
                state.checkout.finish();
            }
        }
        Ok(receipt)
    }

    /// Add one unit of catalog product `id` to the cart.
    ///
    /// Returns the line's new quantity, or `None` if the catalog has no such
    /// product.
    pub fn add_to_cart(&self, id: ProductId) -> Option<u32> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let product = state.catalog.get(id)?;
        Some(state.cart.add_line(product))
    }

    /// Remove product `id` from the cart. Returns `false` if it was not there.
    pub fn remove_from_cart(&self, id: ProductId) -> bool {
        self.inner.state.lock().cart.remove_line(id)
    }

    /// Change the quantity of product `id` by `delta`, never below 1.
    pub fn change_quantity(&self, id: ProductId, delta: i64) -> Option<u32> {
        self.inner.state.lock().cart.set_quantity_delta(id, delta)
    }

    pub fn set_delivery_address(&self, address: impl Into<String>) {
        self.inner.state.lock().checkout.set_delivery_address(address);
    }

    /// Abandon the order being assembled.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::NotLoggedIn` without a user and
    /// `SubmitError::InProgress` while a submission is in flight.
    pub fn cancel_order(&self) -> Result<(), SubmitError> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let user = state.session.user().ok_or(SubmitError::NotLoggedIn)?;
        state.checkout.cancel(&mut state.cart, user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use core::str::FromStr;

    use feedstore_core::OrderStatus;
    use rust_decimal::Decimal;
    use tokio::sync::Notify;

    use super::*;
    use crate::checkout::SubmissionPhase;
    use crate::error::CONNECTION_ERROR_MESSAGE;
    use crate::session::SessionState;
    use crate::test_support::{Failure, FakeGateway, order, product, user};

    const JAN: &str = "jan@example.com";
    const ANNA: &str = "anna@example.com";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn password(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn backend() -> FakeGateway {
        FakeGateway::new()
            .with_account("tajne", user(JAN, "Jan Kowalski"))
            .with_account("haslo", user(ANNA, "Anna Nowak"))
            .with_catalog(vec![
                product(1, "Mix starter", dec("19.99")),
                product(2, "Granulat grower", dec("5.005")),
            ])
    }

    async fn logged_in(gateway: FakeGateway) -> Storefront<FakeGateway> {
        let storefront = Storefront::new(gateway);
        storefront.login(JAN, &password("tajne")).await.unwrap();
        storefront
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        while !condition() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_login_populates_catalog_and_history() {
        let gateway = backend().with_orders(
            JAN,
            vec![
                order(1, "ZAM-0001", OrderStatus::Fulfilled),
                order(2, "ZAM-0002", OrderStatus::InProgress),
            ],
        );
        let storefront = logged_in(gateway).await;

        storefront.view(|state| {
            assert!(state.session().is_logged_in());
            assert_eq!(state.catalog().len(), 2);
            assert_eq!(state.history().len(), 2);
            assert_eq!(state.history().search("zrealizowane").len(), 1);
            assert_eq!(state.checkout().delivery_address(), "Jan Kowalski, Polna 1");
        });
        assert_eq!(storefront.gateway().calls.catalog(), 1);
        assert_eq!(storefront.gateway().calls.orders(), 1);
    }

    #[tokio::test]
    async fn test_login_rejected_then_retry() {
        let storefront = Storefront::new(backend());

        let err = storefront.login(JAN, &password("zle")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        storefront.view(|state| {
            assert_eq!(
                state.session().login_error(),
                Some("Invalid email or password")
            );
        });
        assert_eq!(storefront.gateway().calls.catalog(), 0);

        storefront.login(JAN, &password("tajne")).await.unwrap();
        storefront.view(|state| assert!(state.session().is_logged_in()));
    }

    #[tokio::test]
    async fn test_login_transport_failure() {
        let gateway = backend();
        gateway.fail_login(Some(Failure::Transport));
        let storefront = Storefront::new(gateway);

        assert_eq!(
            storefront.login(JAN, &password("tajne")).await,
            Err(LoginError::Connection)
        );
        storefront.view(|state| {
            assert_eq!(state.session().login_error(), Some(CONNECTION_ERROR_MESSAGE));
        });
    }

    #[tokio::test]
    async fn test_second_login_while_logged_in_makes_no_call() {
        let storefront = logged_in(backend()).await;
        assert_eq!(
            storefront.login(ANNA, &password("haslo")).await,
            Err(LoginError::AlreadyLoggedIn)
        );
        assert_eq!(storefront.gateway().calls.login(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure_does_not_fail_login() {
        let gateway = backend();
        gateway.fail_catalog(Some(Failure::Rejected(Some("Arkusz niedostępny".to_string()))));
        let storefront = logged_in(gateway).await;

        storefront.view(|state| {
            assert!(state.session().is_logged_in());
            assert!(state.catalog().is_empty());
            assert!(state.catalog().last_error().unwrap().contains("Arkusz"));
        });
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_catalog() {
        let storefront = logged_in(backend()).await;
        storefront.gateway().fail_catalog(Some(Failure::Transport));

        storefront.refresh_catalog().await;
        storefront.view(|state| assert_eq!(state.catalog().len(), 2));
    }

    #[tokio::test]
    async fn test_cart_lines_survive_catalog_price_change() {
        let storefront = logged_in(backend()).await;
        storefront.add_to_cart(ProductId::new(1));

        storefront
            .gateway()
            .set_catalog(vec![product(1, "Mix starter", dec("25.00"))]);
        storefront.refresh_catalog().await;
        storefront.add_to_cart(ProductId::new(1));

        storefront.view(|state| {
            assert_eq!(state.catalog().products()[0].unit_price.amount(), dec("25"));
            assert_eq!(state.cart().total(), Some(dec("39.98")));
        });
    }

    #[tokio::test]
    async fn test_submit_empty_cart_makes_no_call() {
        let storefront = logged_in(backend()).await;

        let err = storefront.submit().await.unwrap_err();
        assert_eq!(err, SubmitError::EmptyCart);
        assert_eq!(storefront.gateway().calls.submit(), 0);
    }

    #[tokio::test]
    async fn test_submit_requires_login() {
        let storefront = Storefront::new(backend());
        assert_eq!(storefront.submit().await, Err(SubmitError::NotLoggedIn));
        assert_eq!(storefront.gateway().calls.submit(), 0);
    }

    #[tokio::test]
    async fn test_submit_success() {
        let storefront = logged_in(backend()).await;
        for _ in 0..3 {
            storefront.add_to_cart(ProductId::new(1));
        }
        storefront.add_to_cart(ProductId::new(2));
        storefront.change_quantity(ProductId::new(2), 1);
        storefront.set_delivery_address("Leśna 5, Ostrów");

        let receipt = storefront.submit().await.unwrap();
        assert_eq!(receipt.order_number.as_deref(), Some("ZAM-0001"));

        let recorded = storefront.gateway().orders_of(JAN);
        assert_eq!(recorded[0].total, dec("69.98"));
        assert_eq!(recorded[0].delivery_address, "Leśna 5, Ostrów");

        storefront.view(|state| {
            assert!(state.cart().is_empty());
            assert_eq!(state.history().len(), 1);
            assert!(state.history().find_by_number("ZAM-0001").is_some());
            assert_eq!(state.checkout().delivery_address(), "Jan Kowalski, Polna 1");
            assert_eq!(state.checkout().last_order_number(), Some("ZAM-0001"));
            assert_eq!(state.checkout().phase(), SubmissionPhase::Idle);
        });
        assert_eq!(storefront.gateway().calls.orders(), 2);
    }

    #[tokio::test]
    async fn test_history_failure_after_submit_still_clears_cart() {
        let storefront = logged_in(backend()).await;
        storefront.add_to_cart(ProductId::new(1));
        storefront.gateway().fail_orders(Some(Failure::Transport));

        assert!(storefront.submit().await.is_ok());
        storefront.view(|state| {
            assert!(state.cart().is_empty());
            assert!(state.history().is_empty());
            assert!(state.history().last_error().is_some());
            assert_eq!(state.checkout().phase(), SubmissionPhase::Idle);
        });
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_cart() {
        let storefront = logged_in(backend()).await;
        storefront.add_to_cart(ProductId::new(1));

        storefront
            .gateway()
            .fail_submit(Some(Failure::Rejected(Some("Brak towaru".to_string()))));
        let err = storefront.submit().await.unwrap_err();
        assert_eq!(err.to_string(), "Order submission failed: Brak towaru");

        storefront.gateway().fail_submit(Some(Failure::Transport));
        assert_eq!(storefront.submit().await, Err(SubmitError::Connection));

        storefront.view(|state| {
            assert_eq!(state.cart().len(), 1);
            assert_eq!(state.checkout().phase(), SubmissionPhase::Idle);
            assert_eq!(state.checkout().last_error(), Some(&SubmitError::Connection));
        });

        storefront.gateway().fail_submit(None);
        assert!(storefront.submit().await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_submit_rejected_without_call() {
        let gate = Arc::new(Notify::new());
        let storefront = logged_in(backend().with_submit_gate(Arc::clone(&gate))).await;
        storefront.add_to_cart(ProductId::new(1));

        let first = tokio::spawn({
            let storefront = storefront.clone();
            async move { storefront.submit().await }
        });
        wait_for(|| storefront.gateway().calls.submit() == 1).await;

        assert_eq!(storefront.submit().await, Err(SubmitError::InProgress));
        assert_eq!(storefront.cancel_order(), Err(SubmitError::InProgress));
        assert_eq!(storefront.gateway().calls.submit(), 1);

        gate.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(storefront.gateway().calls.submit(), 1);
    }

    #[tokio::test]
    async fn test_catalog_response_after_logout_is_discarded() {
        let gate = Arc::new(Notify::new());
        let storefront = Storefront::new(backend().with_catalog_gate(Arc::clone(&gate)));

        let login = tokio::spawn({
            let storefront = storefront.clone();
            async move { storefront.login(JAN, &password("tajne")).await }
        });
        wait_for(|| storefront.gateway().calls.catalog() == 1).await;

        storefront.logout();
        gate.notify_one();
        assert!(login.await.unwrap().is_ok());

        storefront.view(|state| {
            assert_eq!(state.session().state(), &SessionState::LoggedOut);
            assert!(state.catalog().is_empty());
        });
    }

    #[tokio::test]
    async fn test_login_response_after_logout_is_discarded() {
        let gate = Arc::new(Notify::new());
        let storefront = Storefront::new(backend().with_login_gate(Arc::clone(&gate)));

        let login = tokio::spawn({
            let storefront = storefront.clone();
            async move { storefront.login(JAN, &password("tajne")).await }
        });
        wait_for(|| storefront.gateway().calls.login() == 1).await;

        storefront.logout();
        gate.notify_one();
        assert_eq!(login.await.unwrap(), Err(LoginError::Cancelled));

        storefront.view(|state| assert!(!state.session().is_logged_in()));
        assert_eq!(storefront.gateway().calls.catalog(), 0);
    }

    #[tokio::test]
    async fn test_submit_response_after_logout_is_discarded() {
        let gate = Arc::new(Notify::new());
        let storefront = logged_in(backend().with_submit_gate(Arc::clone(&gate))).await;
        storefront.add_to_cart(ProductId::new(1));

        let submit = tokio::spawn({
            let storefront = storefront.clone();
            async move { storefront.submit().await }
        });
        wait_for(|| storefront.gateway().calls.submit() == 1).await;

        storefront.logout();
        gate.notify_one();
        assert_eq!(submit.await.unwrap(), Err(SubmitError::SessionEnded));

        storefront.view(|state| {
            assert!(state.history().is_empty());
            assert_eq!(state.checkout().last_order_number(), None);
        });
    }

    #[tokio::test]
    async fn test_history_response_for_previous_user_is_discarded() {
        let gate = Arc::new(Notify::new());
        let gateway = backend()
            .with_orders(JAN, vec![order(1, "ZAM-0001", OrderStatus::Fulfilled)])
            .with_orders_gate(Arc::clone(&gate));
        let storefront = Storefront::new(gateway);

        let jan = tokio::spawn({
            let storefront = storefront.clone();
            async move { storefront.login(JAN, &password("tajne")).await }
        });
        wait_for(|| storefront.gateway().calls.orders() == 1).await;

        storefront.logout();
        let anna = tokio::spawn({
            let storefront = storefront.clone();
            async move { storefront.login(ANNA, &password("haslo")).await }
        });
        wait_for(|| storefront.gateway().calls.orders() == 2).await;

        gate.notify_one();
        gate.notify_one();
        assert!(jan.await.unwrap().is_ok());
        assert_eq!(anna.await.unwrap().unwrap().email, ANNA);

        storefront.view(|state| {
            assert_eq!(state.session().user().unwrap().email, ANNA);
            assert!(state.history().is_empty());
            assert!(state.history().find_by_number("ZAM-0001").is_none());
        });
    }

    #[tokio::test]
    async fn test_history_refresh_after_submit_discarded_on_logout() {
        let gate = Arc::new(Notify::new());
        let storefront = Storefront::new(backend().with_orders_gate(Arc::clone(&gate)));

        let login = tokio::spawn({
            let storefront = storefront.clone();
            async move { storefront.login(JAN, &password("tajne")).await }
        });
        wait_for(|| storefront.gateway().calls.orders() == 1).await;
        gate.notify_one();
        login.await.unwrap().unwrap();

        storefront.add_to_cart(ProductId::new(1));
        let submit = tokio::spawn({
            let storefront = storefront.clone();
            async move { storefront.submit().await }
        });
        wait_for(|| storefront.gateway().calls.orders() == 2).await;

        storefront.logout();
        gate.notify_one();
        let receipt = submit.await.unwrap().unwrap();

        assert_eq!(receipt.order_number.as_deref(), Some("ZAM-0001"));
        assert_eq!(storefront.gateway().orders_of(JAN).len(), 1);
        storefront.view(|state| {
            assert!(!state.session().is_logged_in());
            assert!(state.history().is_empty());
            assert_eq!(state.checkout().phase(), SubmissionPhase::Idle);
        });
    }

    #[tokio::test]
    async fn test_logout_then_other_user_leaves_no_trace() {
        let storefront = logged_in(backend()).await;
        storefront.add_to_cart(ProductId::new(1));
        storefront.submit().await.unwrap();
        storefront.add_to_cart(ProductId::new(2));
        storefront.set_delivery_address("Somewhere else");

        storefront.logout();
        storefront.view(|state| {
            assert!(state.catalog().is_empty());
            assert!(state.history().is_empty());
            assert!(state.cart().is_empty());
            assert_eq!(state.checkout().delivery_address(), "");
            assert_eq!(state.checkout().last_order_number(), None);
        });

        storefront.login(ANNA, &password("haslo")).await.unwrap();
        storefront.view(|state| {
            assert_eq!(state.session().user().unwrap().email, ANNA);
            assert!(state.history().is_empty());
            assert!(state.cart().is_empty());
            assert_eq!(state.checkout().delivery_address(), "Anna Nowak, Polna 1");
        });
    }

    #[tokio::test]
    async fn test_cancel_order() {
        let storefront = logged_in(backend()).await;
        storefront.add_to_cart(ProductId::new(1));
        storefront.set_delivery_address("Leśna 5");

        storefront.cancel_order().unwrap();
        storefront.view(|state| {
            assert!(state.cart().is_empty());
            assert_eq!(state.checkout().delivery_address(), "Jan Kowalski, Polna 1");
        });
    }

    #[tokio::test]
    async fn test_cart_operations_on_unknown_product() {
        let storefront = logged_in(backend()).await;
        assert_eq!(storefront.add_to_cart(ProductId::new(99)), None);
        assert!(!storefront.remove_from_cart(ProductId::new(1)));
        assert_eq!(storefront.change_quantity(ProductId::new(1), 1), None);
    }
}
