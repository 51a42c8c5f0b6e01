//! Feedstore client library.
//!
//! Client-side state for a customer ordering animal feed from a remote
//! backend: authentication, local mirrors of the product catalog and order
//! history, the cart, and the order-submission lifecycle.
//!
//! # Architecture
//!
//! - [`gateway`] - Typed boundary to the four backend operations (reqwest)
//! - [`session`] - Authentication state machine and the current user
//! - [`catalog`] - Normalized product list with search
//! - [`history`] - Normalized order history with search
//! - [`cart`] - Cart lines and the derived total
//! - [`checkout`] - Order submission state machine
//! - [`storefront`] - Composed application context driving the above
//!
//! Each component is a plain state object with synchronous transition
//! functions. Only [`storefront::Storefront`] awaits the network, and it never
//! holds the state lock across an `.await`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod models;
pub mod session;
pub mod storefront;

#[cfg(test)]
mod test_support;

pub use cart::{CartBuilder, CartLine};
pub use catalog::CatalogCache;
pub use checkout::{OrderSubmissionFlow, SubmissionPhase};
pub use config::{ClientConfig, ConfigError};
pub use error::{LoginError, SubmitError};
pub use gateway::{GatewayError, HttpGateway, OrderReceipt, OrderSubmission, RemoteGateway};
pub use history::OrderHistory;
pub use models::{Order, Product, User};
pub use session::{SessionEpoch, SessionManager, SessionState};
pub use storefront::{Storefront, StorefrontState};
