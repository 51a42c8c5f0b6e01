//! Errors surfaced to the user.
//!
//! Login and submission failures are shown to the customer, so each variant's
//! `Display` text is the user-facing message. The three failure classes
//! (transport, backend rejection, local validation) always produce different
//! messages.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Shown when the backend rejects a login without giving a reason.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
/// Shown when the backend could not be reached or answered with garbage.
pub const CONNECTION_ERROR_MESSAGE: &str = "Could not connect to the server";
/// Shown when the backend rejects an order without giving a reason.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Errors that can occur during login.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// A login request is already in flight.
    #[error("A login attempt is already in progress")]
    InProgress,

    /// A user is already logged in.
    #[error("Already logged in, log out first")]
    AlreadyLoggedIn,

    /// The backend refused the credentials.
    #[error("{0}")]
    Rejected(String),

    /// The request failed or the response was unreadable.
    #[error("Could not connect to the server")]
    Connection,

    /// The session ended (logout) before the response arrived.
    #[error("Login was cancelled")]
    Cancelled,
}

impl LoginError {
    /// Classify a gateway failure for a login request.
    #[must_use]
    pub fn from_gateway(err: &GatewayError) -> Self {
        if err.is_transport() {
            Self::Connection
        } else {
            Self::Rejected(
                err.backend_message()
                    .unwrap_or(INVALID_CREDENTIALS_MESSAGE)
                    .to_string(),
            )
        }
    }
}

/// Errors that can occur when submitting an order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Nobody is logged in.
    #[error("Log in before placing an order")]
    NotLoggedIn,

    /// The cart has no lines.
    #[error("Add products to the order before submitting")]
    EmptyCart,

    /// The cart total does not fit in a decimal amount.
    #[error("The order total is too large, reduce the quantities")]
    TotalTooLarge,

    /// Another submission is still in flight.
    #[error("An order is already being submitted")]
    InProgress,

    /// The backend refused the order.
    #[error("Order submission failed: {0}")]
    Rejected(String),

    /// The request failed or the response was unreadable.
    #[error("Could not connect to the server")]
    Connection,

    /// The session ended (logout) before the response arrived.
    #[error("The session ended before the order was confirmed")]
    SessionEnded,
}

impl SubmitError {
    /// Classify a gateway failure for a submission request.
    #[must_use]
    pub fn from_gateway(err: &GatewayError) -> Self {
        if err.is_transport() {
            Self::Connection
        } else {
            Self::Rejected(
                err.backend_message()
                    .unwrap_or(UNKNOWN_ERROR_MESSAGE)
                    .to_string(),
            )
        }
    }

    /// Returns `true` for failures detected before any request was sent.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::NotLoggedIn | Self::EmptyCart | Self::TotalTooLarge | Self::InProgress
        )
    }
}
