//! Authentication state machine.
//!
//! ```text
//! LoggedOut ──login──▶ Authenticating ──ok──▶ LoggedIn ──logout──▶ LoggedOut
//!                          ▲      └──err──▶ LoginFailed
//!                          └────retry────────────┘
//! ```
//!
//! Every login attempt and every logout starts a new [`SessionEpoch`].
//! Responses are applied only if the epoch they were requested under is
//! still current, so a reply that lands after a logout cannot resurrect
//! the previous customer's state.

use tracing::{debug, info};

use crate::error::LoginError;
use crate::gateway::GatewayError;
use crate::models::User;

/// Identifies the session a request was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    #[must_use]
    const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Where the session currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    /// A login request is in flight.
    Authenticating {
        /// Email the request was sent for.
        email: String,
    },
    LoggedIn(User),
    /// The last login attempt failed.
    LoginFailed {
        /// User-facing explanation.
        message: String,
    },
}

/// Owns the authentication state and the current user.
#[derive(Debug, Default)]
pub struct SessionManager {
    state: SessionState,
    epoch: SessionEpoch,
}

impl SessionManager {
    /// Create a logged-out session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub const fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    /// The logged-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::LoggedIn(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn(_))
    }

    /// Whether a login request is in flight. The UI disables the login form
    /// and shows a pending indicator while this holds.
    #[must_use]
    pub const fn is_authenticating(&self) -> bool {
        matches!(self.state, SessionState::Authenticating { .. })
    }

    /// Message from the last failed login, if the session is in `LoginFailed`.
    #[must_use]
    pub fn login_error(&self) -> Option<&str> {
        match &self.state {
            SessionState::LoginFailed { message } => Some(message),
            _ => None,
        }
    }

    /// Returns `true` if `epoch` is still the current session.
    #[must_use]
    pub fn is_current(&self, epoch: SessionEpoch) -> bool {
        self.epoch == epoch
    }

    /// Enter `Authenticating` for `email`.
    ///
    /// Returns the epoch the login request must be issued under.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::InProgress` if another login is in flight and
    /// `LoginError::AlreadyLoggedIn` if a user is logged in.
    pub fn begin_login(&mut self, email: &str) -> Result<SessionEpoch, LoginError> {
        match self.state {
            SessionState::Authenticating { .. } => return Err(LoginError::InProgress),
            SessionState::LoggedIn(_) => return Err(LoginError::AlreadyLoggedIn),
            SessionState::LoggedOut | SessionState::LoginFailed { .. } => {}
        }

        self.epoch = self.epoch.next();
        self.state = SessionState::Authenticating {
            email: email.to_string(),
        };
        Ok(self.epoch)
    }

    /// Apply the login response requested under `epoch`.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Cancelled` if the session moved on since the
    /// request was issued (the response is dropped), otherwise the
    /// classified login failure, which is also recorded in `LoginFailed`.
    pub fn complete_login(
        &mut self,
        epoch: SessionEpoch,
        result: Result<User, GatewayError>,
    ) -> Result<User, LoginError> {
        if !self.is_current(epoch) || !self.is_authenticating() {
            debug!("Discarding login response from a superseded session");
            return Err(LoginError::Cancelled);
        }

        match result {
            Ok(user) => {
                info!(email = %user.email, "Logged in");
                self.state = SessionState::LoggedIn(user.clone());
                Ok(user)
            }
            Err(err) => {
                let login_error = LoginError::from_gateway(&err);
                info!(error = %err, "Login failed");
                self.state = SessionState::LoginFailed {
                    message: login_error.to_string(),
                };
                Err(login_error)
            }
        }
    }

    /// Return to `LoggedOut`, dropping the user.
    ///
    /// Always succeeds. Responses to requests issued before this call will be
    /// discarded.
    pub fn logout(&mut self) {
        if let SessionState::LoggedIn(user) = &self.state {
            info!(email = %user.email, "Logged out");
        }
        self.epoch = self.epoch.next();
        self.state = SessionState::LoggedOut;
    }
}
