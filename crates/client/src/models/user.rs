//! Logged-in customer identity.

/// The customer a session belongs to.
///
/// Created from a successful login response and held until logout. The
/// delivery address is the on-file default that new orders start from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Email the backend knows the customer by.
    pub email: String,
    /// Name printed on orders.
    pub display_name: String,
    /// Contact phone number.
    pub phone: String,
    /// Default delivery address.
    pub delivery_address: String,
}
