//! Domain types mirrored from the backend.
//!
//! These are validated domain objects, separate from the loose JSON records
//! the backend sends (see `gateway::conversions`).

pub mod order;
pub mod product;
pub mod user;

pub use order::Order;
pub use product::Product;
pub use user::User;

/// Lowercased search needle, or `None` when the term matches everything.
///
/// Only an empty or whitespace-only term is special. Any other term is used
/// verbatim, surrounding spaces included.
pub(crate) fn search_needle(term: &str) -> Option<String> {
    if term.trim().is_empty() {
        None
    } else {
        Some(term.to_lowercase())
    }
}

/// Case-insensitive substring test against an already lowercased needle.
pub(crate) fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
