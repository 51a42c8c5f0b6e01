//! Status enums for catalog and order rows.
//!
//! The backend reports both values as free text in Polish. Parsing is total:
//! every input maps to some variant, so a backend vocabulary change degrades
//! to [`Availability::Unavailable`] or [`OrderStatus::Other`] instead of failing
//! a whole fetch.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Label the backend uses for an order that is still being processed.
pub const STATUS_IN_PROGRESS: &str = "W realizacji";
/// Label the backend uses for a completed order.
pub const STATUS_FULFILLED: &str = "Zrealizowane";

/// Product availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
}

impl Availability {
    /// Map a backend availability label.
    ///
    /// `Tak` (and its English equivalents) means available; anything else does
    /// not.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "tak" | "yes" | "true" | "available" => Self::Available,
            _ => Self::Unavailable,
        }
    }

    /// Returns `true` for [`Availability::Available`].
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Order status as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    InProgress,
    Fulfilled,
    /// Any label outside the known vocabulary, kept verbatim.
    Other(String),
}

impl OrderStatus {
    /// Map a backend status label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case(STATUS_IN_PROGRESS) {
            Self::InProgress
        } else if trimmed.eq_ignore_ascii_case(STATUS_FULFILLED) {
            Self::Fulfilled
        } else {
            Self::Other(trimmed.to_owned())
        }
    }

    /// The backend label for this status.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::Fulfilled => STATUS_FULFILLED,
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
