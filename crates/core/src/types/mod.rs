//! Core types for Feedstore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{MONEY_DECIMAL_PLACES, Price, PriceError, round_money};
pub use status::*;
