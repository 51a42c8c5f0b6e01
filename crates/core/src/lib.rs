//! Feedstore Core - Shared types library.
//!
//! This crate provides common types used across the Feedstore components:
//! - `client` - Session, catalog, cart and order-submission state machine
//! - `cli` - Interactive terminal front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps it
//! lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Row handles, decimal prices, availability and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
