//! RocketShoes Core - Shared types library.
//!
//! This crate provides the types used across all RocketShoes components:
//! - `cart` - Cart store, catalog client and local persistence
//! - `cli` - Command-line driver for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure transitions - no I/O, no
//! storage access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, catalog products, stock and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
