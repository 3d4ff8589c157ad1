//! Storefront Cart Core - Shared types library.
//!
//! This crate provides the types shared by the cart store and its callers:
//! - `storefront-cart` - Cart state store, selectors and persistence
//! - `cart-cli` - Command-line driver for a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product ids, catalog products, cart lines and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
