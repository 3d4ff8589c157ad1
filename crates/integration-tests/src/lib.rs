//! Integration tests for the storefront cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-cart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Dispatch sequences against an in-memory store
//! - `cart_persistence` - Hydration and write-behind against real storage
//!
//! This crate only holds the shared fixtures below.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use storefront_cart::{CartConfig, CartService, CartStore, KeyValueStorage, MemoryStorage};
use storefront_cart_core::{Product, ProductId};

/// Parse a product id known to be valid.
#[must_use]
pub fn id(raw: &str) -> ProductId {
    ProductId::parse(raw).expect("fixture ids are non-empty")
}

/// A product priced in cents.
#[must_use]
pub fn product(raw_id: &str, name: &str, price_cents: i64) -> Product {
    Product::new(id(raw_id), name, Decimal::new(price_cents, 2))
}

/// A cart over fresh in-memory storage with default configuration.
#[must_use]
pub fn memory_cart() -> (Arc<MemoryStorage>, CartService) {
    memory_cart_with(&CartConfig::default())
}

/// A cart over fresh in-memory storage.
#[must_use]
pub fn memory_cart_with(config: &CartConfig) -> (Arc<MemoryStorage>, CartService) {
    let storage = Arc::new(MemoryStorage::new());
    let cart = CartService::new(CartStore::new(config, storage.clone()));
    (storage, cart)
}

/// Store `raw` under the default cart key.
pub fn seed(storage: &MemoryStorage, raw: &str) {
    storage
        .set(&CartConfig::default().storage_key, raw)
        .expect("memory storage accepts writes");
}

/// Read the raw snapshot stored under the default cart key.
#[must_use]
pub fn stored(storage: &MemoryStorage) -> Option<String> {
    storage
        .get(&CartConfig::default().storage_key)
        .expect("memory storage is readable")
}
