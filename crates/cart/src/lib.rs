//! Storefront cart state management.
//!
//! This crate keeps the shopping cart consistent, mirrors it to durable
//! storage and publishes derived values (counts, totals) for rendering.
//!
//! # Architecture
//!
//! Unidirectional data flow:
//! - [`actions`] - The closed set of cart intents
//! - [`reducer`] - Pure `(state, action) -> state` transitions
//! - [`selectors`] - Derived counts and totals
//! - [`effects`] - Hydration and debounced write-behind persistence
//! - [`persistence`] - Snapshot validation and storage backends
//! - [`store`] - The shared store handle tying it together
//! - [`service`] - Convenience facade for UI collaborators
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use storefront_cart::{CartConfig, CartService, CartStore, FileStorage};
//!
//! # async fn example() -> Result<(), storefront_cart::ConfigError> {
//! let config = CartConfig::from_env()?;
//! let storage = Arc::new(FileStorage::new(&config.storage_dir));
//! let cart = CartService::new(CartStore::new(&config, storage));
//!
//! cart.load();
//! println!("{} items in cart", cart.item_count());
//! cart.store().flush().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod actions;
pub mod config;
pub mod effects;
pub mod error;
pub mod persistence;
pub mod reducer;
pub mod selectors;
pub mod service;
pub mod state;
pub mod store;

pub use actions::CartAction;
pub use config::{CartConfig, ConfigError};
pub use error::StorageError;
pub use persistence::{CartPersistence, FileStorage, KeyValueStorage, MemoryStorage};
pub use selectors::{CartSummary, Pricing};
pub use service::CartService;
pub use state::{CartState, LoadStatus};
pub use store::CartStore;
