//! Cart service used by product pages and the cart page.
//!
//! A thin facade over [`CartStore`]: every mutation is an action dispatch
//! and every read goes through the published summary.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use storefront_cart_core::{CartLineItem, Product, ProductId};

use crate::actions::CartAction;
use crate::selectors::CartSummary;
use crate::store::CartStore;

/// Cart operations for UI collaborators.
#[derive(Debug, Clone)]
pub struct CartService {
    store: CartStore,
}

impl CartService {
    /// Create a service over `store`.
    #[must_use]
    pub const fn new(store: CartStore) -> Self {
        Self { store }
    }

    /// The underlying store handle.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Hydrate the cart from storage.
    pub fn load(&self) {
        self.store.dispatch(CartAction::LoadCart);
    }

    /// Add one unit of `product`.
    pub fn add_to_cart(&self, product: Product) {
        self.store.dispatch(CartAction::add(product));
    }

    /// Add `quantity` units of `product`.
    pub fn add_quantity(&self, product: Product, quantity: NonZeroU32) {
        self.store
            .dispatch(CartAction::add_quantity(product, quantity));
    }

    /// Remove `product`'s line entirely.
    pub fn remove_from_cart(&self, product: &Product) {
        self.remove_by_id(product.id.clone());
    }

    /// Remove the line for `id` entirely.
    pub fn remove_by_id(&self, id: ProductId) {
        self.store.dispatch(CartAction::remove(id));
    }

    /// Empty the cart and its stored snapshot.
    pub fn clear_cart(&self) {
        self.store.dispatch(CartAction::ClearCart);
    }

    /// Replace the cart contents with `items`.
    pub fn sync(&self, items: Vec<CartLineItem>) {
        self.store.dispatch(CartAction::SyncCart { items });
    }

    /// Current derived cart values.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.store.summary()
    }

    /// Number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.store.select(|summary| summary.item_count)
    }

    /// Grand total (subtotal plus tax).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.store.select(|summary| summary.total)
    }

    /// Whether `id` is in the cart.
    #[must_use]
    pub fn is_in_cart(&self, id: &ProductId) -> bool {
        self.store.is_in_cart(id)
    }
}
