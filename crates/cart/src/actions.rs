//! The closed set of intents that can change cart state.
//!
//! Actions are plain immutable values. UI collaborators build them and hand
//! them to [`CartStore::dispatch`](crate::store::CartStore::dispatch); the
//! store owns what happens next.

use std::num::NonZeroU32;

use storefront_cart_core::{CartLineItem, Product, ProductId};

/// A cart action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Request hydration from persistent storage.
    LoadCart,
    /// Hydration finished; replaces the cart contents.
    LoadCartSuccess { items: Vec<CartLineItem> },
    /// Hydration failed; the message is surfaced in state.
    LoadCartFailure { error: String },
    /// Add `quantity` units of `product`, merging with an existing line.
    AddToCart {
        product: Product,
        quantity: NonZeroU32,
    },
    /// Drop the line with this id entirely, whatever its quantity.
    RemoveFromCart { id: ProductId },
    /// Empty the cart and remove the stored snapshot.
    ClearCart,
    /// Replace the cart contents verbatim with an external snapshot.
    SyncCart { items: Vec<CartLineItem> },
}

impl CartAction {
    /// Add a single unit of `product`.
    #[must_use]
    pub const fn add(product: Product) -> Self {
        Self::AddToCart {
            product,
            quantity: NonZeroU32::MIN,
        }
    }

    /// Add `quantity` units of `product`.
    #[must_use]
    pub const fn add_quantity(product: Product, quantity: NonZeroU32) -> Self {
        Self::AddToCart { product, quantity }
    }

    /// Remove the line for `id`.
    #[must_use]
    pub const fn remove(id: ProductId) -> Self {
        Self::RemoveFromCart { id }
    }

    /// Stable tag used in log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoadCart => "[Cart] Load Cart",
            Self::LoadCartSuccess { .. } => "[Cart] Load Cart Success",
            Self::LoadCartFailure { .. } => "[Cart] Load Cart Failure",
            Self::AddToCart { .. } => "[Cart] Add To Cart",
            Self::RemoveFromCart { .. } => "[Cart] Remove From Cart",
            Self::ClearCart => "[Cart] Clear Cart",
            Self::SyncCart { .. } => "[Cart] Sync Cart",
        }
    }

    /// Whether the action changes `items` in a way that must be written
    /// back to storage after the debounce window.
    #[must_use]
    pub const fn persists_items(&self) -> bool {
        matches!(
            self,
            Self::AddToCart { .. } | Self::RemoveFromCart { .. } | Self::SyncCart { .. }
        )
    }
}
