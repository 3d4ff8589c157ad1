//! Cart state owned by the store.

use storefront_cart_core::{CartLineItem, ProductId};

/// Authoritative in-memory cart.
///
/// `items` is unique by id and ordered by when each product was first added.
/// Only the reducer produces new values of this type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub items: Vec<CartLineItem>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CartState {
    /// Empty cart, not loading, no error.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.id == id)
    }
}

/// Hydration status published next to the derived cart values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStatus {
    pub loading: bool,
    pub error: Option<String>,
}

impl From<&CartState> for LoadStatus {
    fn from(state: &CartState) -> Self {
        Self {
            loading: state.loading,
            error: state.error.clone(),
        }
    }
}
