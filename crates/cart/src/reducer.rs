//! Pure cart state transitions.
//!
//! [`reduce`] maps the current state and one action to the next state. It
//! never fails and never touches storage; side effects live in
//! [`effects`](crate::effects).

use storefront_cart_core::{CartLineItem, Product, ProductId};

use crate::actions::CartAction;
use crate::state::CartState;

/// Compute the state that follows `action`.
///
/// Payloads are assumed valid: quantities are positive by construction and
/// stored snapshots are validated before they become actions.
#[must_use]
pub fn reduce(state: &CartState, action: &CartAction) -> CartState {
    match action {
        CartAction::LoadCart => CartState {
            loading: true,
            error: None,
            ..state.clone()
        },
        CartAction::LoadCartSuccess { items } => CartState {
            items: items.clone(),
            loading: false,
            error: None,
        },
        CartAction::LoadCartFailure { error } => CartState {
            loading: false,
            error: Some(error.clone()),
            ..state.clone()
        },
        CartAction::AddToCart { product, quantity } => CartState {
            items: add_item(&state.items, product, quantity.get()),
            ..state.clone()
        },
        CartAction::RemoveFromCart { id } => CartState {
            items: remove_item(&state.items, id),
            ..state.clone()
        },
        CartAction::ClearCart => CartState {
            items: Vec::new(),
            ..state.clone()
        },
        CartAction::SyncCart { items } => CartState {
            items: items.clone(),
            ..state.clone()
        },
    }
}

/// Merge by id: an existing line only has its quantity bumped, a new product
/// is appended at the end.
fn add_item(items: &[CartLineItem], product: &Product, quantity: u32) -> Vec<CartLineItem> {
    let mut next = items.to_vec();
    match next.iter_mut().find(|item| item.id == product.id) {
        Some(existing) => {
            existing.quantity = existing.quantity.saturating_add(quantity);
        }
        None => next.push(CartLineItem::from_product(product.clone(), quantity)),
    }
    next
}

fn remove_item(items: &[CartLineItem], id: &ProductId) -> Vec<CartLineItem> {
    items.iter().filter(|item| &item.id != id).cloned().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;

    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, price_cents: i64) -> Product {
        Product::new(
            ProductId::parse(id).unwrap(),
            format!("Product {id}"),
            Decimal::new(price_cents, 2),
        )
    }

    fn add(state: &CartState, id: &str, quantity: u32) -> CartState {
        reduce(
            state,
            &CartAction::add_quantity(product(id, 500), NonZeroU32::new(quantity).unwrap()),
        )
    }

    fn ids(state: &CartState) -> Vec<&str> {
        state.items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_load_cart_sets_loading_and_clears_error() {
        let state = CartState {
            error: Some("boom".to_string()),
            ..CartState::new()
        };

        let next = reduce(&state, &CartAction::LoadCart);

        assert!(next.loading);
        assert!(next.error.is_none());
    }

    #[test]
    fn test_load_cart_success_replaces_items() {
        let state = add(&CartState::new(), "old", 1);
        let loaded = vec![CartLineItem::from_product(product("new", 100), 4)];

        let next = reduce(
            &CartState {
                loading: true,
                ..state
            },
            &CartAction::LoadCartSuccess {
                items: loaded.clone(),
            },
        );

        assert_eq!(next.items, loaded);
        assert!(!next.loading);
        assert!(next.error.is_none());
    }

    #[test]
    fn test_load_cart_failure_keeps_items() {
        let state = CartState {
            loading: true,
            ..add(&CartState::new(), "a", 2)
        };

        let next = reduce(
            &state,
            &CartAction::LoadCartFailure {
                error: "disk gone".to_string(),
            },
        );

        assert!(!next.loading);
        assert_eq!(next.error.as_deref(), Some("disk gone"));
        assert_eq!(next.items, state.items);
    }

    #[test]
    fn test_add_accumulates_quantity() {
        let state = add(&CartState::new(), "p", 2);
        let state = add(&state, "p", 3);

        assert_eq!(state.items.len(), 1);
        assert_eq!(state.find(&ProductId::parse("p").unwrap()).unwrap().quantity, 5);
    }

    #[test]
    fn test_add_existing_keeps_other_fields() {
        let state = add(&CartState::new(), "p", 1);
        let renamed = Product {
            product_name: "Renamed".to_string(),
            price: Decimal::new(1, 0),
            ..product("p", 500)
        };

        let next = reduce(&state, &CartAction::add(renamed));
        let line = next.items.first().unwrap();

        assert_eq!(line.product_name, "Product p");
        assert_eq!(line.price, Decimal::new(500, 2));
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_add_appends_new_products_in_order() {
        let mut state = CartState::new();
        for id in ["c", "a", "b", "a", "c"] {
            state = add(&state, id, 1);
        }

        assert_eq!(ids(&state), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_add_never_duplicates_ids() {
        let mut state = CartState::new();
        for (i, id) in ["x", "y", "x", "z", "y", "x"].iter().enumerate() {
            state = add(&state, id, u32::try_from(i).unwrap() + 1);
        }

        let mut seen = ids(&state);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), state.items.len());
    }

    #[test]
    fn test_add_saturates_instead_of_overflowing() {
        let state = add(&CartState::new(), "p", u32::MAX);
        let state = add(&state, "p", 1);
        assert_eq!(state.items.first().unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_remove_drops_whole_line() {
        let state = add(&CartState::new(), "a", 3);
        let state = add(&state, "b", 1);

        let next = reduce(&state, &CartAction::remove(ProductId::parse("a").unwrap()));

        assert_eq!(ids(&next), vec!["b"]);
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let state = add(&CartState::new(), "a", 1);

        let next = reduce(&state, &CartAction::remove(ProductId::parse("zzz").unwrap()));

        assert_eq!(next, state);
    }

    #[test]
    fn test_clear_is_idempotent_and_keeps_status() {
        let state = CartState {
            error: Some("stale".to_string()),
            ..add(&CartState::new(), "a", 1)
        };

        let once = reduce(&state, &CartAction::ClearCart);
        let twice = reduce(&once, &CartAction::ClearCart);

        assert!(once.items.is_empty());
        assert_eq!(once, twice);
        assert_eq!(twice.error.as_deref(), Some("stale"));
    }

    #[test]
    fn test_sync_replaces_without_merge() {
        let state = add(&CartState::new(), "a", 2);
        let items = vec![
            CartLineItem::from_product(product("a", 500), 7),
            CartLineItem::from_product(product("b", 100), 1),
        ];

        let next = reduce(
            &state,
            &CartAction::SyncCart {
                items: items.clone(),
            },
        );

        assert_eq!(next.items, items);
    }
}
