//! The cart store: one owned state container shared by handle.
//!
//! The composition root creates a [`CartStore`] and clones the handle into
//! every collaborator that dispatches actions or renders cart values.
//!
//! # Data Flow
//!
//! ```text
//! dispatch(action) -> reduce -> publish -> effects -> follow-up actions
//! ```
//!
//! Dispatches are serialized: each one runs the reducer, publishes the
//! result and runs effects (including any follow-up actions) before the next
//! dispatch starts. Readers never see internal state directly; they
//! subscribe to the derived [`CartSummary`] and the [`LoadStatus`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use storefront_cart_core::ProductId;
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::actions::CartAction;
use crate::config::CartConfig;
use crate::effects::CartEffects;
use crate::persistence::{CartPersistence, KeyValueStorage};
use crate::reducer::reduce;
use crate::selectors::{CartSummary, Pricing, summarize};
use crate::state::{CartState, LoadStatus};

/// Shared handle to the cart store.
///
/// This struct is cheaply cloneable via `Arc`; all clones drive the same
/// cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: Mutex<CartState>,
    summary: watch::Sender<CartSummary>,
    status: watch::Sender<LoadStatus>,
    effects: CartEffects,
    pricing: Pricing,
}

impl CartStore {
    /// Create an empty store persisting to `storage`.
    ///
    /// The store starts empty; dispatch [`CartAction::LoadCart`] to hydrate
    /// it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime (the write-behind task is
    /// spawned here).
    #[must_use]
    pub fn new(config: &CartConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        let persistence = CartPersistence::new(storage, config.storage_key.clone());
        let effects = CartEffects::spawn(persistence, config.persist_debounce);
        let state = CartState::new();

        let (summary, _) = watch::channel(summarize(&state.items, &config.pricing));
        let (status, _) = watch::channel(LoadStatus::from(&state));

        Self {
            inner: Arc::new(CartStoreInner {
                state: Mutex::new(state),
                summary,
                status,
                effects,
                pricing: config.pricing,
            }),
        }
    }

    /// Apply `action` and everything it triggers.
    ///
    /// Returns once the reducer has run for `action` and for every follow-up
    /// action its effects produced. Storage writes happen later, after the
    /// debounce window.
    #[instrument(skip_all, fields(action = action.name()))]
    pub fn dispatch(&self, action: CartAction) {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            let next = reduce(&state, &action);
            self.publish(&state, &next);
            *state = next;

            debug!(
                action = action.name(),
                lines = state.items.len(),
                loading = state.loading,
                "Applied cart action"
            );

            if let Some(follow_up) = self.inner.effects.handle(&action, &state) {
                queue.push_back(follow_up);
            }
        }
    }

    /// Subscribe to the derived cart values.
    ///
    /// The receiver is notified whenever the cart's items change. Dropping
    /// it unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSummary> {
        self.inner.summary.subscribe()
    }

    /// Subscribe to hydration status (`loading` and `error`).
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<LoadStatus> {
        self.inner.status.subscribe()
    }

    /// The current derived cart values.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.inner.summary.borrow().clone()
    }

    /// Project a value out of the current summary without cloning it.
    pub fn select<T>(&self, selector: impl FnOnce(&CartSummary) -> T) -> T {
        selector(&self.inner.summary.borrow())
    }

    /// The current hydration status.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.inner.status.borrow().clone()
    }

    /// Whether a line with `id` is in the cart.
    #[must_use]
    pub fn is_in_cart(&self, id: &ProductId) -> bool {
        self.select(|summary| summary.is_in_cart(id))
    }

    /// Write any pending cart snapshot now.
    ///
    /// Call before shutting down when the last mutations must reach storage.
    pub async fn flush(&self) {
        self.inner.effects.flush().await;
    }

    fn publish(&self, previous: &CartState, next: &CartState) {
        if previous.items != next.items {
            self.inner
                .summary
                .send_replace(summarize(&next.items, &self.inner.pricing));
        }

        let status = LoadStatus::from(next);
        self.inner.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("summary", &*self.inner.summary.borrow())
            .field("status", &*self.inner.status.borrow())
            .finish_non_exhaustive()
    }
}
