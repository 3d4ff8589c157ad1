//! Side effects triggered by cart actions.
//!
//! The store runs [`CartEffects::handle`] after the reducer with the state
//! the action produced:
//!
//! - `LoadCart` reads storage and answers with `LoadCartSuccess` or
//!   `LoadCartFailure`
//! - `AddToCart`, `RemoveFromCart` and `SyncCart` schedule a write-behind of
//!   the resulting items once mutations have been quiet for the debounce
//!   window; a newer schedule replaces the pending one
//! - `ClearCart` drops any pending write and removes the stored key
//!
//! Every storage mutation goes through one background writer task, so
//! writes and removals reach storage in the order the actions were
//! dispatched. Hydration starts a new generation: a write scheduled before
//! the last `LoadCart` is discarded instead of overwriting what was loaded.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use storefront_cart_core::CartLineItem;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::actions::CartAction;
use crate::persistence::CartPersistence;
use crate::state::CartState;

/// Commands accepted by the writer task.
#[derive(Debug)]
enum WriteCommand {
    /// Write these items once the debounce window passes quietly, unless a
    /// newer generation has been loaded by then.
    Schedule(Snapshot),
    /// Drop any pending write and remove the stored key.
    Clear,
    /// Write the pending items now, then acknowledge.
    Flush(oneshot::Sender<()>),
}

/// Items to write, tagged with the hydration generation they belong to.
#[derive(Debug)]
struct Snapshot {
    generation: u64,
    items: Vec<CartLineItem>,
}

/// Hydration counter shared by the dispatcher and the writer.
///
/// Held across each storage read (hydration) and each snapshot write, so a
/// load never interleaves with a write of the state it replaces.
type Generation = Arc<Mutex<u64>>;

/// Effect handlers bridging the reducer to storage.
#[derive(Debug)]
pub struct CartEffects {
    persistence: CartPersistence,
    generation: Generation,
    writer: mpsc::UnboundedSender<WriteCommand>,
}

impl CartEffects {
    /// Start the effect handlers and their background writer.
    ///
    /// The writer exits, flushing any pending write, once these effects are
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(persistence: CartPersistence, debounce: Duration) -> Self {
        let (writer, commands) = mpsc::unbounded_channel();
        let generation = Generation::default();
        tokio::spawn(run_writer(
            persistence.clone(),
            Arc::clone(&generation),
            debounce,
            commands,
        ));
        Self {
            persistence,
            generation,
            writer,
        }
    }

    /// React to `action` given the state it produced.
    ///
    /// Returns the follow-up action to dispatch, if any.
    #[instrument(skip_all, fields(action = action.name()))]
    pub fn handle(&self, action: &CartAction, state: &CartState) -> Option<CartAction> {
        if action.persists_items() {
            let generation = *self.generation.lock().unwrap_or_else(PoisonError::into_inner);
            self.send(WriteCommand::Schedule(Snapshot {
                generation,
                items: state.items.clone(),
            }));
            return None;
        }

        match action {
            CartAction::LoadCart => Some(self.hydrate()),
            CartAction::ClearCart => {
                self.send(WriteCommand::Clear);
                None
            }
            _ => None,
        }
    }

    /// Write any pending snapshot immediately and wait for it to land.
    pub async fn flush(&self) {
        let (done, ack) = oneshot::channel();
        self.send(WriteCommand::Flush(done));
        // A closed writer has nothing left to write.
        let _ = ack.await;
    }

    fn hydrate(&self) -> CartAction {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        let loaded = self.persistence.load();
        drop(generation);

        match loaded {
            Ok(items) => {
                debug!(
                    key = self.persistence.key(),
                    items = items.len(),
                    "Hydrated cart from storage"
                );
                CartAction::LoadCartSuccess { items }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load cart from storage");
                CartAction::LoadCartFailure {
                    error: e.to_string(),
                }
            }
        }
    }

    fn send(&self, command: WriteCommand) {
        if self.writer.send(command).is_err() {
            warn!("Cart writer has stopped, dropping storage command");
        }
    }
}

/// Background writer: coalesces scheduled snapshots and applies storage
/// commands in arrival order.
async fn run_writer(
    persistence: CartPersistence,
    generation: Generation,
    debounce: Duration,
    mut commands: mpsc::UnboundedReceiver<WriteCommand>,
) {
    let mut pending: Option<Snapshot> = None;
    let timer = tokio::time::sleep(debounce);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            // Commands first: a Clear queued behind an expired timer must
            // still cancel the write it supersedes.
            biased;

            command = commands.recv() => match command {
                Some(WriteCommand::Schedule(snapshot)) => {
                    if pending.replace(snapshot).is_some() {
                        debug!("Superseded pending cart write");
                    }
                    timer.as_mut().reset(Instant::now() + debounce);
                }
                Some(WriteCommand::Clear) => {
                    if pending.take().is_some() {
                        debug!("Cancelled pending cart write");
                    }
                    persistence.clear();
                }
                Some(WriteCommand::Flush(done)) => {
                    write_pending(&persistence, &generation, pending.take());
                    let _ = done.send(());
                }
                None => {
                    write_pending(&persistence, &generation, pending.take());
                    debug!("Cart writer stopped");
                    break;
                }
            },
            () = &mut timer, if pending.is_some() => {
                write_pending(&persistence, &generation, pending.take());
            }
        }
    }
}

/// Save `pending` unless the cart was hydrated after it was scheduled.
fn write_pending(
    persistence: &CartPersistence,
    generation: &Generation,
    pending: Option<Snapshot>,
) {
    let Some(snapshot) = pending else {
        return;
    };

    let current = generation.lock().unwrap_or_else(PoisonError::into_inner);
    if *current == snapshot.generation {
        persistence.save(&snapshot.items);
    } else {
        debug!(
            scheduled = snapshot.generation,
            current = *current,
            "Discarded cart write superseded by hydration"
        );
    }
}
