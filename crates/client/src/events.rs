//! Change notifications for client state.
//!
//! Cart, wishlist and auth session all publish on one [`ChangeBus`].
//! Every store handle cloned from the same client shares the bus, so a
//! badge, a product card and a cart page observe the same stream.

use tokio::sync::broadcast;

/// Capacity of the broadcast channel. Slow subscribers that fall further
/// behind see `RecvError::Lagged` and should re-read the stores.
const CHANNEL_CAPACITY: usize = 64;

/// A change to persisted client state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    CartUpdated { entries: usize, total_quantity: u64 },
    WishlistUpdated { count: usize },
    AuthChanged { signed_in: bool },
}

/// Publish/subscribe channel for [`StoreEvent`]s.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to current subscribers.
    pub fn publish(&self, event: StoreEvent) {
        // No subscribers is not an error
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(?event, "no subscribers for store event");
        }
    }

    /// Receive every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
