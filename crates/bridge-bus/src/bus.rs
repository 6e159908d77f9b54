//! Publishing side of the broadcast bus.

use crate::subscriber::{BusSubscription, EnvelopeStream};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for pushing event envelopes to all live subscribers.
///
/// This is the `emit_broadcast` contract exposed to the fan-out sink; the
/// sink never learns who is listening.
pub trait EnvelopeSink: Send + Sync {
    /// Publish an envelope to every live subscriber.
    ///
    /// Returns the number of subscribers that received it. Zero subscribers
    /// is a no-op, not an error.
    fn emit_broadcast(&self, envelope: String) -> usize;
}

/// In-memory broadcast bus backed by `tokio::sync::broadcast`.
///
/// Envelopes are shared as `Arc<str>` so fanning out to many subscribers
/// never copies the payload.
pub struct BroadcastBus {
    sender: broadcast::Sender<Arc<str>>,
    envelopes_published: AtomicU64,
    capacity: usize,
}

impl BroadcastBus {
    /// Create a bus with the default per-subscriber capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a specific per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            envelopes_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Attach a new subscriber.
    ///
    /// The subscription only sees envelopes published after this call.
    #[must_use]
    pub fn subscribe(&self) -> BusSubscription {
        debug!(subscribers = self.sender.receiver_count() + 1, "bus subscription created");
        BusSubscription::new(self.sender.subscribe())
    }

    /// Attach a new subscriber as a `Stream` of envelopes.
    #[must_use]
    pub fn stream(&self) -> EnvelopeStream {
        EnvelopeStream::new(self.subscribe())
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total envelopes published since creation.
    #[must_use]
    pub fn envelopes_published(&self) -> u64 {
        self.envelopes_published.load(Ordering::Relaxed)
    }

    /// Per-subscriber buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeSink for BroadcastBus {
    fn emit_broadcast(&self, envelope: String) -> usize {
        self.envelopes_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(Arc::from(envelope)) {
            Ok(receivers) => {
                trace!(receivers, "envelope broadcast");
                receivers
            }
            Err(_) => {
                // No receivers attached; the envelope is dropped.
                trace!("envelope dropped (no subscribers)");
                0
            }
        }
    }
}
