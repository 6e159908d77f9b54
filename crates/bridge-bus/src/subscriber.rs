//! Subscription side of the broadcast bus.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("broadcast bus closed")]
    Closed,
}

/// A handle receiving envelopes from the bus.
///
/// A subscriber that falls more than the channel capacity behind skips the
/// dropped envelopes and keeps receiving from the oldest retained one.
pub struct BusSubscription {
    receiver: broadcast::Receiver<Arc<str>>,
}

impl BusSubscription {
    pub(crate) fn new(receiver: broadcast::Receiver<Arc<str>>) -> Self {
        Self { receiver }
    }

    /// Receive the next envelope.
    ///
    /// Returns `None` when the bus has been dropped. Lag is absorbed here:
    /// dropped envelopes are logged and reception continues.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(dropped = count, "subscriber lagged, oldest envelopes dropped");
                    continue;
                }
            }
        }
    }

    /// Receive without blocking.
    pub fn try_recv(&mut self) -> Result<Option<Arc<str>>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => return Ok(Some(envelope)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            }
        }
    }
}

/// `Stream` wrapper over a subscription, for use with stream combinators.
pub struct EnvelopeStream {
    subscription: BusSubscription,
}

impl EnvelopeStream {
    #[must_use]
    pub fn new(subscription: BusSubscription) -> Self {
        Self { subscription }
    }
}

impl Stream for EnvelopeStream {
    type Item = Arc<str>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(envelope)) => Poll::Ready(Some(envelope)),
            Ok(None) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}
