//! Outbound ports (SPI) for the broker bridge.

use crate::domain::options::{ConnectOptions, QoS};
use async_trait::async_trait;
use shared_types::{BrokerError, BrokerReply};

/// A message arriving on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

/// Transport interface to the broker.
///
/// Implementations own the wire session; the bridge owns the connection
/// state machine. All calls may block on network I/O and therefore never
/// run on the detector tick path.
#[async_trait]
pub trait BrokerTransport: Send + Sync + 'static {
    /// Open a session. A timed-out attempt returns
    /// [`BrokerError::ConnectTimeout`], not a panic.
    async fn connect(&self, options: &ConnectOptions) -> Result<(), BrokerError>;

    /// Publish one message. `Ok` means the transport accepted the
    /// submission, not end-to-end delivery.
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        qos: QoS,
        retain: bool,
    ) -> Result<(), BrokerError>;

    /// Subscribe to a topic pattern.
    async fn subscribe(&self, pattern: &str, qos: QoS) -> Result<(), BrokerError>;

    /// Close the session.
    async fn disconnect(&self) -> Result<(), BrokerError>;

    /// Whether a live session currently exists.
    fn is_connected(&self) -> bool;

    /// Wait for the next inbound message. `None` means the session is gone
    /// and the caller should reconnect.
    async fn next_message(&self) -> Option<InboundMessage>;
}

/// Where the subscriber role hands parsed replies.
///
/// Implemented in the runtime over the inbound command adapter, which
/// normalizes the reply into an action and appends it to the delivery
/// queue.
pub trait ReplySink: Send + Sync {
    fn submit(&self, reply: BrokerReply);
}
