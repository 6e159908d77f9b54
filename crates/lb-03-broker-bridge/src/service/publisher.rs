//! Publisher role: route event envelopes to broker topics.

use crate::domain::options::{ConnectOptions, QoS};
use crate::domain::routes::RouteTable;
use crate::ports::outbound::BrokerTransport;
use parking_lot::RwLock;
use shared_types::{BrokerError, ConnectionState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Publishes event envelopes to the broker through the routing table.
///
/// Holds the publisher-role connection state machine. Publishing while
/// disconnected attempts exactly one lazy reconnect and then fails without
/// raising; the next publish attempt starts fresh.
pub struct BrokerPublisher<T: BrokerTransport> {
    transport: Arc<T>,
    options: ConnectOptions,
    routes: Arc<RouteTable>,
    state: RwLock<ConnectionState>,
}

impl<T: BrokerTransport> BrokerPublisher<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, options: ConnectOptions, routes: Arc<RouteTable>) -> Self {
        Self {
            transport,
            options,
            routes,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// The routing table this publisher consults.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Open the broker session.
    pub async fn connect(&self) -> Result<(), BrokerError> {
        *self.state.write() = ConnectionState::Connecting;
        debug!(
            broker_url = %self.options.broker_url,
            client_id = %self.options.client_id,
            "publisher connecting"
        );

        match self.transport.connect(&self.options).await {
            Ok(()) => {
                *self.state.write() = ConnectionState::Connected;
                info!(broker_url = %self.options.broker_url, "publisher connected");
                Ok(())
            }
            Err(err) => {
                *self.state.write() = ConnectionState::Disconnected;
                warn!(error = %err, "publisher connect failed");
                Err(err)
            }
        }
    }

    /// Mark the session lost. The next publish attempt lazily reconnects.
    pub fn mark_connection_lost(&self) {
        *self.state.write() = ConnectionState::Disconnected;
        warn!("publisher connection lost");
    }

    /// One lazy reconnect attempt if the session is not live.
    async fn ensure_connected(&self) -> bool {
        if self.connection_state() == ConnectionState::Connected && self.transport.is_connected() {
            return true;
        }
        debug!("publisher not connected, attempting reconnect");
        self.connect().await.is_ok()
    }

    /// Route a message's envelope to the broker.
    ///
    /// Returns `Ok(true)` if published, `Ok(false)` if the message was
    /// blank or no route matched (a no-op, not an error).
    pub async fn route(&self, message: &str, envelope: &str) -> Result<bool, BrokerError> {
        if message.trim().is_empty() {
            debug!("blank message, skipping routing");
            return Ok(false);
        }

        let Some(topic) = self.routes.select(message) else {
            debug!("no matching route for message");
            return Ok(false);
        };

        self.publish(&topic, envelope).await?;
        Ok(true)
    }

    /// Publish at-least-once, not retained.
    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), BrokerError> {
        if !self.ensure_connected().await {
            return Err(BrokerError::NotConnected);
        }

        match self
            .transport
            .publish(topic, payload, QoS::AtLeastOnce, false)
            .await
        {
            Ok(()) => {
                debug!(topic, "published");
                Ok(())
            }
            Err(err) => {
                self.mark_connection_lost();
                warn!(topic, error = %err, "publish failed");
                Err(err)
            }
        }
    }
}
