//! Glue adapters between subsystem ports.
//!
//! Subsystems never call each other directly; these adapters implement one
//! subsystem's outbound port in terms of another subsystem's service.

use async_trait::async_trait;
use lb_01_change_detector::RoutePublisher;
use lb_02_delivery_queue::InboundCommandAdapter;
use lb_03_broker_bridge::{BrokerPublisher, BrokerTransport, ReplySink};
use shared_types::{BrokerError, BrokerReply};
use std::sync::Arc;

/// Implements the detector's fan-out port on top of the broker publisher.
pub struct RoutingSink<T: BrokerTransport> {
    publisher: Arc<BrokerPublisher<T>>,
}

impl<T: BrokerTransport> RoutingSink<T> {
    #[must_use]
    pub fn new(publisher: Arc<BrokerPublisher<T>>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl<T: BrokerTransport> RoutePublisher for RoutingSink<T> {
    async fn route_publish(&self, message: &str, envelope: &str) -> Result<bool, BrokerError> {
        self.publisher.route(message, envelope).await
    }
}

/// Implements the subscriber's reply sink on top of the delivery queue's
/// command adapter.
pub struct QueueReplySink {
    commands: Arc<InboundCommandAdapter>,
}

impl QueueReplySink {
    #[must_use]
    pub fn new(commands: Arc<InboundCommandAdapter>) -> Self {
        Self { commands }
    }
}

impl ReplySink for QueueReplySink {
    fn submit(&self, reply: BrokerReply) {
        self.commands.accept_reply(&reply);
    }
}
