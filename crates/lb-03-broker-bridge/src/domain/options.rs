//! Broker connection options.

use std::time::Duration;
use uuid::Uuid;

/// Delivery assurance level for a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    /// Fire and forget.
    AtMostOnce,
    /// Transport acknowledges submission; the level used for event fan-out.
    AtLeastOnce,
}

impl QoS {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
        }
    }
}

/// Options applied when opening a broker session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Broker endpoint address.
    pub broker_url: String,
    /// Process-unique client identity.
    pub client_id: String,
    /// Start each session clean; no state survives a reconnect.
    pub clean_session: bool,
    /// Let the transport re-establish dropped sessions on its own.
    pub automatic_reconnect: bool,
    /// Bound on a single connect attempt; a timeout is a failed connect.
    pub connect_timeout: Duration,
    /// Keep-alive interval for the session.
    pub keep_alive: Duration,
    /// Bound on unacknowledged in-flight publishes.
    pub max_inflight: usize,
}

impl ConnectOptions {
    /// Build options for a role (`"publisher"` / `"subscriber"`) with a
    /// process-unique client id.
    #[must_use]
    pub fn for_role(broker_url: impl Into<String>, role: &str) -> Self {
        Self {
            broker_url: broker_url.into(),
            client_id: format!("logbridge-{role}-{}", Uuid::new_v4()),
            clean_session: true,
            automatic_reconnect: true,
            connect_timeout: Duration::from_secs(10),
            keep_alive: Duration::from_secs(60),
            max_inflight: 10,
        }
    }
}
