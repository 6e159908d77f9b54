//! # Broker Bridge (Subsystem 3)
//!
//! Maintains the connection to the message broker and exposes the two roles
//! the pipeline needs:
//!
//! - **Publisher**: routes decrypted event envelopes to broker topics via
//!   the prefix routing table and publishes them at-least-once.
//! - **Subscriber**: listens on the bot reply-topic pattern and hands valid
//!   replies to the delivery side.
//!
//! ## Connection model
//!
//! The bridge owns zero or one live transport session at a time and moves
//! through `Disconnected -> Connecting -> Connected`. A lost connection is
//! marked immediately; every publish independently re-checks connectivity
//! and attempts exactly one lazy reconnect, so a momentary outage self-heals
//! on the next publish attempt.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::options::{ConnectOptions, QoS};
pub use domain::routes::RouteTable;
pub use ports::outbound::{BrokerTransport, InboundMessage, ReplySink};
pub use service::publisher::BrokerPublisher;
pub use service::subscriber::BrokerSubscriber;

/// Topic pattern the subscriber role listens on. The `+` wildcard segment
/// is the bot identity; matching is the broker's job.
pub const REPLY_TOPIC_PATTERN: &str = "logbridge/bot/+/reply";
