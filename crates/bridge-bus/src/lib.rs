//! # Bridge Bus - Live Subscriber Broadcast
//!
//! The broadcast leg of event fan-out: every processed log record is
//! published here as a serialized envelope and delivered to all live
//! subscribers (the real-time API surface attaches one subscription per
//! connected client).
//!
//! ## Semantics
//!
//! - Multi-consumer: every subscriber sees every envelope published after
//!   it subscribed.
//! - No backpressure: a slow subscriber lags and skips the oldest
//!   envelopes instead of blocking the producer.
//! - Fire-and-forget: publishing with zero subscribers is not an error.

pub mod bus;
pub mod subscriber;

pub use bus::{BroadcastBus, EnvelopeSink};
pub use subscriber::{BusSubscription, EnvelopeStream, SubscriptionError};

/// Envelopes buffered per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
