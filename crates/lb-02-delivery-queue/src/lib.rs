//! # Delivery Queue (Subsystem 2)
//!
//! Serialized, rate-limited path to the external action dispatcher.
//!
//! ## Guarantees
//!
//! - Actions execute in FIFO enqueue order and never overlap.
//! - After each action (success or failure) the worker sleeps for the
//!   currently configured pacing interval, so the dispatcher never sees two
//!   actions closer together than that interval.
//! - Producers never block: the queue is unbounded in practice and the
//!   effect is fire-and-forget from their point of view.
//! - Changing the pacing interval stops the worker after its in-flight
//!   action and starts a fresh one against the same queue; nothing enqueued
//!   is lost or duplicated.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::command::{action_from_reply, InboundCommandAdapter};
pub use domain::text::preserve_invisible_padding;
pub use ports::outbound::ActionDispatcher;
pub use service::{DeliveryQueue, DeliverySender};
