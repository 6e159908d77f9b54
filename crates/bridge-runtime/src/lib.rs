//! # Bridge Runtime Library
//!
//! Integration point for the log-bridge pipeline. The [`BridgePipeline`]
//! container owns every subsystem instance, wires the adapters between
//! them, and manages startup and shutdown. Embedding processes supply the
//! concrete store, decryption provider, action dispatcher, and broker
//! transports; everything in between is wired here.
//!
//! ## Data flow
//!
//! ```text
//! chat-log store --> change detector --> broadcast bus (live subscribers)
//!                                    \-> broker publisher (routed topics)
//! broker subscriber --> command adapter --> delivery queue --> dispatcher
//! ```

pub mod adapters;
pub mod container;
pub mod telemetry;

pub use container::BridgePipeline;
