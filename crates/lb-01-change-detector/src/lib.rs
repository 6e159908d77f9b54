//! # Change Detector (Subsystem 1)
//!
//! Watches the append-only chat-log store for newly appended records,
//! decrypts their payloads, and fans each normalized event out to the live
//! broadcast bus and the broker bridge.
//!
//! ## Progress model
//!
//! The detector maintains a forward-only [`domain::Cursor`] over record
//! identifiers it does not own. The cursor advances once a record's decrypt
//! has been attempted, regardless of the outcome, so a crash mid-batch
//! re-processes rather than skips, and a record that cannot be decrypted
//! can never wedge the pipeline.

pub mod domain;
pub mod ports;
pub mod service;
pub mod testing;

pub use domain::{Cursor, RecentHistory, MAX_HISTORY};
pub use ports::outbound::{ChatLogStore, DecryptProvider, RoutePublisher};
pub use service::{ChangeDetector, DetectorStatus};
