//! Outbound ports (SPI) for the delivery queue.

use async_trait::async_trait;
use shared_types::{Action, ActionError};

/// The external effect surface that makes a delivered action appear in the
/// third-party application.
///
/// Opaque, possibly slow, possibly failing. Must be safe to call repeatedly
/// at the pacing interval; the queue provides at-least-once semantics with
/// idempotent intent.
#[async_trait]
pub trait ActionDispatcher: Send + Sync + 'static {
    async fn perform(&self, action: &Action) -> Result<(), ActionError>;
}
