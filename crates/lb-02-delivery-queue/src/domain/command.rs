//! Inbound command normalization.
//!
//! Commands arrive either from the request API (already shaped as actions)
//! or from the broker subscription as [`BrokerReply`] payloads. This module
//! turns replies into actions; anything it cannot normalize is dropped with
//! a logged reason and the pipeline keeps running.

use crate::service::DeliverySender;
use shared_types::{Action, BrokerReply, CommandError};
use tracing::{debug, warn};

/// Normalize a broker reply into an action.
///
/// Only `"text"` replies are supported. A thread id that does not parse is
/// treated as absent rather than rejecting the reply.
pub fn action_from_reply(reply: &BrokerReply) -> Result<Action, CommandError> {
    match reply.reply_type.to_lowercase().as_str() {
        "text" => {
            let chat_id = reply
                .room
                .parse::<i64>()
                .map_err(|_| CommandError::InvalidRoom(reply.room.clone()))?;
            let thread_id = reply.thread_id.as_ref().and_then(|id| id.parse().ok());
            Ok(Action::SendText {
                chat_id,
                message: reply.data.clone(),
                thread_id,
            })
        }
        other => Err(CommandError::UnsupportedType(other.to_string())),
    }
}

/// Funnel for inbound commands into the delivery queue.
pub struct InboundCommandAdapter {
    sender: DeliverySender,
}

impl InboundCommandAdapter {
    #[must_use]
    pub fn new(sender: DeliverySender) -> Self {
        Self { sender }
    }

    /// Enqueue an already-shaped action (request-API path).
    pub fn accept_action(&self, action: Action) {
        debug!(action = %action.describe(), "action accepted");
        self.sender.enqueue(action);
    }

    /// Normalize and enqueue a broker reply; drops what it cannot handle.
    pub fn accept_reply(&self, reply: &BrokerReply) {
        match action_from_reply(reply) {
            Ok(action) => {
                debug!(action = %action.describe(), room = %reply.room, "reply normalized");
                self.sender.enqueue(action);
            }
            Err(err) => {
                warn!(reply_type = %reply.reply_type, room = %reply.room, error = %err, "inbound reply dropped");
            }
        }
    }
}
