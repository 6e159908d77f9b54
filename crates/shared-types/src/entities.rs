//! # Core Domain Entities
//!
//! Defines the entities that flow through the bridge pipeline.
//!
//! ## Clusters
//!
//! - **Log side**: [`LogRecord`], [`RecordMeta`], [`ChatEvent`], [`HistoryEntry`]
//! - **Delivery side**: [`Action`], [`BrokerReply`]
//! - **Broker side**: [`Route`], [`ConnectionState`]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel used wherever an attachment is absent or suppressed.
pub const EMPTY_ATTACHMENT: &str = "{}";

/// Origin tag for records mirrored by the sync protocol.
pub const ORIGIN_SYNC: &str = "SYNCMSG";

/// Origin tag for records mirrored from another device.
pub const ORIGIN_MULTI_DEVICE: &str = "MCHATLOGS";

/// A raw row read from the append-only chat-log store.
///
/// Immutable once read; `message` and `attachment` are still encrypted at
/// this point. The `payload` column carries a JSON object with the
/// encryption type and origin tag (see [`RecordMeta`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Monotonically increasing record identifier.
    pub log_id: i64,
    /// Channel (chat room) identifier.
    pub chat_id: i64,
    /// Sender identifier; also the decryption key owner.
    pub user_id: i64,
    /// Raw message ciphertext.
    pub message: String,
    /// Raw attachment ciphertext, if any.
    pub attachment: Option<String>,
    /// Structured JSON payload carrying `enc` and `origin`.
    pub payload: String,
    /// Vendor type tag (e.g. `"1"` for text, `"71"` for gift).
    pub msg_type: String,
    /// Store-provided creation timestamp, passed through verbatim.
    pub created_at: String,
}

impl LogRecord {
    /// Parse the structured payload column into its metadata.
    pub fn meta(&self) -> Result<RecordMeta, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}

/// Metadata parsed from a record's structured payload column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Encryption type selector handed to the decryption provider.
    pub enc: i32,
    /// Origin tag; synthetic origins are skipped by the detector.
    #[serde(default)]
    pub origin: String,
}

impl RecordMeta {
    /// True for records produced by sync or multi-device mirroring.
    ///
    /// These advance the cursor but are never decrypted or fanned out.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.origin == ORIGIN_SYNC || self.origin == ORIGIN_MULTI_DEVICE
    }
}

/// Normalized, decrypted view of one [`LogRecord`].
///
/// Created by the change detector, consumed once by the fan-out sink, and
/// not retained beyond the recent-history buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub log_id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    /// Decrypted message text (raw ciphertext if decryption failed).
    pub message: String,
    /// Decrypted attachment, or [`EMPTY_ATTACHMENT`].
    pub attachment: String,
    pub origin: String,
    pub msg_type: String,
    /// All record fields with message/attachment replaced by their
    /// decrypted forms, for the broadcast envelope's `json` mapping.
    pub raw: BTreeMap<String, String>,
}

impl ChatEvent {
    /// Serialize the broadcast envelope with resolved display labels.
    pub fn envelope(&self, room: &str, sender: &str) -> String {
        serde_json::json!({
            "msg": self.message,
            "room": room,
            "sender": sender,
            "json": self.raw,
        })
        .to_string()
    }
}

/// Simplified entry kept in the bounded recent-history buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub log_id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub message: String,
    pub created_at: String,
}

/// A prefix-to-topic routing rule for broker fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Matched case-insensitively against the start of the message.
    pub prefix: String,
    /// Broker topic that matching messages are published to.
    pub topic: String,
    /// Disabled routes are never selected.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Route {
    pub fn new(prefix: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            topic: topic.into(),
            enabled: true,
        }
    }
}

/// A single outbound effect queued for serialized, paced execution.
///
/// Consumed exactly once by the delivery worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a text reply into a channel, optionally into a thread.
    SendText {
        chat_id: i64,
        message: String,
        thread_id: Option<i64>,
    },
    /// Push a single base64-encoded image into a channel.
    SendPhoto { chat_id: i64, image_base64: String },
    /// Push several base64-encoded images into a channel at once.
    SendMultiPhoto { chat_id: i64, images: Vec<String> },
}

impl Action {
    /// Short identity used in worker logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::SendText { chat_id, .. } => format!("send-text chat={chat_id}"),
            Self::SendPhoto { chat_id, .. } => format!("send-photo chat={chat_id}"),
            Self::SendMultiPhoto { chat_id, images } => {
                format!("send-multi-photo chat={chat_id} count={}", images.len())
            }
        }
    }
}

/// Inbound reply payload arriving from the broker subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerReply {
    #[serde(rename = "type")]
    pub reply_type: String,
    pub room: String,
    #[serde(rename = "threadId", default)]
    pub thread_id: Option<String>,
    pub data: String,
}

/// Broker connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}
