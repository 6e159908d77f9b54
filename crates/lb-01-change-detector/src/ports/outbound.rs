//! Outbound ports: the store, the decryption provider, and the broker sink.

use async_trait::async_trait;
use shared_types::{BrokerError, DecryptError, LogRecord, StoreError};

/// Read-only access to the append-only chat-log store.
///
/// The detector never writes through this port; implementations typically
/// wrap a local database owned by another process, so every call can fail
/// transiently.
pub trait ChatLogStore: Send + Sync {
    /// Number of records strictly newer than `after`.
    fn new_record_count(&self, after: i64) -> Result<u64, StoreError>;

    /// All records strictly newer than `after`, oldest first.
    fn records_after(&self, after: i64) -> Result<Vec<LogRecord>, StoreError>;

    /// The most recently appended record, if the store is non-empty.
    fn newest_record(&self) -> Result<Option<LogRecord>, StoreError>;

    /// Resolve display labels `(room, sender)` for a channel and sender id.
    fn resolve_identity(&self, chat_id: i64, user_id: i64) -> Result<(String, String), StoreError>;
}

/// Decrypts a single ciphertext column of a record.
pub trait DecryptProvider: Send + Sync {
    /// Decrypt `ciphertext` with the scheme selected by `enc`, keyed by the
    /// record owner's id.
    fn decrypt(&self, enc: i32, ciphertext: &str, owner_id: i64) -> Result<String, DecryptError>;
}

/// Fan-out sink toward the broker bridge.
#[async_trait]
pub trait RoutePublisher: Send + Sync {
    /// Publish `envelope` to the topic selected by routing `message`.
    ///
    /// Returns `Ok(false)` when no route matched and nothing was published.
    async fn route_publish(&self, message: &str, envelope: &str) -> Result<bool, BrokerError>;
}
