//! In-memory test doubles for the detector's outbound ports.
//!
//! Shared with the workspace integration tests, so they live in the crate
//! proper rather than under `#[cfg(test)]`.

use crate::ports::outbound::{ChatLogStore, DecryptProvider, RoutePublisher};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{BrokerError, DecryptError, LogRecord, StoreError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Ciphertext prefix the mock decryption provider accepts.
const MOCK_CIPHER_PREFIX: &str = "enc:";

/// In-memory chat-log store with scriptable failures.
#[derive(Debug, Default)]
pub struct MockLogStore {
    records: Mutex<Vec<LogRecord>>,
    fail_queries: AtomicUsize,
}

impl MockLogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record as the store's writer would.
    pub fn append(&self, record: LogRecord) {
        let mut records = self.records.lock();
        records.push(record);
        records.sort_by_key(|r| r.log_id);
    }

    /// Make the next `count` queries fail with [`StoreError::Unavailable`].
    pub fn fail_next_queries(&self, count: usize) {
        self.fail_queries.store(count, Ordering::SeqCst);
    }

    /// A plain text record whose ciphertext the mock provider can decrypt.
    #[must_use]
    pub fn plain_record(log_id: i64, message: &str) -> LogRecord {
        LogRecord {
            log_id,
            chat_id: 100,
            user_id: 200,
            message: message.to_string(),
            attachment: None,
            payload: r#"{"enc":31,"origin":"MSG"}"#.to_string(),
            msg_type: "1".to_string(),
            created_at: format!("{}", 1_700_000_000 + log_id),
        }
    }

    /// A record carrying a synthetic origin tag.
    #[must_use]
    pub fn synthetic_record(log_id: i64, origin: &str) -> LogRecord {
        let mut record = Self::plain_record(log_id, "enc:mirrored");
        record.payload = format!(r#"{{"enc":31,"origin":"{origin}"}}"#);
        record
    }

    fn checked(&self) -> Result<(), StoreError> {
        let armed = self
            .fail_queries
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            Err(StoreError::Unavailable("scripted failure".into()))
        } else {
            Ok(())
        }
    }
}

impl ChatLogStore for MockLogStore {
    fn new_record_count(&self, after: i64) -> Result<u64, StoreError> {
        self.checked()?;
        Ok(self.records.lock().iter().filter(|r| r.log_id > after).count() as u64)
    }

    fn records_after(&self, after: i64) -> Result<Vec<LogRecord>, StoreError> {
        self.checked()?;
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.log_id > after)
            .cloned()
            .collect())
    }

    fn newest_record(&self) -> Result<Option<LogRecord>, StoreError> {
        self.checked()?;
        Ok(self.records.lock().last().cloned())
    }

    fn resolve_identity(&self, chat_id: i64, user_id: i64) -> Result<(String, String), StoreError> {
        Ok((format!("room-{chat_id}"), format!("user-{user_id}")))
    }
}

/// Decryption provider that strips the `enc:` prefix and rejects anything
/// else as a bad cipher.
#[derive(Debug, Default)]
pub struct MockDecrypt;

impl DecryptProvider for MockDecrypt {
    fn decrypt(&self, _enc: i32, ciphertext: &str, _owner_id: i64) -> Result<String, DecryptError> {
        ciphertext
            .strip_prefix(MOCK_CIPHER_PREFIX)
            .map(str::to_string)
            .ok_or_else(|| DecryptError::Cipher("unrecognized ciphertext".into()))
    }
}

/// Broker sink that records what it was asked to publish.
#[derive(Debug, Default)]
pub struct RecordingRoutePublisher {
    published: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingRoutePublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(message, envelope)` pairs in publish order.
    #[must_use]
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }

    /// Make every following publish fail.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoutePublisher for RecordingRoutePublisher {
    async fn route_publish(&self, message: &str, envelope: &str) -> Result<bool, BrokerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BrokerError::NotConnected);
        }
        self.published
            .lock()
            .push((message.to_string(), envelope.to_string()));
        Ok(true)
    }
}
