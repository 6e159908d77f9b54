//! Change-detection service: poll, decrypt, fan out.

use crate::domain::{Cursor, RecentHistory};
use crate::ports::outbound::{ChatLogStore, DecryptProvider, RoutePublisher};
use bridge_bus::EnvelopeSink;
use shared_types::{ChatEvent, HistoryEntry, LogRecord, RecordMeta, EMPTY_ATTACHMENT};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Semaphore};
use tracing::{debug, info, trace, warn};

/// Keyword marking a gift message whose attachment must be suppressed.
const GIFT_KEYWORD: &str = "선물";
/// Vendor type tag of gift messages.
const GIFT_TYPE: &str = "71";
/// Concurrent broker publishes offloaded from the tick.
const PUBLISH_PERMITS: usize = 8;

/// Snapshot of the detector for status queries.
#[derive(Debug, Clone)]
pub struct DetectorStatus {
    /// Whether the polling loop is currently running.
    pub is_polling: bool,
    /// Cursor position, if the first tick has established one.
    pub cursor: Option<i64>,
    /// Recent processed entries, most recent first.
    pub recent: Vec<HistoryEntry>,
}

/// Watches the chat-log store for appended records and fans each decrypted
/// event out to the broadcast bus and the broker bridge.
///
/// Ticks are serialized; a tick that overruns its interval delays the next
/// one instead of overlapping it. Broker publishes are offloaded to spawned
/// tasks bounded by a semaphore so a slow broker never stalls detection.
pub struct ChangeDetector<S, D, P> {
    store: Arc<S>,
    decrypt: Arc<D>,
    publisher: Arc<P>,
    bus: Arc<dyn EnvelopeSink>,
    cursor: Cursor,
    history: RecentHistory,
    tick_lock: Mutex<()>,
    publish_permits: Arc<Semaphore>,
    polling: AtomicBool,
}

impl<S, D, P> ChangeDetector<S, D, P>
where
    S: ChatLogStore,
    D: DecryptProvider,
    P: RoutePublisher + 'static,
{
    pub fn new(
        store: Arc<S>,
        decrypt: Arc<D>,
        publisher: Arc<P>,
        bus: Arc<dyn EnvelopeSink>,
    ) -> Self {
        Self {
            store,
            decrypt,
            publisher,
            bus,
            cursor: Cursor::new(),
            history: RecentHistory::new(),
            tick_lock: Mutex::new(()),
            publish_permits: Arc::new(Semaphore::new(PUBLISH_PERMITS)),
            polling: AtomicBool::new(false),
        }
    }

    /// Run the polling loop until `shutdown` flips to `true`.
    pub async fn run(&self, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        self.polling.store(true, Ordering::SeqCst);
        info!(interval_ms = poll_interval.as_millis() as u64, "change detector started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = self.tick().await {
                        warn!(%error, "tick failed; cursor unchanged");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.polling.store(false, Ordering::SeqCst);
        info!("change detector stopped");
    }

    /// Process one polling tick. Returns the number of events emitted.
    ///
    /// The first successful tick only establishes the cursor at the newest
    /// record; pre-existing records are never replayed.
    pub async fn tick(&self) -> Result<usize, shared_types::StoreError> {
        let _guard = self.tick_lock.lock().await;

        if !self.cursor.is_initialized() {
            match self.store.newest_record()? {
                Some(record) => {
                    self.cursor.initialize(record.log_id);
                    debug!(cursor = record.log_id, "cursor initialized at store tail");
                }
                None => trace!("store empty; cursor not yet established"),
            }
            return Ok(0);
        }

        // is_initialized() held above and nothing else mutates the cursor.
        let Some(after) = self.cursor.get() else {
            return Ok(0);
        };

        if self.store.new_record_count(after)? == 0 {
            return Ok(0);
        }

        let records = self.store.records_after(after)?;
        let mut emitted = 0;
        for record in records {
            if self.process_record(record).await {
                emitted += 1;
            }
        }
        Ok(emitted)
    }

    /// Handle one record; returns whether an event was emitted.
    ///
    /// The cursor advances whatever happens to the record, so one bad row
    /// can never wedge the pipeline.
    async fn process_record(&self, record: LogRecord) -> bool {
        let (meta, meta_parsed) = match record.meta() {
            Ok(meta) => (meta, true),
            Err(error) => {
                warn!(log_id = record.log_id, %error, "unparseable record payload; emitting undecrypted");
                let fallback = RecordMeta {
                    enc: 0,
                    origin: String::new(),
                };
                (fallback, false)
            }
        };

        if meta.is_synthetic() {
            trace!(log_id = record.log_id, origin = %meta.origin, "synthetic record skipped");
            self.cursor.advance_to(record.log_id);
            return false;
        }

        // Without a parsed scheme there is nothing to hand the decryption
        // provider; the record passes through as-is.
        let (message, attachment) = if meta_parsed {
            let message = self.decrypt_column(meta.enc, &record.message, record.user_id);
            let attachment = self.resolve_attachment(&record, &meta, &message);
            (message, attachment)
        } else {
            let attachment = match record.attachment.as_deref() {
                None | Some("") => EMPTY_ATTACHMENT.to_string(),
                Some(raw) => raw.to_string(),
            };
            (record.message.clone(), attachment)
        };

        self.cursor.advance_to(record.log_id);

        let raw = raw_fields(&record, &message, &attachment);
        let event = ChatEvent {
            log_id: record.log_id,
            chat_id: record.chat_id,
            user_id: record.user_id,
            message: message.clone(),
            attachment,
            origin: meta.origin,
            msg_type: record.msg_type.clone(),
            raw,
        };

        self.history.push(HistoryEntry {
            log_id: record.log_id,
            chat_id: record.chat_id,
            user_id: record.user_id,
            message,
            created_at: record.created_at.clone(),
        });

        let (room, sender) = self.resolve_labels(record.chat_id, record.user_id);
        let envelope = event.envelope(&room, &sender);

        let receivers = self.bus.emit_broadcast(envelope.clone());
        trace!(log_id = event.log_id, receivers, "event broadcast");

        self.offload_broker_publish(event.message, envelope);
        true
    }

    fn decrypt_column(&self, enc: i32, ciphertext: &str, owner_id: i64) -> String {
        if ciphertext.is_empty() || ciphertext == EMPTY_ATTACHMENT {
            return ciphertext.to_string();
        }
        match self.decrypt.decrypt(enc, ciphertext, owner_id) {
            Ok(plain) => plain,
            Err(error) => {
                warn!(%error, "decrypt failed; keeping ciphertext");
                ciphertext.to_string()
            }
        }
    }

    /// Attachment handling: gift messages and absent attachments collapse to
    /// the empty sentinel; everything else is decrypted like the message.
    fn resolve_attachment(&self, record: &LogRecord, meta: &RecordMeta, message: &str) -> String {
        if message.contains(GIFT_KEYWORD) && record.msg_type == GIFT_TYPE {
            debug!(log_id = record.log_id, "gift attachment suppressed");
            return EMPTY_ATTACHMENT.to_string();
        }
        match record.attachment.as_deref() {
            None | Some("") => EMPTY_ATTACHMENT.to_string(),
            Some(ciphertext) => self.decrypt_column(meta.enc, ciphertext, record.user_id),
        }
    }

    fn resolve_labels(&self, chat_id: i64, user_id: i64) -> (String, String) {
        match self.store.resolve_identity(chat_id, user_id) {
            Ok(labels) => labels,
            Err(error) => {
                debug!(chat_id, user_id, %error, "identity lookup failed; using raw ids");
                (chat_id.to_string(), user_id.to_string())
            }
        }
    }

    /// Publish toward the broker on a spawned task so a slow or down broker
    /// never blocks the tick. Concurrency is bounded by the permit pool.
    fn offload_broker_publish(&self, message: String, envelope: String) {
        let permits = Arc::clone(&self.publish_permits);
        let publisher = Arc::clone(&self.publisher);
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            match publisher.route_publish(&message, &envelope).await {
                Ok(true) => trace!("event routed to broker"),
                Ok(false) => trace!("no broker route matched"),
                Err(error) => warn!(%error, "broker publish failed"),
            }
        });
    }

    /// Snapshot for status queries.
    #[must_use]
    pub fn status(&self) -> DetectorStatus {
        DetectorStatus {
            is_polling: self.polling.load(Ordering::SeqCst),
            cursor: self.cursor.get(),
            recent: self.history.snapshot(),
        }
    }
}

fn raw_fields(record: &LogRecord, message: &str, attachment: &str) -> BTreeMap<String, String> {
    let mut raw = BTreeMap::new();
    raw.insert("_id".to_string(), record.log_id.to_string());
    raw.insert("chat_id".to_string(), record.chat_id.to_string());
    raw.insert("user_id".to_string(), record.user_id.to_string());
    raw.insert("message".to_string(), message.to_string());
    raw.insert("attachment".to_string(), attachment.to_string());
    raw.insert("v".to_string(), record.payload.clone());
    raw.insert("type".to_string(), record.msg_type.clone());
    raw.insert("created_at".to_string(), record.created_at.clone());
    raw
}
