//! Subscriber role: receive replies on the bot reply-topic pattern.

use crate::domain::options::{ConnectOptions, QoS};
use crate::ports::outbound::{BrokerTransport, InboundMessage, ReplySink};
use crate::REPLY_TOPIC_PATTERN;
use parking_lot::RwLock;
use shared_types::{BrokerError, BrokerReply, ConnectionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Pause before retrying after the transport's message stream ends.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Listens on the reply-topic pattern and forwards parsed replies.
///
/// Malformed payloads are logged and dropped; they never propagate out of
/// the message loop.
pub struct BrokerSubscriber<T: BrokerTransport> {
    transport: Arc<T>,
    options: ConnectOptions,
    sink: Arc<dyn ReplySink>,
    state: RwLock<ConnectionState>,
}

impl<T: BrokerTransport> BrokerSubscriber<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, options: ConnectOptions, sink: Arc<dyn ReplySink>) -> Self {
        Self {
            transport,
            options,
            sink,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Open the session and (re-)establish the reply subscription.
    pub async fn connect(&self) -> Result<(), BrokerError> {
        *self.state.write() = ConnectionState::Connecting;
        debug!(
            broker_url = %self.options.broker_url,
            client_id = %self.options.client_id,
            "subscriber connecting"
        );

        match self.transport.connect(&self.options).await {
            Ok(()) => {
                self.transport
                    .subscribe(REPLY_TOPIC_PATTERN, QoS::AtLeastOnce)
                    .await?;
                *self.state.write() = ConnectionState::Connected;
                info!(pattern = REPLY_TOPIC_PATTERN, "subscriber connected and subscribed");
                Ok(())
            }
            Err(err) => {
                *self.state.write() = ConnectionState::Disconnected;
                warn!(error = %err, "subscriber connect failed");
                Err(err)
            }
        }
    }

    /// Drive the message loop until shutdown is signalled.
    ///
    /// A closed message stream marks the session lost and retries the
    /// connect with a short backoff; the loop itself never terminates on a
    /// per-message error.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown; otherwise the
                    // Err arm would be ready on every poll.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("subscriber shutting down");
                        return;
                    }
                }
                message = self.transport.next_message() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => {
                            *self.state.write() = ConnectionState::Disconnected;
                            warn!("subscriber message stream closed, reconnecting");
                            tokio::time::sleep(RECONNECT_BACKOFF).await;
                            let _ = self.connect().await;
                        }
                    }
                }
            }
        }
    }

    /// Parse one inbound message and hand it to the reply sink.
    pub fn handle_message(&self, message: InboundMessage) {
        let bot_id = message
            .topic
            .split('/')
            .nth(2)
            .unwrap_or("unknown")
            .to_string();

        let reply: BrokerReply = match serde_json::from_str(&message.payload) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(topic = %message.topic, bot = %bot_id, error = %err, "malformed reply dropped");
                return;
            }
        };

        debug!(
            topic = %message.topic,
            bot = %bot_id,
            reply_type = %reply.reply_type,
            room = %reply.room,
            "reply received"
        );
        self.sink.submit(reply);
    }
}
