//! In-memory broker transport for tests and single-process wiring.
//!
//! Scriptable connect failures, captured publishes, and injectable inbound
//! messages.

use crate::domain::options::{ConnectOptions, QoS};
use crate::ports::outbound::{BrokerTransport, InboundMessage};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::BrokerError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Test double holding broker state in memory.
pub struct InMemoryBrokerTransport {
    connected: AtomicBool,
    connect_attempts: AtomicUsize,
    fail_connects: AtomicUsize,
    published: Mutex<Vec<(String, String)>>,
    subscriptions: Mutex<Vec<String>>,
    inbound_tx: Mutex<Option<mpsc::Sender<InboundMessage>>>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
}

impl InMemoryBrokerTransport {
    #[must_use]
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        Self {
            connected: AtomicBool::new(false),
            connect_attempts: AtomicUsize::new(0),
            fail_connects: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            inbound_tx: Mutex::new(Some(inbound_tx)),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
        }
    }

    /// Make the next `count` connect attempts fail.
    pub fn fail_next_connects(&self, count: usize) {
        self.fail_connects.store(count, Ordering::SeqCst);
    }

    /// Total connect attempts observed.
    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Simulate a dropped session.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Everything published so far, as `(topic, payload)` pairs.
    #[must_use]
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }

    /// Patterns subscribed so far.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().clone()
    }

    /// Inject an inbound message as if it arrived from the broker.
    pub async fn inject(&self, topic: impl Into<String>, payload: impl Into<String>) {
        let sender = self.inbound_tx.lock().clone();
        if let Some(sender) = sender {
            let _ = sender
                .send(InboundMessage {
                    topic: topic.into(),
                    payload: payload.into(),
                })
                .await;
        }
    }

    /// Close the inbound stream; `next_message` returns `None` afterwards.
    pub fn close_messages(&self) {
        self.inbound_tx.lock().take();
    }
}

impl Default for InMemoryBrokerTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerTransport for InMemoryBrokerTransport {
    async fn connect(&self, _options: &ConnectOptions) -> Result<(), BrokerError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .fail_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                (remaining > 0).then(|| remaining - 1)
            })
            .is_ok();
        if should_fail {
            return Err(BrokerError::Transport("scripted connect failure".into()));
        }

        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        _qos: QoS,
        _retain: bool,
    ) -> Result<(), BrokerError> {
        if !self.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.published
            .lock()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    async fn subscribe(&self, pattern: &str, _qos: QoS) -> Result<(), BrokerError> {
        if !self.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.subscriptions.lock().push(pattern.to_string());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BrokerError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn next_message(&self) -> Option<InboundMessage> {
        self.inbound_rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_failures_then_success() {
        let transport = InMemoryBrokerTransport::new();
        transport.fail_next_connects(2);
        let options = ConnectOptions::for_role("mem://test", "publisher");

        assert!(transport.connect(&options).await.is_err());
        assert!(transport.connect(&options).await.is_err());
        assert!(transport.connect(&options).await.is_ok());
        assert_eq!(transport.connect_attempts(), 3);
    }

    #[tokio::test]
    async fn injected_messages_are_received_in_order() {
        let transport = InMemoryBrokerTransport::new();
        transport.inject("t", "1").await;
        transport.inject("t", "2").await;

        assert_eq!(transport.next_message().await.unwrap().payload, "1");
        assert_eq!(transport.next_message().await.unwrap().payload, "2");

        transport.close_messages();
        assert!(transport.next_message().await.is_none());
    }
}
