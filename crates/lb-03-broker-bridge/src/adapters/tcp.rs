//! TCP broker transport speaking newline-delimited JSON frames.
//!
//! Frame shapes:
//!
//! ```text
//! -> {"op":"connect","client_id":"...","clean_session":true,"keep_alive_secs":60,"max_inflight":10}
//! -> {"op":"sub","pattern":"logbridge/bot/+/reply","qos":1}
//! -> {"op":"pub","topic":"...","payload":"...","qos":1,"retain":false}
//! -> {"op":"ping"}
//! <- {"op":"msg","topic":"...","payload":"..."}
//! ```
//!
//! One reader task feeds inbound `msg` frames into a bounded channel; a
//! keep-alive task writes `ping` frames. Either task marking the session
//! lost makes `is_connected` report false, and the next `connect` call
//! replaces both tasks.

use crate::domain::options::{ConnectOptions, QoS};
use crate::ports::outbound::{BrokerTransport, InboundMessage};
use async_trait::async_trait;
use serde::Deserialize;
use shared_types::BrokerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

const INBOUND_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
struct InboundFrame {
    op: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    payload: String,
}

struct Session {
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    connected: AtomicBool,
}

impl Session {
    async fn write_line(&self, frame: &serde_json::Value) -> Result<(), BrokerError> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(BrokerError::NotConnected);
        };

        let mut line = frame.to_string();
        line.push('\n');
        if let Err(err) = writer.write_all(line.as_bytes()).await {
            self.connected.store(false, Ordering::SeqCst);
            return Err(BrokerError::Transport(err.to_string()));
        }
        Ok(())
    }
}

/// Broker transport over a plain TCP stream.
pub struct TcpBrokerTransport {
    session: Arc<Session>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl TcpBrokerTransport {
    #[must_use]
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        Self {
            session: Arc::new(Session {
                writer: tokio::sync::Mutex::new(None),
                connected: AtomicBool::new(false),
            }),
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            tasks: parking_lot::Mutex::new(Vec::new()),
        }
    }

    fn abort_tasks(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    fn spawn_reader(&self, read: tokio::net::tcp::OwnedReadHalf) -> JoinHandle<()> {
        let session = self.session.clone();
        let inbound_tx = self.inbound_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(read).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let frame: InboundFrame = match serde_json::from_str(&line) {
                            Ok(frame) => frame,
                            Err(err) => {
                                warn!(error = %err, "unparseable broker frame dropped");
                                continue;
                            }
                        };
                        if frame.op == "msg" {
                            let message = InboundMessage {
                                topic: frame.topic,
                                payload: frame.payload,
                            };
                            if inbound_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }
            session.connected.store(false, Ordering::SeqCst);
            debug!("broker reader task ended");
        })
    }

    fn spawn_keepalive(&self, keep_alive: std::time::Duration) -> JoinHandle<()> {
        let session = self.session.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(keep_alive);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately; the connect frame just went out.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !session.connected.load(Ordering::SeqCst) {
                    break;
                }
                if session
                    .write_line(&serde_json::json!({"op": "ping"}))
                    .await
                    .is_err()
                {
                    warn!("keep-alive write failed, marking session lost");
                    break;
                }
            }
        })
    }
}

impl Default for TcpBrokerTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerTransport for TcpBrokerTransport {
    async fn connect(&self, options: &ConnectOptions) -> Result<(), BrokerError> {
        self.abort_tasks();

        let stream = timeout(
            options.connect_timeout,
            TcpStream::connect(&options.broker_url),
        )
        .await
        .map_err(|_| BrokerError::ConnectTimeout(options.connect_timeout.as_secs()))?
        .map_err(|err| BrokerError::Transport(err.to_string()))?;

        let (read, write) = stream.into_split();
        *self.session.writer.lock().await = Some(write);
        self.session.connected.store(true, Ordering::SeqCst);

        self.session
            .write_line(&serde_json::json!({
                "op": "connect",
                "client_id": options.client_id,
                "clean_session": options.clean_session,
                "keep_alive_secs": options.keep_alive.as_secs(),
                "max_inflight": options.max_inflight,
            }))
            .await?;

        let reader = self.spawn_reader(read);
        let keepalive = self.spawn_keepalive(options.keep_alive);
        *self.tasks.lock() = vec![reader, keepalive];

        debug!(broker_url = %options.broker_url, client_id = %options.client_id, "tcp session established");
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        qos: QoS,
        retain: bool,
    ) -> Result<(), BrokerError> {
        if !self.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.session
            .write_line(&serde_json::json!({
                "op": "pub",
                "topic": topic,
                "payload": payload,
                "qos": qos.as_u8(),
                "retain": retain,
            }))
            .await
    }

    async fn subscribe(&self, pattern: &str, qos: QoS) -> Result<(), BrokerError> {
        if !self.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.session
            .write_line(&serde_json::json!({
                "op": "sub",
                "pattern": pattern,
                "qos": qos.as_u8(),
            }))
            .await
    }

    async fn disconnect(&self) -> Result<(), BrokerError> {
        self.abort_tasks();
        self.session.connected.store(false, Ordering::SeqCst);
        *self.session.writer.lock().await = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.connected.load(Ordering::SeqCst)
    }

    async fn next_message(&self) -> Option<InboundMessage> {
        self.inbound_rx.lock().await.recv().await
    }
}
