//! The delivery queue service: one paced worker over a shared FIFO queue.

use crate::domain::text::normalize;
use crate::ports::outbound::ActionDispatcher;
use shared_types::Action;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Cloneable producer handle. Enqueueing never blocks the caller.
#[derive(Clone)]
pub struct DeliverySender {
    tx: mpsc::UnboundedSender<Action>,
}

impl DeliverySender {
    /// Append an action to the queue.
    pub fn enqueue(&self, action: Action) {
        if self.tx.send(action).is_err() {
            // Only possible once the queue itself is gone at shutdown.
            warn!("delivery queue closed, action dropped");
        }
    }
}

/// Single-consumer ordered queue of outbound actions.
///
/// `run` supervises exactly one worker at a time. A pacing-interval change
/// stops the current worker after its in-flight action, then starts a new
/// worker against the same receiver, so no enqueued action is lost or
/// duplicated across the restart.
pub struct DeliveryQueue<D: ActionDispatcher> {
    dispatcher: Arc<D>,
    tx: mpsc::UnboundedSender<Action>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Action>>>,
    pacing: watch::Receiver<Duration>,
}

impl<D: ActionDispatcher> DeliveryQueue<D> {
    #[must_use]
    pub fn new(dispatcher: Arc<D>, pacing: watch::Receiver<Duration>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            dispatcher,
            tx,
            rx: Arc::new(Mutex::new(rx)),
            pacing,
        }
    }

    /// Producer handle for the request API and the inbound command adapter.
    #[must_use]
    pub fn sender(&self) -> DeliverySender {
        DeliverySender {
            tx: self.tx.clone(),
        }
    }

    /// Append an action to the queue without blocking.
    pub fn enqueue(&self, action: Action) {
        self.sender().enqueue(action);
    }

    /// Supervise the worker until shutdown is signalled.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut pacing = self.pacing.clone();
        let mut pacing_alive = true;

        loop {
            let interval = *pacing.borrow_and_update();
            let (stop_tx, stop_rx) = watch::channel(false);
            let worker = self.spawn_worker(interval, stop_rx);
            info!(pacing_ms = interval.as_millis() as u64, "delivery worker started");

            loop {
                tokio::select! {
                    changed = pacing.changed(), if pacing_alive => {
                        match changed {
                            Ok(()) => {
                                info!("pacing interval changed, restarting delivery worker");
                                let _ = stop_tx.send(true);
                                let _ = worker.await;
                                break;
                            }
                            Err(_) => {
                                // Config store dropped; keep the current worker.
                                pacing_alive = false;
                            }
                        }
                    }
                    changed = shutdown.changed() => {
                        // A dropped sender counts as shutdown; otherwise the
                        // Err arm would be ready on every poll.
                        if changed.is_err() || *shutdown.borrow() {
                            info!("delivery queue shutting down");
                            let _ = stop_tx.send(true);
                            let _ = worker.await;
                            return;
                        }
                    }
                }
            }
        }
    }

    fn spawn_worker(
        &self,
        interval: Duration,
        mut stop: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let dispatcher = self.dispatcher.clone();
        let rx = self.rx.clone();

        tokio::spawn(async move {
            // The previous worker released the receiver before this task
            // was spawned, so the lock is claimed immediately.
            let mut rx = rx.lock().await;
            loop {
                tokio::select! {
                    stopped = stop.changed() => {
                        if stopped.is_err() || *stop.borrow() {
                            debug!("delivery worker stopped");
                            return;
                        }
                    }
                    action = rx.recv() => {
                        let Some(action) = action else {
                            debug!("delivery queue closed");
                            return;
                        };
                        let action = normalize(action);
                        let identity = action.describe();
                        match dispatcher.perform(&action).await {
                            Ok(()) => debug!(action = %identity, "action dispatched"),
                            Err(err) => warn!(action = %identity, error = %err, "action failed"),
                        }
                        // Only the in-flight action may finish; the pacing
                        // pause itself is interruptible by a stop signal.
                        tokio::select! {
                            _ = tokio::time::sleep(interval) => {}
                            stopped = stop.changed() => {
                                if stopped.is_err() || *stop.borrow() {
                                    debug!("delivery worker stopped during pacing pause");
                                    return;
                                }
                            }
                        }
                    }
                }
            }
        })
    }
}
