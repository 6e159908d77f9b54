//! # Pipeline Container
//!
//! Holds every subsystem instance and manages wiring and lifecycle.
//!
//! ## Wiring order
//!
//! 1. Routing table and broker publisher (no dependencies)
//! 2. Change detector, fanning out to the bus and the publisher
//! 3. Delivery queue and its inbound command adapter
//! 4. Broker subscriber, feeding the command adapter
//!
//! All inter-subsystem communication goes through the glue adapters in
//! [`crate::adapters`]; subsystems never hold each other directly.

use crate::adapters::{QueueReplySink, RoutingSink};
use anyhow::Context;
use bridge_bus::{BroadcastBus, BusSubscription};
use bridge_config::ConfigStore;
use lb_01_change_detector::{ChangeDetector, ChatLogStore, DecryptProvider, DetectorStatus};
use lb_02_delivery_queue::{ActionDispatcher, DeliveryQueue, InboundCommandAdapter};
use lb_03_broker_bridge::{
    BrokerPublisher, BrokerSubscriber, BrokerTransport, ConnectOptions, RouteTable,
};
use shared_types::{Action, ConnectionState, Route};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Central container wiring the bridge subsystems together.
///
/// Generic over the four outward-facing ports: the chat-log store `S`, the
/// decryption provider `D`, the action dispatcher `A`, and the broker
/// transport `T`. The publisher and subscriber roles each get their own
/// transport instance, mirroring the two independent broker sessions.
pub struct BridgePipeline<S, D, A, T>
where
    S: ChatLogStore + 'static,
    D: DecryptProvider + 'static,
    A: ActionDispatcher,
    T: BrokerTransport,
{
    config: Arc<ConfigStore>,
    bus: Arc<BroadcastBus>,
    routes: Arc<RouteTable>,
    detector: Arc<ChangeDetector<S, D, RoutingSink<T>>>,
    publisher: Arc<BrokerPublisher<T>>,
    subscriber: Arc<BrokerSubscriber<T>>,
    delivery: Arc<DeliveryQueue<A>>,
    commands: Arc<InboundCommandAdapter>,
    shutdown_tx: watch::Sender<bool>,
}

impl<S, D, A, T> BridgePipeline<S, D, A, T>
where
    S: ChatLogStore + 'static,
    D: DecryptProvider + 'static,
    A: ActionDispatcher,
    T: BrokerTransport,
{
    /// Wire the pipeline from its outward-facing ports.
    pub fn new(
        config: Arc<ConfigStore>,
        store: Arc<S>,
        decrypt: Arc<D>,
        dispatcher: Arc<A>,
        publisher_transport: Arc<T>,
        subscriber_transport: Arc<T>,
    ) -> Self {
        info!("wiring bridge pipeline");
        let broker_url = config.broker_url();

        let routes = Arc::new(RouteTable::new(config.routes()));
        let publisher = Arc::new(BrokerPublisher::new(
            publisher_transport,
            ConnectOptions::for_role(&broker_url, "publisher"),
            Arc::clone(&routes),
        ));

        let bus = Arc::new(BroadcastBus::new());
        let detector = Arc::new(ChangeDetector::new(
            store,
            decrypt,
            Arc::new(RoutingSink::new(Arc::clone(&publisher))),
            Arc::clone(&bus) as Arc<dyn bridge_bus::EnvelopeSink>,
        ));

        let delivery = Arc::new(DeliveryQueue::new(dispatcher, config.watch_pacing()));
        let commands = Arc::new(InboundCommandAdapter::new(delivery.sender()));
        let subscriber = Arc::new(BrokerSubscriber::new(
            subscriber_transport,
            ConnectOptions::for_role(&broker_url, "subscriber"),
            Arc::new(QueueReplySink::new(Arc::clone(&commands))),
        ));

        let (shutdown_tx, _) = watch::channel(false);
        info!("bridge pipeline wired");

        Self {
            config,
            bus,
            routes,
            detector,
            publisher,
            subscriber,
            delivery,
            commands,
            shutdown_tx,
        }
    }

    /// Open both broker sessions.
    ///
    /// Failure here is not fatal to the pipeline: the publisher reconnects
    /// lazily on the next publish and the subscriber retries from its run
    /// loop. Callers that want startup to be loud can propagate the error.
    pub async fn connect_broker(&self) -> anyhow::Result<()> {
        self.publisher
            .connect()
            .await
            .context("publisher session")?;
        self.subscriber
            .connect()
            .await
            .context("subscriber session")?;
        Ok(())
    }

    /// Connect the broker sessions and spawn every loop.
    pub async fn start(&self) -> anyhow::Result<Vec<JoinHandle<()>>> {
        self.connect_broker().await?;
        Ok(self.spawn())
    }

    /// Spawn the three long-running loops.
    ///
    /// The handles resolve once [`shutdown`](Self::shutdown) is called.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        let poll_interval = self.config.poll_interval();

        let detector = Arc::clone(&self.detector);
        let detector_shutdown = self.shutdown_tx.subscribe();
        let detector_task = tokio::spawn(async move {
            detector.run(poll_interval, detector_shutdown).await;
        });

        let delivery = Arc::clone(&self.delivery);
        let delivery_shutdown = self.shutdown_tx.subscribe();
        let delivery_task = tokio::spawn(async move {
            delivery.run(delivery_shutdown).await;
        });

        let subscriber = Arc::clone(&self.subscriber);
        let subscriber_shutdown = self.shutdown_tx.subscribe();
        let subscriber_task = tokio::spawn(async move {
            subscriber.run(subscriber_shutdown).await;
        });

        vec![detector_task, delivery_task, subscriber_task]
    }

    /// Signal every loop to stop after its in-flight work.
    pub fn shutdown(&self) {
        info!("bridge pipeline shutting down");
        let _ = self.shutdown_tx.send(true);
    }

    /// Enqueue an outbound action directly (request-API path).
    pub fn enqueue_action(&self, action: Action) {
        self.commands.accept_action(action);
    }

    /// Attach a live subscriber to the broadcast bus.
    #[must_use]
    pub fn subscribe(&self) -> BusSubscription {
        self.bus.subscribe()
    }

    /// Detector snapshot: polling flag, cursor, recent history.
    #[must_use]
    pub fn status(&self) -> DetectorStatus {
        self.detector.status()
    }

    /// Publisher-role connection state.
    #[must_use]
    pub fn broker_state(&self) -> ConnectionState {
        self.publisher.connection_state()
    }

    /// Replace the routing table, persisting it and making it visible to
    /// the next route selection without a restart.
    pub fn set_routes(&self, routes: Vec<Route>) {
        self.config.set_routes(routes.clone());
        self.routes.replace(routes);
    }

    /// The configuration store backing this pipeline.
    #[must_use]
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }
}
