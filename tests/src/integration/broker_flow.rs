//! # Broker Connection Flows
//!
//! Outage and hygiene behavior of the broker bridge inside a running
//! pipeline: lazy publisher reconnects, subscriber stream recovery, and
//! malformed inbound payloads.

#[cfg(test)]
mod tests {
    use crate::integration::support::{wait_until, RecordingDispatcher};
    use bridge_config::ConfigStore;
    use bridge_runtime::BridgePipeline;
    use lb_01_change_detector::testing::{MockDecrypt, MockLogStore};
    use lb_03_broker_bridge::adapters::memory::InMemoryBrokerTransport;
    use lb_03_broker_bridge::{
        BrokerSubscriber, ConnectOptions, ReplySink, REPLY_TOPIC_PATTERN,
    };
    use parking_lot::Mutex;
    use shared_types::{BrokerReply, ConnectionState, Route};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;

    fn pipeline_with(
        store: Arc<MockLogStore>,
        dispatcher: Arc<RecordingDispatcher>,
        publisher_transport: Arc<InMemoryBrokerTransport>,
        subscriber_transport: Arc<InMemoryBrokerTransport>,
        dir: &tempfile::TempDir,
    ) -> BridgePipeline<MockLogStore, MockDecrypt, RecordingDispatcher, InMemoryBrokerTransport>
    {
        let config = Arc::new(ConfigStore::load(dir.path().join("config.json")));
        config.set_poll_interval_ms(5);
        config.set_pacing_interval_ms(1);
        config.set_routes(vec![Route::new("!", "logbridge/bot/7/events")]);

        BridgePipeline::new(
            config,
            store,
            Arc::new(MockDecrypt),
            dispatcher,
            publisher_transport,
            subscriber_transport,
        )
    }

    #[tokio::test]
    async fn publisher_outage_self_heals_on_next_event() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockLogStore::new());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let publisher_transport = Arc::new(InMemoryBrokerTransport::new());
        let subscriber_transport = Arc::new(InMemoryBrokerTransport::new());
        let pipeline = pipeline_with(
            Arc::clone(&store),
            dispatcher,
            Arc::clone(&publisher_transport),
            subscriber_transport,
            &dir,
        );

        pipeline.connect_broker().await.unwrap();
        let tasks = pipeline.spawn();

        store.append(MockLogStore::plain_record(1, "enc:seed"));
        wait_until(|| pipeline.status().cursor == Some(1)).await;

        // Session drops silently; the next publish notices and reconnects.
        publisher_transport.drop_connection();
        store.append(MockLogStore::plain_record(2, "enc:!after outage"));

        wait_until(|| !publisher_transport.published().is_empty()).await;
        assert_eq!(pipeline.broker_state(), ConnectionState::Connected);
        assert!(publisher_transport.connect_attempts() >= 2);

        pipeline.shutdown();
        for task in tasks {
            task.await.unwrap();
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        replies: Mutex<Vec<BrokerReply>>,
    }

    impl ReplySink for CollectingSink {
        fn submit(&self, reply: BrokerReply) {
            self.replies.lock().push(reply);
        }
    }

    #[tokio::test]
    async fn subscriber_resubscribes_after_stream_close() {
        let transport = Arc::new(InMemoryBrokerTransport::new());
        let sink = Arc::new(CollectingSink::default());
        let subscriber = Arc::new(BrokerSubscriber::new(
            Arc::clone(&transport),
            ConnectOptions::for_role("mem://test", "subscriber"),
            Arc::clone(&sink) as Arc<dyn ReplySink>,
        ));
        subscriber.connect().await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let runner = {
            let subscriber = Arc::clone(&subscriber);
            tokio::spawn(async move { subscriber.run(shutdown_rx).await })
        };

        // Closing the stream forces the reconnect path, which subscribes
        // the reply pattern a second time.
        transport.close_messages();
        wait_until(|| transport.subscriptions().len() >= 2).await;
        assert!(transport
            .subscriptions()
            .iter()
            .all(|pattern| pattern == REPLY_TOPIC_PATTERN));

        let _ = shutdown_tx.send(true);
        timeout(Duration::from_secs(2), runner).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn malformed_inbound_does_not_poison_the_queue() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockLogStore::new());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let publisher_transport = Arc::new(InMemoryBrokerTransport::new());
        let subscriber_transport = Arc::new(InMemoryBrokerTransport::new());
        let pipeline = pipeline_with(
            store,
            Arc::clone(&dispatcher),
            publisher_transport,
            Arc::clone(&subscriber_transport),
            &dir,
        );

        pipeline.connect_broker().await.unwrap();
        let tasks = pipeline.spawn();

        // Garbage, a structurally wrong reply, an unsupported type, and a
        // bad room id, followed by one valid reply.
        subscriber_transport
            .inject("logbridge/bot/7/reply", "not json")
            .await;
        subscriber_transport
            .inject("logbridge/bot/7/reply", r#"{"room":"1"}"#)
            .await;
        subscriber_transport
            .inject(
                "logbridge/bot/7/reply",
                r#"{"type":"sticker","room":"1","data":"x"}"#,
            )
            .await;
        subscriber_transport
            .inject(
                "logbridge/bot/7/reply",
                r#"{"type":"text","room":"not-a-room","data":"x"}"#,
            )
            .await;
        subscriber_transport
            .inject(
                "logbridge/bot/7/reply",
                r#"{"type":"text","room":"55","data":"still alive"}"#,
            )
            .await;

        wait_until(|| !dispatcher.actions.lock().is_empty()).await;
        let actions = dispatcher.actions.lock();
        assert_eq!(actions.len(), 1);
        assert_eq!(
            actions[0],
            shared_types::Action::SendText {
                chat_id: 55,
                message: "still alive".into(),
                thread_id: None,
            }
        );
        drop(actions);

        pipeline.shutdown();
        for task in tasks {
            task.await.unwrap();
        }
    }
}
