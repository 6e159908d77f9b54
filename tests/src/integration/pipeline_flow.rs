//! # End-to-End Pipeline Flow
//!
//! Drives the whole bridge with in-memory ports: records appended to the
//! mock store come out on the broadcast bus and the broker publisher, and
//! replies injected on the subscriber side land at the action dispatcher.

#[cfg(test)]
mod tests {
    use crate::integration::support::{wait_until, RecordingDispatcher};
    use bridge_config::ConfigStore;
    use bridge_runtime::BridgePipeline;
    use lb_01_change_detector::testing::{MockDecrypt, MockLogStore};
    use lb_03_broker_bridge::adapters::memory::InMemoryBrokerTransport;
    use shared_types::{Action, Route, EMPTY_ATTACHMENT, ORIGIN_SYNC};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    struct Harness {
        pipeline: BridgePipeline<
            MockLogStore,
            MockDecrypt,
            RecordingDispatcher,
            InMemoryBrokerTransport,
        >,
        store: Arc<MockLogStore>,
        dispatcher: Arc<RecordingDispatcher>,
        publisher_transport: Arc<InMemoryBrokerTransport>,
        subscriber_transport: Arc<InMemoryBrokerTransport>,
        tasks: Vec<tokio::task::JoinHandle<()>>,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        async fn start() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = Arc::new(ConfigStore::load(dir.path().join("config.json")));
            config.set_poll_interval_ms(5);
            config.set_pacing_interval_ms(1);
            config.set_routes(vec![Route::new("!", "logbridge/bot/7/events")]);

            let store = Arc::new(MockLogStore::new());
            let dispatcher = Arc::new(RecordingDispatcher::default());
            let publisher_transport = Arc::new(InMemoryBrokerTransport::new());
            let subscriber_transport = Arc::new(InMemoryBrokerTransport::new());

            let pipeline = BridgePipeline::new(
                config,
                Arc::clone(&store),
                Arc::new(MockDecrypt),
                Arc::clone(&dispatcher),
                Arc::clone(&publisher_transport),
                Arc::clone(&subscriber_transport),
            );
            pipeline.connect_broker().await.unwrap();
            let tasks = pipeline.spawn();

            let harness = Self {
                pipeline,
                store,
                dispatcher,
                publisher_transport,
                subscriber_transport,
                tasks,
                _dir: dir,
            };

            // First tick pins the cursor at the seed record; nothing before
            // it is ever replayed.
            harness.store.append(MockLogStore::plain_record(1, "enc:seed"));
            let pipeline = &harness.pipeline;
            wait_until(|| pipeline.status().cursor == Some(1)).await;
            harness
        }

        async fn stop(self) {
            self.pipeline.shutdown();
            for task in self.tasks {
                task.await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn record_travels_store_to_bus_and_broker() {
        let harness = Harness::start().await;
        let mut sub = harness.pipeline.subscribe();

        harness
            .store
            .append(MockLogStore::plain_record(2, "enc:!weather"));
        wait_until(|| harness.pipeline.status().cursor == Some(2)).await;

        let envelope: serde_json::Value = serde_json::from_str(
            &timeout(Duration::from_secs(2), sub.recv()).await.unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(envelope["msg"], "!weather");
        assert_eq!(envelope["room"], "room-100");
        assert_eq!(envelope["sender"], "user-200");
        assert_eq!(envelope["json"]["_id"], "2");

        let publisher_transport = &harness.publisher_transport;
        wait_until(|| !publisher_transport.published().is_empty()).await;
        let (topic, payload) = harness.publisher_transport.published().remove(0);
        assert_eq!(topic, "logbridge/bot/7/events");
        let routed: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(routed["msg"], "!weather");

        harness.stop().await;
    }

    #[tokio::test]
    async fn reply_round_trip_reaches_the_dispatcher() {
        let harness = Harness::start().await;

        harness
            .store
            .append(MockLogStore::plain_record(2, "enc:!ping"));
        let publisher_transport = &harness.publisher_transport;
        wait_until(|| !publisher_transport.published().is_empty()).await;

        // A remote bot answers the routed event on the reply topic.
        harness
            .subscriber_transport
            .inject(
                "logbridge/bot/7/reply",
                r#"{"type":"text","room":"100","threadId":"42","data":"pong"}"#,
            )
            .await;

        let dispatcher = &harness.dispatcher;
        wait_until(|| !dispatcher.actions.lock().is_empty()).await;
        assert_eq!(
            harness.dispatcher.actions.lock()[0],
            Action::SendText {
                chat_id: 100,
                message: "pong".into(),
                thread_id: Some(42),
            }
        );

        harness.stop().await;
    }

    #[tokio::test]
    async fn synthetic_and_unrouted_records_stay_local() {
        let harness = Harness::start().await;

        harness
            .store
            .append(MockLogStore::synthetic_record(2, ORIGIN_SYNC));
        // No "!" prefix, so no route matches either.
        harness
            .store
            .append(MockLogStore::plain_record(3, "enc:plain chatter"));
        wait_until(|| harness.pipeline.status().cursor == Some(3)).await;

        let status = harness.pipeline.status();
        assert_eq!(status.recent.len(), 1);
        assert_eq!(status.recent[0].log_id, 3);

        // Give the offloaded publish path a moment to (not) fire.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(harness.publisher_transport.published().is_empty());

        harness.stop().await;
    }

    #[tokio::test]
    async fn gift_record_fans_out_with_suppressed_attachment() {
        let harness = Harness::start().await;
        let mut sub = harness.pipeline.subscribe();

        let mut gift = MockLogStore::plain_record(2, "enc:!축하 선물 왔어요");
        gift.msg_type = "71".into();
        gift.attachment = Some("enc:{\"coupon\":\"secret\"}".into());
        harness.store.append(gift);
        wait_until(|| harness.pipeline.status().cursor == Some(2)).await;

        let envelope: serde_json::Value = serde_json::from_str(
            &timeout(Duration::from_secs(2), sub.recv()).await.unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(envelope["json"]["attachment"], EMPTY_ATTACHMENT);

        harness.stop().await;
    }
}
