//! # Config-Driven Delivery Flow
//!
//! Exercises the delivery queue against a real [`ConfigStore`]: the pacing
//! interval comes from the persisted configuration and changing it restarts
//! the worker without losing or reordering queued actions.

#[cfg(test)]
mod tests {
    use crate::integration::support::wait_until;
    use async_trait::async_trait;
    use bridge_config::ConfigStore;
    use lb_02_delivery_queue::{ActionDispatcher, DeliveryQueue};
    use parking_lot::Mutex;
    use shared_types::{Action, ActionError};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio::sync::watch;
    use tokio::time::timeout;

    #[derive(Default)]
    struct TimestampingDispatcher {
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl TimestampingDispatcher {
        fn identities(&self) -> Vec<String> {
            self.calls.lock().iter().map(|(id, _)| id.clone()).collect()
        }
    }

    #[async_trait]
    impl ActionDispatcher for TimestampingDispatcher {
        async fn perform(&self, action: &Action) -> Result<(), ActionError> {
            self.calls.lock().push((action.describe(), Instant::now()));
            Ok(())
        }
    }

    fn text(chat_id: i64) -> Action {
        Action::SendText {
            chat_id,
            message: format!("message {chat_id}"),
            thread_id: None,
        }
    }

    #[tokio::test]
    async fn pacing_comes_from_the_config_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigStore::load(dir.path().join("config.json"));
        config.set_pacing_interval_ms(40);

        let dispatcher = Arc::new(TimestampingDispatcher::default());
        let queue = Arc::new(DeliveryQueue::new(
            Arc::clone(&dispatcher),
            config.watch_pacing(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        for id in 1..=3 {
            queue.enqueue(text(id));
        }
        let runner = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.run(shutdown_rx).await })
        };

        wait_until(|| dispatcher.calls.lock().len() == 3).await;
        let _ = shutdown_tx.send(true);
        timeout(Duration::from_secs(2), runner).await.unwrap().unwrap();

        let calls = dispatcher.calls.lock();
        for pair in calls.windows(2) {
            let gap = pair[1].1.duration_since(pair[0].1);
            assert!(gap >= Duration::from_millis(35), "gap too small: {gap:?}");
        }
    }

    #[tokio::test]
    async fn runtime_pacing_change_restarts_without_losing_actions() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigStore::load(dir.path().join("config.json"));
        config.set_pacing_interval_ms(40);

        let dispatcher = Arc::new(TimestampingDispatcher::default());
        let queue = Arc::new(DeliveryQueue::new(
            Arc::clone(&dispatcher),
            config.watch_pacing(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        for id in 1..=8 {
            queue.enqueue(text(id));
        }
        let runner = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.run(shutdown_rx).await })
        };

        // Speed the queue up mid-stream through the config API.
        wait_until(|| dispatcher.calls.lock().len() >= 2).await;
        config.set_pacing_interval_ms(1);

        wait_until(|| dispatcher.calls.lock().len() == 8).await;
        let _ = shutdown_tx.send(true);
        timeout(Duration::from_secs(2), runner).await.unwrap().unwrap();

        let expected: Vec<String> = (1..=8).map(|id| format!("send-text chat={id}")).collect();
        assert_eq!(dispatcher.identities(), expected);

        // The new interval survives a config reload.
        let reloaded = ConfigStore::load(dir.path().join("config.json"));
        assert_eq!(reloaded.pacing_interval(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn actions_enqueued_before_startup_are_not_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigStore::load(dir.path().join("config.json"));
        config.set_pacing_interval_ms(1);

        let dispatcher = Arc::new(TimestampingDispatcher::default());
        let queue = Arc::new(DeliveryQueue::new(
            Arc::clone(&dispatcher),
            config.watch_pacing(),
        ));
        let sender = queue.sender();
        sender.enqueue(text(1));
        sender.enqueue(text(2));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let runner = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.run(shutdown_rx).await })
        };

        wait_until(|| dispatcher.calls.lock().len() == 2).await;
        let _ = shutdown_tx.send(true);
        timeout(Duration::from_secs(2), runner).await.unwrap().unwrap();

        assert_eq!(
            dispatcher.identities(),
            vec!["send-text chat=1", "send-text chat=2"]
        );
    }
}
