//! Cross-subsystem integration flows.

pub mod broker_flow;
pub mod delivery_flow;
pub mod pipeline_flow;

#[cfg(test)]
pub(crate) mod support {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared_types::{Action, ActionError};
    use std::time::Duration;

    /// Dispatcher that records everything it performs.
    #[derive(Default)]
    pub struct RecordingDispatcher {
        pub actions: Mutex<Vec<Action>>,
    }

    #[async_trait]
    impl lb_02_delivery_queue::ActionDispatcher for RecordingDispatcher {
        async fn perform(&self, action: &Action) -> Result<(), ActionError> {
            self.actions.lock().push(action.clone());
            Ok(())
        }
    }

    /// Poll `condition` until it holds or roughly two seconds elapse.
    pub async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }
}
