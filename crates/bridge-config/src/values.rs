//! Persisted configuration values.

use serde::{Deserialize, Serialize};
use shared_types::Route;

/// The full set of persisted configuration values.
///
/// Every field has a serde default so a partially written file still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigValues {
    /// Display name of this bot instance.
    pub bot_name: String,
    /// Identity used in broker topic namespacing.
    pub bot_id: i64,
    /// Broker endpoint address.
    pub broker_url: String,
    /// Prefix-to-topic routing table for broker fan-out.
    pub routes: Vec<Route>,
    /// Change-detector tick interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Minimum delay between consecutive outbound actions in milliseconds.
    pub pacing_interval_ms: u64,
}

impl Default for ConfigValues {
    fn default() -> Self {
        Self {
            bot_name: "logbridge".to_string(),
            bot_id: 0,
            broker_url: "127.0.0.1:1883".to_string(),
            routes: Vec::new(),
            poll_interval_ms: 100,
            pacing_interval_ms: 50,
        }
    }
}
