//! Configuration store with persistence and change notification.

use crate::values::ConfigValues;
use crate::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use parking_lot::RwLock;
use shared_types::{ConfigError, Route};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Read-mostly configuration store.
///
/// Reads go through a `parking_lot` lock snapshot; writes persist to the
/// backing file and, for the pacing interval, notify subscribers through a
/// `watch` channel so the delivery queue can restart its worker.
pub struct ConfigStore {
    path: PathBuf,
    values: RwLock<ConfigValues>,
    pacing_tx: watch::Sender<Duration>,
}

impl ConfigStore {
    /// Load from the path given by `LOGBRIDGE_CONFIG_PATH`, falling back to
    /// `config.json` in the working directory.
    #[must_use]
    pub fn load_from_env() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load(path)
    }

    /// Load configuration from `path`.
    ///
    /// A missing, unreadable, or malformed file falls back to defaults and
    /// writes the defaults back. This never fails.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read_file(&path) {
            Ok(values) => values,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "falling back to default config");
                let defaults = ConfigValues::default();
                if let Err(err) = Self::write_file(&path, &defaults) {
                    warn!(path = %path.display(), error = %err, "failed to write default config");
                }
                defaults
            }
        };

        let (pacing_tx, _) = watch::channel(Duration::from_millis(values.pacing_interval_ms));
        Self {
            path,
            values: RwLock::new(values),
            pacing_tx,
        }
    }

    fn read_file(path: &Path) -> Result<ConfigValues, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn write_file(path: &Path, values: &ConfigValues) -> Result<(), ConfigError> {
        let raw = serde_json::to_string_pretty(values)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, raw).map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))
    }

    fn persist(&self, values: &ConfigValues) {
        if let Err(err) = Self::write_file(&self.path, values) {
            warn!(path = %self.path.display(), error = %err, "failed to persist config");
        }
    }

    /// Snapshot of the full configuration.
    #[must_use]
    pub fn snapshot(&self) -> ConfigValues {
        self.values.read().clone()
    }

    #[must_use]
    pub fn bot_name(&self) -> String {
        self.values.read().bot_name.clone()
    }

    #[must_use]
    pub fn bot_id(&self) -> i64 {
        self.values.read().bot_id
    }

    #[must_use]
    pub fn broker_url(&self) -> String {
        self.values.read().broker_url.clone()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.values.read().routes.clone()
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.values.read().poll_interval_ms)
    }

    #[must_use]
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.values.read().pacing_interval_ms)
    }

    /// Subscribe to pacing-interval changes.
    ///
    /// The receiver always holds the current value.
    #[must_use]
    pub fn watch_pacing(&self) -> watch::Receiver<Duration> {
        self.pacing_tx.subscribe()
    }

    pub fn set_bot_id(&self, bot_id: i64) {
        let mut values = self.values.write();
        values.bot_id = bot_id;
        self.persist(&values);
        info!(bot_id, "bot id updated");
    }

    pub fn set_broker_url(&self, broker_url: impl Into<String>) {
        let mut values = self.values.write();
        values.broker_url = broker_url.into();
        self.persist(&values);
        info!(broker_url = %values.broker_url, "broker url updated");
    }

    /// Replace the routing table. Visible to the next route selection; the
    /// fan-out sink does not need a restart.
    pub fn set_routes(&self, routes: Vec<Route>) {
        let mut values = self.values.write();
        values.routes = routes;
        self.persist(&values);
        info!(count = values.routes.len(), "routes updated");
    }

    pub fn set_poll_interval_ms(&self, poll_interval_ms: u64) {
        let mut values = self.values.write();
        values.poll_interval_ms = poll_interval_ms;
        self.persist(&values);
        info!(poll_interval_ms, "poll interval updated");
    }

    /// Update the pacing interval and notify subscribers.
    pub fn set_pacing_interval_ms(&self, pacing_interval_ms: u64) {
        let mut values = self.values.write();
        values.pacing_interval_ms = pacing_interval_ms;
        self.persist(&values);
        drop(values);

        // Receivers only see the latest value, which is all they need.
        let _ = self.pacing_tx.send(Duration::from_millis(pacing_interval_ms));
        info!(pacing_interval_ms, "pacing interval updated");
    }
}
