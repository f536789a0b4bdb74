//! Completion detector configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the completion detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Extension of the in-progress marker files (without the dot).
    #[serde(default = "default_marker_extension")]
    pub marker_extension: String,

    /// First poll interval (milliseconds). Also used after every change in
    /// the marker set.
    #[serde(default = "default_initial_poll")]
    pub initial_poll_ms: u64,

    /// Upper bound for the poll interval (milliseconds).
    #[serde(default = "default_max_poll")]
    pub max_poll_ms: u64,

    /// Growth of the poll interval while nothing changes.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Overall wait per item (seconds). 0 waits forever.
    #[serde(default = "default_deadline")]
    pub deadline_secs: u64,
}

fn default_marker_extension() -> String {
    "part".to_string()
}

fn default_initial_poll() -> u64 {
    250
}

fn default_max_poll() -> u64 {
    5000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_deadline() -> u64 {
    1800 // 30 minutes
}

impl DetectorConfig {
    /// Marker extension without a leading dot.
    pub fn extension(&self) -> &str {
        self.marker_extension.trim_start_matches('.')
    }

    pub fn initial_poll(&self) -> Duration {
        Duration::from_millis(self.initial_poll_ms)
    }

    pub fn max_poll(&self) -> Duration {
        Duration::from_millis(self.max_poll_ms)
    }

    /// `None` when the wait is unbounded.
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs))
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            marker_extension: default_marker_extension(),
            initial_poll_ms: default_initial_poll(),
            max_poll_ms: default_max_poll(),
            backoff_factor: default_backoff_factor(),
            deadline_secs: default_deadline(),
        }
    }
}
