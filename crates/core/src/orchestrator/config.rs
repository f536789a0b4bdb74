//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the network identity is refreshed every `rotation_threshold` items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Ask Tor for a new circuit; the browser session stays up.
    #[default]
    Soft,
    /// Close the session, restart Tor, open a new session.
    Hard,
}

/// Configuration for the download loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Completed downloads between identity refreshes (0 = never).
    #[serde(default = "default_rotation_threshold")]
    pub rotation_threshold: u32,

    /// Soft rotation or hard restart.
    #[serde(default)]
    pub rotation_strategy: RotationStrategy,

    /// Pause after a circuit rotation (seconds).
    #[serde(default = "default_settle")]
    pub rotation_settle_secs: u64,

    /// Pause between stopping and relaunching Tor on a hard restart (seconds).
    #[serde(default = "default_settle")]
    pub restart_settle_secs: u64,
}

fn default_rotation_threshold() -> u32 {
    3
}

fn default_settle() -> u64 {
    5
}

impl OrchestratorConfig {
    pub fn rotation_settle(&self) -> Duration {
        Duration::from_secs(self.rotation_settle_secs)
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_secs(self.restart_settle_secs)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            rotation_threshold: default_rotation_threshold(),
            rotation_strategy: RotationStrategy::default(),
            rotation_settle_secs: default_settle(),
            restart_settle_secs: default_settle(),
        }
    }
}
