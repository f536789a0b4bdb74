use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::detector::DetectorConfig;
use crate::driver::DriverConfig;
use crate::identity::TorConfig;
use crate::orchestrator::{OrchestratorConfig, RotationStrategy};
use crate::session::BrowserConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directory the browser downloads into and the detector polls.
    pub downloads_folder_path: PathBuf,
    /// Work-list file, one item per line.
    pub setlist_path: PathBuf,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub tor: TorConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Plain-text application log, appended to on every run.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("app.log")
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Sanitized config for startup logs (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub downloads_folder_path: PathBuf,
    pub setlist_path: PathBuf,
    pub webdriver_url: String,
    pub socks_proxy: String,
    pub tor_control: String,
    pub tor_password_configured: bool,
    pub tor_managed: bool,
    pub rotation_strategy: RotationStrategy,
    pub rotation_threshold: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector_deadline_secs: Option<u64>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            downloads_folder_path: config.downloads_folder_path.clone(),
            setlist_path: config.setlist_path.clone(),
            webdriver_url: config.browser.webdriver_url.clone(),
            socks_proxy: format!("{}:{}", config.browser.socks_host, config.browser.socks_port),
            tor_control: format!("{}:{}", config.tor.control_host, config.tor.control_port),
            tor_password_configured: config
                .tor
                .control_password
                .as_ref()
                .is_some_and(|p| !p.is_empty()),
            tor_managed: config.tor.launch_path.is_some(),
            rotation_strategy: config.orchestrator.rotation_strategy,
            rotation_threshold: config.orchestrator.rotation_threshold,
            detector_deadline_secs: config.detector.deadline().map(|d| d.as_secs()),
        }
    }
}
