//! Browser session configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the WebDriver-backed browser session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver endpoint (geckodriver listens on 4444 by default).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Path to a WebDriver binary to spawn. When unset, an already running
    /// driver at `webdriver_url` is used.
    #[serde(default)]
    pub driver_path: Option<PathBuf>,

    /// Browser binary handed to the driver.
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Browser profile directory.
    #[serde(default)]
    pub profile_path: Option<PathBuf>,

    /// SOCKS proxy host the browser routes through.
    #[serde(default = "default_socks_host")]
    pub socks_host: String,

    /// SOCKS proxy port.
    #[serde(default = "default_socks_port")]
    pub socks_port: u16,

    /// Resolve DNS through the proxy.
    #[serde(default)]
    pub socks_remote_dns: bool,

    /// How long to wait for a spawned driver to report ready (seconds).
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// Cadence of the control-readiness wait (milliseconds).
    #[serde(default = "default_control_poll")]
    pub control_poll_ms: u64,

    /// Page load timeout handed to the browser (seconds).
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout_secs: u64,
}

fn default_webdriver_url() -> String {
    "http://127.0.0.1:4444".to_string()
}

fn default_socks_host() -> String {
    "127.0.0.1".to_string()
}

fn default_socks_port() -> u16 {
    9051
}

fn default_startup_timeout() -> u64 {
    30
}

fn default_control_poll() -> u64 {
    500
}

fn default_page_load_timeout() -> u64 {
    600
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            driver_path: None,
            binary_path: None,
            profile_path: None,
            socks_host: default_socks_host(),
            socks_port: default_socks_port(),
            socks_remote_dns: false,
            startup_timeout_secs: default_startup_timeout(),
            control_poll_ms: default_control_poll(),
            page_load_timeout_secs: default_page_load_timeout(),
        }
    }
}
