//! Tor configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the Tor control channel and the optional managed
/// Tor process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorConfig {
    /// Tor (or Tor Browser) executable to launch and manage. When unset,
    /// an externally managed Tor is assumed and restarts only signal it.
    #[serde(default)]
    pub launch_path: Option<PathBuf>,

    /// Extra arguments for the launched process.
    #[serde(default)]
    pub launch_args: Vec<String>,

    /// Control port host.
    #[serde(default = "default_control_host")]
    pub control_host: String,

    /// Control port.
    #[serde(default = "default_control_port")]
    pub control_port: u16,

    /// Control port password. Without one, cookie or null authentication
    /// is negotiated.
    #[serde(default)]
    pub control_password: Option<String>,

    /// Timeout for a single control-port exchange (seconds).
    #[serde(default = "default_control_timeout")]
    pub control_timeout_secs: u64,

    /// How long a launched process gets to open its control port (seconds).
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// How long to wait for a graceful exit before killing (seconds).
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_control_host() -> String {
    "127.0.0.1".to_string()
}

fn default_control_port() -> u16 {
    9050
}

fn default_control_timeout() -> u64 {
    10
}

fn default_startup_timeout() -> u64 {
    60
}

fn default_shutdown_grace() -> u64 {
    10
}

impl TorConfig {
    /// `host:port` of the control port.
    pub fn control_addr(&self) -> String {
        format!("{}:{}", self.control_host, self.control_port)
    }
}

impl Default for TorConfig {
    fn default() -> Self {
        Self {
            launch_path: None,
            launch_args: Vec::new(),
            control_host: default_control_host(),
            control_port: default_control_port(),
            control_password: None,
            control_timeout_secs: default_control_timeout(),
            startup_timeout_secs: default_startup_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TorConfig::default();
        assert_eq!(config.control_port, 9050);
        assert_eq!(config.control_addr(), "127.0.0.1:9050");
        assert!(config.launch_path.is_none());
        assert_eq!(config.shutdown_grace_secs, 10);
    }

    #[test]
    fn test_deserialize_managed_process() {
        let toml = r#"
            launch_path = "/opt/tor/tor"
            launch_args = ["-f", "/etc/tor/torrc"]
            control_password = "s3cret"
        "#;
        let config: TorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.launch_path, Some(PathBuf::from("/opt/tor/tor")));
        assert_eq!(config.launch_args, vec!["-f", "/etc/tor/torrc"]);
        assert_eq!(config.control_password.as_deref(), Some("s3cret"));
        assert_eq!(config.control_port, 9050);
    }
}
