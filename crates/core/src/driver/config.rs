//! Download driver configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the per-item download procedure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Conversion page; `{url}` is replaced by the percent-encoded source URL.
    #[serde(default = "default_conversion_url_template")]
    pub conversion_url_template: String,

    /// CSS selector of the control that starts the download.
    #[serde(default = "default_trigger_selector")]
    pub trigger_selector: String,

    /// CSS selector of the title input. Empty disables the title override.
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// CSS selector of the artist input. Empty disables the artist override.
    #[serde(default = "default_artist_selector")]
    pub artist_selector: String,

    /// Bound for navigation and for the trigger to become clickable (seconds).
    #[serde(default = "default_control_timeout")]
    pub control_timeout_secs: u64,
}

fn default_conversion_url_template() -> String {
    "https://yout.com/video/?url={url}".to_string()
}

fn default_trigger_selector() -> String {
    "button[class='btn btn-primary btn-block btn-yout btn-recorder']".to_string()
}

fn default_title_selector() -> String {
    "input[name='title']".to_string()
}

fn default_artist_selector() -> String {
    "input[name='artist']".to_string()
}

fn default_control_timeout() -> u64 {
    600
}

impl DriverConfig {
    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout_secs)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            conversion_url_template: default_conversion_url_template(),
            trigger_selector: default_trigger_selector(),
            title_selector: default_title_selector(),
            artist_selector: default_artist_selector(),
            control_timeout_secs: default_control_timeout(),
        }
    }
}
