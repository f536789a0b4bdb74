use super::{types::Config, ConfigError};
use crate::orchestrator::RotationStrategy;

/// Validate configuration
/// Currently validates:
/// - Required paths are non-empty (presence is enforced by serde)
/// - Tor and SOCKS ports are not 0
/// - Detector backoff settings are coherent
/// - Driver template and selectors are usable
/// - Hard restarts have a Tor binary to relaunch
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.downloads_folder_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloads_folder_path cannot be empty".to_string(),
        ));
    }
    if config.setlist_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "setlist_path cannot be empty".to_string(),
        ));
    }

    if config.tor.control_port == 0 {
        return Err(ConfigError::ValidationError(
            "tor.control_port cannot be 0".to_string(),
        ));
    }
    if config.browser.socks_port == 0 {
        return Err(ConfigError::ValidationError(
            "browser.socks_port cannot be 0".to_string(),
        ));
    }

    let detector = &config.detector;
    if detector.initial_poll_ms == 0 {
        return Err(ConfigError::ValidationError(
            "detector.initial_poll_ms cannot be 0".to_string(),
        ));
    }
    if detector.initial_poll_ms > detector.max_poll_ms {
        return Err(ConfigError::ValidationError(format!(
            "detector.initial_poll_ms ({}) exceeds detector.max_poll_ms ({})",
            detector.initial_poll_ms, detector.max_poll_ms
        )));
    }
    if !detector.backoff_factor.is_finite() || detector.backoff_factor < 1.0 {
        return Err(ConfigError::ValidationError(
            "detector.backoff_factor must be a finite number >= 1.0".to_string(),
        ));
    }
    if detector.marker_extension.trim_start_matches('.').is_empty() {
        return Err(ConfigError::ValidationError(
            "detector.marker_extension cannot be empty".to_string(),
        ));
    }

    let driver = &config.driver;
    if !driver.conversion_url_template.contains("{url}") {
        return Err(ConfigError::ValidationError(
            "driver.conversion_url_template must contain {url}".to_string(),
        ));
    }
    if driver.trigger_selector.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "driver.trigger_selector cannot be empty".to_string(),
        ));
    }

    // A hard restart stops Tor; only a managed Tor comes back.
    if config.orchestrator.rotation_strategy == RotationStrategy::Hard
        && config.tor.launch_path.is_none()
    {
        return Err(ConfigError::ValidationError(
            "orchestrator.rotation_strategy = \"hard\" requires tor.launch_path".to_string(),
        ));
    }

    Ok(())
}
