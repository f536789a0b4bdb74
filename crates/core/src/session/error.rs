//! Error types for the session module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by an automation session or its factory.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Driver binary not found.
    #[error("WebDriver binary not found at {path}")]
    DriverNotFound { path: PathBuf },

    /// Could not start a driver or open a browser session.
    #[error("failed to start session: {0}")]
    StartupFailed(String),

    /// Could not reach the driver.
    #[error("connection to WebDriver failed: {0}")]
    ConnectionFailed(String),

    /// Navigation failed.
    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    /// No element matches the selector.
    #[error("control not found: {selector}")]
    ControlNotFound { selector: String },

    /// The control did not become interactable in time.
    #[error("timed out after {timeout_secs}s waiting for control {selector}")]
    Timeout { selector: String, timeout_secs: u64 },

    /// The session has been closed or the driver lost it.
    #[error("session is closed")]
    Closed,

    /// Unexpected response from the driver.
    #[error("WebDriver error: {0}")]
    Protocol(String),
}

impl SessionError {
    /// Whether the session is unusable after this error.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::Closed | Self::ConnectionFailed(_))
    }
}
