//! Trait definitions for the session module.

use std::time::Duration;

use async_trait::async_trait;

use super::error::SessionError;

/// A located page control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    /// Selector the control was located with.
    pub selector: String,
    /// Driver-side element reference.
    pub element_id: String,
}

/// A live browser session routed through the anonymizing proxy.
#[async_trait]
pub trait Session: Send + Sync {
    /// Opaque session handle.
    fn id(&self) -> &str;

    /// Load a page.
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// Locate a control right now, without waiting.
    async fn find_control(&self, selector: &str) -> Result<Control, SessionError>;

    /// Wait until a control is present, visible and enabled.
    async fn wait_for_control(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Control, SessionError>;

    /// Clear a text field and type a new value.
    async fn fill_field(&self, control: &Control, value: &str) -> Result<(), SessionError>;

    /// Click a control.
    async fn click(&self, control: &Control) -> Result<(), SessionError>;

    /// End the session. Closing twice is not an error.
    async fn close(&self) -> Result<(), SessionError>;
}

/// Creates sessions. Each session gets a fresh browser process.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Returns the name of this factory implementation.
    fn name(&self) -> &str;

    /// Open a new session.
    async fn create(&self) -> Result<Box<dyn Session>, SessionError>;

    /// Release anything the factory keeps alive between sessions.
    async fn shutdown(&self) {}
}
