//! Trait definitions for the identity module.

use async_trait::async_trait;

use super::error::IdentityError;

/// Control over the anonymizing network the browser routes through.
#[async_trait]
pub trait IdentityChannel: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Ask for a fresh circuit without restarting anything.
    async fn rotate(&self) -> Result<(), IdentityError>;

    /// Stop the underlying process, gracefully first, then by force.
    async fn terminate(&self) -> Result<(), IdentityError>;

    /// Start the underlying process if it is managed here and not running.
    async fn launch(&self) -> Result<(), IdentityError>;
}
