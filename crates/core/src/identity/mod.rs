//! Anonymizing-network identity control.
//!
//! `IdentityChannel` is the narrow seam the orchestrator uses for circuit
//! rotation and process restarts. `TorIdentityChannel` speaks the Tor control
//! protocol (`AUTHENTICATE`, `SIGNAL NEWNYM`, `SIGNAL SHUTDOWN`) and can own
//! the Tor process itself when `tor.launch_path` is configured.

mod config;
mod error;
mod tor;
mod traits;

pub use config::TorConfig;
pub use error::IdentityError;
pub use tor::{ControlConnection, ControlReply, TorIdentityChannel};
pub use traits::IdentityChannel;
