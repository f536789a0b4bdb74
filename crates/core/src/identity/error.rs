//! Error types for the identity module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors talking to the anonymizing network or managing its process.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Control port unreachable.
    #[error("cannot reach control port {addr}: {reason}")]
    ConnectionFailed { addr: String, reason: String },

    /// Authentication was refused or impossible.
    #[error("control port authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A command got a non-250 reply.
    #[error("{command} rejected: {code} {message}")]
    Rejected {
        command: String,
        code: u16,
        message: String,
    },

    /// Malformed reply or unexpected EOF.
    #[error("control protocol error: {0}")]
    Protocol(String),

    /// A control exchange took too long.
    #[error("control port did not answer within {secs}s")]
    Timeout { secs: u64 },

    /// Executable not found.
    #[error("Tor executable not found at {path}")]
    NotFound { path: PathBuf },

    /// The process could not be started.
    #[error("failed to launch Tor: {0}")]
    LaunchFailed(String),

    /// The process started but never opened its control port.
    #[error("Tor did not open its control port within {secs}s")]
    StartupTimeout { secs: u64 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
