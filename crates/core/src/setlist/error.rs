//! Error types for the setlist module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or parsing a setlist.
#[derive(Debug, Error)]
pub enum SetlistError {
    /// The line has no detectable URL.
    #[error("line {line}: no URL found")]
    MissingUrl { line: usize },

    /// The URL token could not be parsed.
    #[error("line {line}: invalid URL '{url}': {reason}")]
    InvalidUrl {
        line: usize,
        url: String,
        reason: String,
    },

    /// The setlist file does not exist.
    #[error("setlist not found: {path}")]
    NotFound { path: PathBuf },

    /// The setlist file could not be read.
    #[error("failed to read setlist {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SetlistError {
    /// Whether this error only affects a single line.
    pub fn is_line_error(&self) -> bool {
        matches!(self, Self::MissingUrl { .. } | Self::InvalidUrl { .. })
    }
}
