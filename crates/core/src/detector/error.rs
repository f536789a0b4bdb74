//! Error types for the detector module.

use thiserror::Error;

/// Errors that end a completion wait without a completion.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The watched directory vanished while being listed.
    #[error("download directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// Other listing failure.
    #[error("I/O error: {0}")]
    Io(std::io::Error),

    /// The deadline passed first.
    #[error("no completion after {waited_secs}s (marker observed: {marker_observed})")]
    TimedOut {
        waited_secs: u64,
        marker_observed: bool,
    },

    /// Cancelled by the caller.
    #[error("completion wait cancelled")]
    Cancelled,
}

impl From<std::io::Error> for DetectorError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::DirectoryUnavailable(e.to_string())
        } else {
            Self::Io(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_not_found_maps_to_unavailable() {
        let err = DetectorError::from(Error::new(ErrorKind::NotFound, "gone"));
        assert!(matches!(err, DetectorError::DirectoryUnavailable(_)));

        let err = DetectorError::from(Error::new(ErrorKind::PermissionDenied, "nope"));
        assert!(matches!(err, DetectorError::Io(_)));
    }

    #[test]
    fn test_timeout_display() {
        let err = DetectorError::TimedOut {
            waited_secs: 30,
            marker_observed: false,
        };
        assert_eq!(
            err.to_string(),
            "no completion after 30s (marker observed: false)"
        );
    }
}
