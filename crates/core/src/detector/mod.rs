//! Download completion detection.
//!
//! Browsers write a transient marker (Firefox: `<name>.part`) while a download
//! is in flight. Completion is the marker set going from non-empty back to
//! empty. A marker has to be seen at least once, so the wait tolerates any
//! delay between the click and the download actually starting.
//!
//! Polling backs off exponentially while nothing changes and is bounded by an
//! optional deadline. `DirectorySnapshot` complements the detector by
//! identifying which files the download produced.

mod config;
mod error;
mod marker;
mod poller;
mod snapshot;

pub use config::DetectorConfig;
pub use error::DetectorError;
pub use marker::{FsMarkerSource, MarkerSource};
pub use poller::{Completion, CompletionDetector};
pub use snapshot::{snapshot_directory, DirectorySnapshot};
