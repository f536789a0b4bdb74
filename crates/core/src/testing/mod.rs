//! Testing utilities and mock implementations.
//!
//! Mocks for every capability the orchestrator depends on, so the whole
//! download loop can run without a browser, a WebDriver or a Tor process.
//!
//! # Example
//!
//! ```rust,ignore
//! use setgrab_core::testing::{MockIdentityChannel, MockSessionFactory, DownloadSimulator};
//!
//! let sessions = MockSessionFactory::new()
//!     .with_simulator(DownloadSimulator::new(dir.path(), Duration::from_millis(20)));
//! let identity = MockIdentityChannel::new();
//!
//! // Run the orchestrator, then inspect what happened
//! assert_eq!(identity.rotate_count(), 1);
//! ```

mod mock_identity;
mod mock_markers;
mod mock_session;

pub use mock_identity::MockIdentityChannel;
pub use mock_markers::ScriptedMarkerSource;
pub use mock_session::{DownloadSimulator, MockSession, MockSessionFactory, SessionSetup};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock a mock's state, ignoring poisoning from a panicked test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One call log shared by several mocks, for checking the order of calls
/// across them. Entries look like `<source>: <call>`.
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, source: &str, call: &str) {
        lock(&self.entries).push(format!("{}: {}", source, call));
    }

    /// Everything recorded so far, in order.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Position of the first entry at or after `from` containing `needle`.
    pub fn position(&self, needle: &str, from: usize) -> Option<usize> {
        lock(&self.entries)
            .iter()
            .skip(from)
            .position(|e| e.contains(needle))
            .map(|i| i + from)
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use reqwest::Url;

    use crate::config::Config;
    use crate::setlist::{Setlist, WorkItem};

    /// Create a work item. Panics on an invalid URL.
    pub fn work_item(track: &str, artist: &str, url: &str) -> WorkItem {
        WorkItem {
            line: 1,
            track: track.to_string(),
            artist: artist.to_string(),
            source_url: Url::parse(url).expect("fixture URL must be valid"),
        }
    }

    /// Create a setlist of `count` items with distinct URLs and line numbers.
    pub fn setlist(count: usize) -> Setlist {
        (1..=count)
            .map(|i| WorkItem {
                line: i,
                ..work_item(&format!("Track {}", i), "Artist", &format!("https://a.test/{}", i))
            })
            .collect::<Vec<_>>()
            .into()
    }

    /// Create a config pointing at `downloads` with fast polling and no
    /// settle pauses.
    pub fn config(downloads: &std::path::Path) -> Config {
        let mut config = Config {
            downloads_folder_path: downloads.to_path_buf(),
            setlist_path: downloads.join("setlist.txt"),
            browser: Default::default(),
            tor: Default::default(),
            driver: Default::default(),
            detector: Default::default(),
            orchestrator: Default::default(),
            logging: Default::default(),
        };
        config.driver.control_timeout_secs = 2;
        config.detector.initial_poll_ms = 5;
        config.detector.max_poll_ms = 20;
        config.detector.deadline_secs = 5;
        config.orchestrator.rotation_settle_secs = 0;
        config.orchestrator.restart_settle_secs = 0;
        config
    }
}
