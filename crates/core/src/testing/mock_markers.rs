//! Scripted marker source for detector tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::detector::MarkerSource;

use super::lock;

#[derive(Debug)]
enum Listing {
    Markers(Vec<PathBuf>),
    Error(io::ErrorKind),
}

/// Marker source that replays a queued sequence of listings.
///
/// Once the queue is drained every poll returns the default listing, which
/// is empty unless set otherwise.
#[derive(Debug, Default)]
pub struct ScriptedMarkerSource {
    queue: Mutex<VecDeque<Listing>>,
    default: Mutex<Vec<PathBuf>>,
    polls: AtomicU32,
}

impl ScriptedMarkerSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `times` empty listings.
    pub fn push_empty(&self, times: usize) {
        self.push_markers(&[], times);
    }

    /// Queue `times` listings of `names`.
    pub fn push_markers(&self, names: &[&str], times: usize) {
        let listing: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
        let mut queue = lock(&self.queue);
        for _ in 0..times {
            queue.push_back(Listing::Markers(listing.clone()));
        }
    }

    /// Queue one failed listing.
    pub fn push_error(&self, kind: io::ErrorKind) {
        lock(&self.queue).push_back(Listing::Error(kind));
    }

    pub fn set_default_empty(&self) {
        lock(&self.default).clear();
    }

    pub fn set_default_markers(&self, names: &[&str]) {
        *lock(&self.default) = names.iter().map(PathBuf::from).collect();
    }

    /// Polls answered so far.
    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    /// Queued listings not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.queue).len()
    }
}

#[async_trait]
impl MarkerSource for ScriptedMarkerSource {
    async fn in_progress(&self) -> io::Result<Vec<PathBuf>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.queue).pop_front();
        match next {
            Some(Listing::Markers(markers)) => Ok(markers),
            Some(Listing::Error(kind)) => Err(io::Error::new(kind, "scripted listing failure")),
            None => Ok(lock(&self.default).clone()),
        }
    }
}
