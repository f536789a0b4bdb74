//! Marker polling with backoff and an optional deadline.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::config::DetectorConfig;
use super::error::DetectorError;
use super::marker::MarkerSource;

/// An observed download completion: markers appeared, then all vanished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Number of listings performed.
    pub polls: u32,
    /// Largest number of simultaneous markers seen.
    pub peak_markers: usize,
    /// Time from the start of the wait to completion.
    pub elapsed: Duration,
}

/// Waits for the in-progress marker set to go non-empty and then empty.
#[derive(Debug, Clone)]
pub struct CompletionDetector {
    config: DetectorConfig,
}

impl CompletionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn next_interval(&self, current: Duration) -> Duration {
        let max = self.config.max_poll();
        let secs = current.as_secs_f64() * self.config.backoff_factor.max(1.0);
        Duration::try_from_secs_f64(secs).map_or(max, |next| next.min(max))
    }

    /// Block until completion, deadline expiry or cancellation.
    ///
    /// A marker must be seen at least once before an empty listing counts
    /// as completion.
    pub async fn wait_for_completion(
        &self,
        source: &dyn MarkerSource,
        cancel: &CancellationToken,
    ) -> Result<Completion, DetectorError> {
        let started = Instant::now();
        let deadline = self.config.deadline().map(|d| started + d);

        let mut marker_observed = false;
        let mut peak_markers = 0;
        let mut polls = 0u32;
        let mut last_count: Option<usize> = None;
        let mut interval = self.config.initial_poll();

        loop {
            if cancel.is_cancelled() {
                return Err(DetectorError::Cancelled);
            }

            let markers = source.in_progress().await?;
            polls += 1;

            if markers.is_empty() {
                if marker_observed {
                    let completion = Completion {
                        polls,
                        peak_markers,
                        elapsed: started.elapsed(),
                    };
                    debug!("Markers cleared after {:?}", completion.elapsed);
                    return Ok(completion);
                }
            } else {
                if !marker_observed {
                    debug!("In-progress marker appeared: {:?}", markers[0]);
                }
                marker_observed = true;
                peak_markers = peak_markers.max(markers.len());
            }

            interval = if last_count == Some(markers.len()) {
                self.next_interval(interval)
            } else {
                self.config.initial_poll()
            };
            last_count = Some(markers.len());

            let mut wait = interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(DetectorError::TimedOut {
                        waited_secs: started.elapsed().as_secs(),
                        marker_observed,
                    });
                }
                wait = wait.min(deadline - now);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(DetectorError::Cancelled),
                _ = sleep(wait) => {}
            }
        }
    }
}
