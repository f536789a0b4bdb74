//! Rotation scheduling.

/// Counts completed downloads on the current session and says when the
/// identity is due for a refresh.
#[derive(Debug, Clone)]
pub struct RotationCounter {
    threshold: u32,
    count: u32,
}

impl RotationCounter {
    /// A threshold of 0 disables rotation.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            count: 0,
        }
    }

    /// Record one completed item. Returns true when the threshold is reached.
    pub fn record_success(&mut self) -> bool {
        if self.threshold == 0 {
            return false;
        }
        self.count += 1;
        self.count >= self.threshold
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
