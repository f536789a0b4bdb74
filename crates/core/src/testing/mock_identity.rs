//! Mock identity channel for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::identity::{IdentityChannel, IdentityError};

use super::{lock, CallJournal};

#[derive(Debug, Default)]
struct Failures {
    rotate: bool,
    terminate: bool,
    launch: bool,
}

/// Mock implementation of the IdentityChannel trait.
///
/// Records `rotate`, `terminate` and `launch` calls in order and can be told
/// to fail any of them.
#[derive(Debug, Default)]
pub struct MockIdentityChannel {
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<Failures>,
    journal: Option<CallJournal>,
}

impl MockIdentityChannel {
    /// Create a new mock identity channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record every call in `journal`.
    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Calls made so far, in order.
    pub fn recorded_calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn rotate_count(&self) -> usize {
        self.count("rotate")
    }

    pub fn terminate_count(&self) -> usize {
        self.count("terminate")
    }

    pub fn launch_count(&self) -> usize {
        self.count("launch")
    }

    pub fn fail_rotate(&self, fail: bool) {
        lock(&self.failures).rotate = fail;
    }

    pub fn fail_terminate(&self, fail: bool) {
        lock(&self.failures).terminate = fail;
    }

    pub fn fail_launch(&self, fail: bool) {
        lock(&self.failures).launch = fail;
    }

    fn count(&self, call: &str) -> usize {
        lock(&self.calls).iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str, fail: bool) -> Result<(), IdentityError> {
        lock(&self.calls).push(call);
        if let Some(journal) = &self.journal {
            journal.record("identity", call);
        }
        if fail {
            return Err(IdentityError::Rejected {
                command: call.to_uppercase(),
                code: 552,
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityChannel for MockIdentityChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn rotate(&self) -> Result<(), IdentityError> {
        let fail = lock(&self.failures).rotate;
        self.record("rotate", fail)
    }

    async fn terminate(&self) -> Result<(), IdentityError> {
        let fail = lock(&self.failures).terminate;
        self.record("terminate", fail)
    }

    async fn launch(&self) -> Result<(), IdentityError> {
        let fail = lock(&self.failures).launch;
        self.record("launch", fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_fails() {
        let identity = MockIdentityChannel::new();
        identity.launch().await.unwrap();
        identity.fail_rotate(true);
        assert!(identity.rotate().await.is_err());
        identity.fail_rotate(false);
        identity.rotate().await.unwrap();

        assert_eq!(identity.recorded_calls(), vec!["launch", "rotate", "rotate"]);
        assert_eq!(identity.rotate_count(), 2);
        assert_eq!(identity.terminate_count(), 0);
    }

    #[tokio::test]
    async fn test_journal_sees_calls() {
        let journal = CallJournal::new();
        let identity = MockIdentityChannel::new().with_journal(journal.clone());
        identity.launch().await.unwrap();
        identity.rotate().await.unwrap();

        assert_eq!(journal.entries(), vec!["identity: launch", "identity: rotate"]);
        assert_eq!(journal.position("rotate", 0), Some(1));
        assert_eq!(journal.position("launch", 1), None);
    }
}
