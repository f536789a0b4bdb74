//! Mock browser sessions for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::session::{Control, Session, SessionError, SessionFactory};

use super::{lock, CallJournal};

/// Hook run on every session a [`MockSessionFactory`] creates, with the
/// 0-based creation index.
pub type SessionSetup = Arc<dyn Fn(usize, &MockSession) + Send + Sync>;

/// Simulates the browser writing a download when the trigger is clicked.
///
/// A click creates `download-NNN.mp3.part` in `dir` right away and renames
/// it to `download-NNN.mp3` after `duration`.
#[derive(Debug)]
pub struct DownloadSimulator {
    dir: PathBuf,
    duration: Duration,
    started: AtomicUsize,
}

impl DownloadSimulator {
    pub fn new(dir: impl Into<PathBuf>, duration: Duration) -> Self {
        Self {
            dir: dir.into(),
            duration,
            started: AtomicUsize::new(0),
        }
    }

    /// Number of downloads started so far.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn start(&self) -> std::io::Result<()> {
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let finished = self.dir.join(format!("download-{:03}.mp3", n));
        let marker = self.dir.join(format!("download-{:03}.mp3.part", n));

        // The marker must exist before click() returns.
        std::fs::write(&marker, b"partial")?;

        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tokio::fs::rename(&marker, &finished).await;
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    calls: Vec<String>,
    hidden: HashSet<String>,
    removed: HashSet<String>,
    navigation_failure: Option<String>,
    navigation_delay: Duration,
    lost: bool,
    closed: bool,
}

/// Mock implementation of the Session trait.
///
/// Every selector is present and interactable unless configured otherwise.
/// Clones share state, so a test can keep a handle to a session it handed
/// to the code under test.
#[derive(Debug, Clone)]
pub struct MockSession {
    id: String,
    state: Arc<Mutex<SessionState>>,
    simulator: Option<Arc<DownloadSimulator>>,
    journal: Option<CallJournal>,
}

impl MockSession {
    /// Create a new mock session.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: Arc::new(Mutex::new(SessionState::default())),
            simulator: None,
            journal: None,
        }
    }

    /// Also record every call in `journal`.
    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Start a simulated download on every click.
    pub fn with_simulator(mut self, simulator: Arc<DownloadSimulator>) -> Self {
        self.simulator = Some(simulator);
        self
    }

    /// Calls made so far, e.g. `navigate <url>`, `fill <selector>=<value>`,
    /// `click <selector>`, `close`.
    pub fn recorded_calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Number of `navigate` calls.
    pub fn navigation_count(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.starts_with("navigate "))
            .count()
    }

    /// The control exists but never becomes interactable.
    pub fn hide_control(&self, selector: &str) {
        lock(&self.state).hidden.insert(selector.to_string());
    }

    /// The control is not on the page at all.
    pub fn remove_control(&self, selector: &str) {
        lock(&self.state).removed.insert(selector.to_string());
    }

    /// Make every navigation fail with `reason`.
    pub fn fail_navigation(&self, reason: &str) {
        lock(&self.state).navigation_failure = Some(reason.to_string());
    }

    /// Delay every navigation.
    pub fn set_navigation_delay(&self, delay: Duration) {
        lock(&self.state).navigation_delay = delay;
    }

    /// Simulate the browser going away: every further call fails.
    pub fn lose_session(&self) {
        lock(&self.state).lost = true;
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    fn record(&self, call: String) -> Result<(), SessionError> {
        if let Some(journal) = &self.journal {
            journal.record(&self.id, &call);
        }
        let mut state = lock(&self.state);
        state.calls.push(call);
        if state.closed {
            return Err(SessionError::Closed);
        }
        if state.lost {
            return Err(SessionError::ConnectionFailed(
                "browser process exited".to_string(),
            ));
        }
        Ok(())
    }

    fn control(selector: &str) -> Control {
        Control {
            selector: selector.to_string(),
            element_id: format!("element:{}", selector),
        }
    }
}

#[async_trait]
impl Session for MockSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.record(format!("navigate {}", url))?;

        let (delay, failure) = {
            let state = lock(&self.state);
            (state.navigation_delay, state.navigation_failure.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(reason) => Err(SessionError::NavigationFailed {
                url: url.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    async fn find_control(&self, selector: &str) -> Result<Control, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        if lock(&self.state).removed.contains(selector) {
            return Err(SessionError::ControlNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(Self::control(selector))
    }

    async fn wait_for_control(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Control, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        let state = lock(&self.state);
        if state.removed.contains(selector) || state.hidden.contains(selector) {
            return Err(SessionError::Timeout {
                selector: selector.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        Ok(Self::control(selector))
    }

    async fn fill_field(&self, control: &Control, value: &str) -> Result<(), SessionError> {
        self.record(format!("fill {}={}", control.selector, value))
    }

    async fn click(&self, control: &Control) -> Result<(), SessionError> {
        self.record(format!("click {}", control.selector))?;
        if let Some(simulator) = &self.simulator {
            simulator
                .start()
                .map_err(|e| SessionError::Protocol(format!("simulated download failed: {}", e)))?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        if let Some(journal) = &self.journal {
            journal.record(&self.id, "close");
        }
        let mut state = lock(&self.state);
        state.calls.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}

/// Mock implementation of the SessionFactory trait.
///
/// Provides controllable behavior for testing:
/// - Keep a handle to every session created
/// - Fail creation after a number of sessions
/// - Configure each session as it is created
pub struct MockSessionFactory {
    sessions: Mutex<Vec<MockSession>>,
    max_sessions: Mutex<Option<usize>>,
    simulator: Option<Arc<DownloadSimulator>>,
    setup: Option<SessionSetup>,
    journal: Option<CallJournal>,
    shut_down: AtomicBool,
}

impl Default for MockSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionFactory {
    /// Create a new mock factory.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            max_sessions: Mutex::new(None),
            simulator: None,
            setup: None,
            journal: None,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Attach a download simulator to every created session.
    pub fn with_simulator(mut self, simulator: DownloadSimulator) -> Self {
        self.simulator = Some(Arc::new(simulator));
        self
    }

    /// Run `setup` on every created session.
    pub fn with_setup(
        mut self,
        setup: impl Fn(usize, &MockSession) + Send + Sync + 'static,
    ) -> Self {
        self.setup = Some(Arc::new(setup));
        self
    }

    /// Record the calls of every created session in `journal`.
    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Creation fails once `max` sessions have been created.
    pub fn set_max_sessions(&self, max: usize) {
        *lock(&self.max_sessions) = Some(max);
    }

    /// Every session created so far, in creation order.
    pub fn sessions(&self) -> Vec<MockSession> {
        lock(&self.sessions).clone()
    }

    pub fn created_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Downloads started across all sessions.
    pub fn downloads_started(&self) -> usize {
        self.simulator.as_ref().map_or(0, |s| s.started())
    }

    pub fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create(&self) -> Result<Box<dyn Session>, SessionError> {
        let index = self.created_count();
        if let Some(max) = *lock(&self.max_sessions) {
            if index >= max {
                return Err(SessionError::StartupFailed(format!(
                    "mock session limit of {} reached",
                    max
                )));
            }
        }

        let mut session = MockSession::new(&format!("mock-session-{}", index + 1));
        if let Some(simulator) = &self.simulator {
            session = session.with_simulator(Arc::clone(simulator));
        }
        if let Some(journal) = &self.journal {
            session = session.with_journal(journal.clone());
        }
        if let Some(setup) = &self.setup {
            setup(index, &session);
        }

        lock(&self.sessions).push(session.clone());
        Ok(Box::new(session))
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let session = MockSession::new("s1");
        session.navigate("https://a.test").await.unwrap();
        let control = session.wait_for_control("#go", Duration::from_secs(1)).await.unwrap();
        session.fill_field(&control, "x").await.unwrap();
        session.click(&control).await.unwrap();
        session.close().await.unwrap();

        assert_eq!(
            session.recorded_calls(),
            vec!["navigate https://a.test", "fill #go=x", "click #go", "close"]
        );
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let session = MockSession::new("s1");
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert!(matches!(
            session.navigate("https://a.test").await,
            Err(SessionError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_lost_session_reports_connection_failure() {
        let session = MockSession::new("s1");
        session.lose_session();
        let err = session.navigate("https://a.test").await.unwrap_err();
        assert!(err.is_session_lost());
    }

    #[tokio::test]
    async fn test_simulator_writes_marker_then_file() {
        let dir = tempfile::tempdir().unwrap();
        let simulator = Arc::new(DownloadSimulator::new(dir.path(), Duration::from_millis(20)));
        let session = MockSession::new("s1").with_simulator(simulator.clone());

        let control = session.find_control("#go").await.unwrap();
        session.click(&control).await.unwrap();
        assert!(dir.path().join("download-001.mp3.part").exists());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!dir.path().join("download-001.mp3.part").exists());
        assert!(dir.path().join("download-001.mp3").exists());
        assert_eq!(simulator.started(), 1);
    }

    #[tokio::test]
    async fn test_factory_limit_and_setup() {
        let factory = MockSessionFactory::new().with_setup(|index, session| {
            if index == 0 {
                session.hide_control("#go");
            }
        });
        factory.set_max_sessions(2);

        let first = factory.create().await.unwrap();
        let second = factory.create().await.unwrap();
        assert!(factory.create().await.is_err());

        assert!(first.wait_for_control("#go", Duration::ZERO).await.is_err());
        assert!(second.wait_for_control("#go", Duration::ZERO).await.is_ok());
        assert_eq!(factory.created_count(), 2);
        assert_eq!(factory.sessions()[1].id(), "mock-session-2");
    }
}
