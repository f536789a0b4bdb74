//! Download orchestrator implementation.
//!
//! Drives one work item at a time through the same browser session:
//! - snapshot the downloads folder
//! - drive the conversion page until the trigger is clicked
//! - wait for the download markers to come and go
//! - every `rotation_threshold` completions, refresh the Tor identity

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::detector::{
    snapshot_directory, CompletionDetector, DetectorError, DirectorySnapshot, FsMarkerSource,
    MarkerSource,
};
use crate::driver::{DownloadDriver, DriveOutcome};
use crate::identity::IdentityChannel;
use crate::session::{Session, SessionError, SessionFactory};
use crate::setlist::{load_setlist, Setlist, WorkItem};

use super::config::RotationStrategy;
use super::rotation::RotationCounter;
use super::types::{ItemOutcome, ItemReport, OrchestratorError, RunReport, RunStatus};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything a run needs from the outside world.
pub struct RunContext {
    pub config: Config,
    pub sessions: Arc<dyn SessionFactory>,
    pub identity: Arc<dyn IdentityChannel>,
    pub markers: Arc<dyn MarkerSource>,
    pub cancel: CancellationToken,
}

impl RunContext {
    /// Context watching the configured downloads folder for markers.
    pub fn new(
        config: Config,
        sessions: Arc<dyn SessionFactory>,
        identity: Arc<dyn IdentityChannel>,
    ) -> Self {
        let markers = Arc::new(FsMarkerSource::new(
            config.downloads_folder_path.clone(),
            config.detector.extension(),
        ));
        Self {
            config,
            sessions,
            identity,
            markers,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_markers(mut self, markers: Arc<dyn MarkerSource>) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Check that the downloads folder is a directory and the setlist exists.
pub async fn check_preconditions(config: &Config) -> Result<(), OrchestratorError> {
    let downloads = &config.downloads_folder_path;
    match tokio::fs::metadata(downloads).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(OrchestratorError::Precondition(format!(
                "downloads folder {} is not a directory",
                downloads.display()
            )))
        }
        Err(e) => {
            return Err(OrchestratorError::Precondition(format!(
                "downloads folder {} is unavailable: {}",
                downloads.display(),
                e
            )))
        }
    }

    if tokio::fs::metadata(&config.setlist_path).await.is_err() {
        return Err(OrchestratorError::Precondition(format!(
            "setlist {} does not exist",
            config.setlist_path.display()
        )));
    }

    Ok(())
}

/// What processing one item produced.
struct ItemStep {
    outcome: ItemOutcome,
    session_lost: bool,
}

/// The download orchestrator - drives a setlist through one session at a time.
pub struct Orchestrator {
    context: RunContext,
    driver: DownloadDriver,
    detector: CompletionDetector,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(context: RunContext) -> Self {
        let driver = DownloadDriver::new(context.config.driver.clone());
        let detector = CompletionDetector::new(context.config.detector.clone());
        Self {
            context,
            driver,
            detector,
        }
    }

    pub fn config(&self) -> &Config {
        &self.context.config
    }

    /// Token that stops the run at the next check.
    pub fn cancel_token(&self) -> CancellationToken {
        self.context.cancel.clone()
    }

    /// Check preconditions, load the setlist and run it.
    pub async fn run_from_config(&self) -> RunReport {
        let config = &self.context.config;
        info!("-----------------------------------------------------");
        info!("detecting downloads from {}", config.downloads_folder_path.display());
        info!("setlist path at {}", config.setlist_path.display());

        if let Err(e) = check_preconditions(config).await {
            error!("{}", e);
            return RunReport::aborted(e.to_string());
        }

        let parsed = match load_setlist(&config.setlist_path).await {
            Ok(parsed) => parsed,
            Err(e) => {
                let e = OrchestratorError::from(e);
                error!("{}", e);
                return RunReport::aborted(e.to_string());
            }
        };
        if !parsed.rejected.is_empty() {
            warn!("{} setlist line(s) skipped", parsed.rejected.len());
        }

        self.run(&parsed.setlist).await
    }

    /// Process every item in order.
    pub async fn run(&self, setlist: &Setlist) -> RunReport {
        let mut report = RunReport::start();

        info!("setlist links:");
        for item in setlist {
            info!("\t{}", item.label());
        }
        if setlist.is_empty() {
            info!("setlist is empty, nothing to download");
            return report.finish(RunStatus::Done, None);
        }

        if let Err(e) = self.context.identity.launch().await {
            error!("Failed to launch {}: {}", self.context.identity.name(), e);
        }
        info!("{}: session start", timestamp(report.started_at));

        let mut session = match self.context.sessions.create().await {
            Ok(session) => Some(session),
            Err(e) => {
                let e = OrchestratorError::from(e);
                error!("{}", e);
                self.context.sessions.shutdown().await;
                return report.finish(RunStatus::Fatal, Some(e.to_string()));
            }
        };

        let (status, diagnostic) = self.process_all(setlist, &mut session, &mut report).await;

        if let Some(session) = session.take() {
            if let Err(e) = session.close().await {
                warn!("Failed to close session {}: {}", session.id(), e);
            }
        }
        self.context.sessions.shutdown().await;

        let report = report.finish(status, diagnostic);
        info!(
            "run {}: {} completed, {} failed, {} skipped, {} rotation(s), {} restart(s)",
            report.status,
            report.completed(),
            report.soft_failed(),
            report.skipped(),
            report.rotations,
            report.restarts
        );
        report
    }

    async fn process_all(
        &self,
        setlist: &Setlist,
        session: &mut Option<Box<dyn Session>>,
        report: &mut RunReport,
    ) -> (RunStatus, Option<String>) {
        let config = &self.context.config.orchestrator;
        let mut counter = RotationCounter::new(config.rotation_threshold);
        let total = setlist.len();

        for (index, item) in setlist.iter().enumerate() {
            if self.context.cancel.is_cancelled() {
                info!("Cancelled before item {}/{}", index + 1, total);
                return (RunStatus::Cancelled, None);
            }

            let Some(current) = session.as_deref() else {
                return (RunStatus::Fatal, Some("no live session".to_string()));
            };

            info!("[{}/{}] {}", index + 1, total, item.label());
            let Some(step) = self.process_item(current, item).await else {
                info!("Cancelled while waiting for {}", item.label());
                return (RunStatus::Cancelled, None);
            };

            let completed = step.outcome.is_completed();
            report.items.push(ItemReport {
                line: item.line,
                label: item.label(),
                outcome: step.outcome,
                finished_at: Utc::now(),
            });

            if step.session_lost {
                warn!("Session lost, opening a new one");
                if let Err(e) = self.reopen_session(session).await {
                    let e = OrchestratorError::from(e);
                    error!("{}", e);
                    return (RunStatus::Fatal, Some(e.to_string()));
                }
                report.session_recoveries += 1;
                counter.reset();
                continue;
            }

            if !completed || !counter.record_success() {
                continue;
            }
            counter.reset();
            if index + 1 == total {
                debug!("Rotation due after the last item, skipping");
                continue;
            }

            match config.rotation_strategy {
                RotationStrategy::Soft => {
                    self.rotate_identity().await;
                    report.rotations += 1;
                }
                RotationStrategy::Hard => {
                    if let Err(e) = self.restart(session).await {
                        let e = OrchestratorError::from(e);
                        error!("{}", e);
                        return (RunStatus::Fatal, Some(e.to_string()));
                    }
                    report.restarts += 1;
                }
            }
        }

        (RunStatus::Done, None)
    }

    /// Snapshot, drive, wait, diff. `None` means the run was cancelled.
    async fn process_item(&self, session: &dyn Session, item: &WorkItem) -> Option<ItemStep> {
        let dir = &self.context.config.downloads_folder_path;
        let extension = self.context.config.detector.extension();

        let before = match snapshot_directory(dir, extension).await {
            Ok(snapshot) => snapshot,
            Err(e) => return Some(skipped(dir, e.to_string())),
        };
        let latest_before = before.latest().map(Path::to_path_buf);
        match &latest_before {
            Some(path) => info!("\tlatest file before trigger: {}", path.display()),
            None => info!("\tdownloads folder is empty"),
        }

        debug!("Driving {}", item.label());
        let drive = tokio::select! {
            _ = self.context.cancel.cancelled() => return None,
            outcome = self.driver.drive(session, item) => outcome,
        };
        if let DriveOutcome::NotTriggered(e) = drive {
            error!("{}", e);
            return Some(ItemStep {
                outcome: ItemOutcome::SoftFailed {
                    reason: e.to_string(),
                },
                session_lost: e.is_session_lost(),
            });
        }

        debug!("Awaiting completion of {}", item.label());
        let completion = match self
            .detector
            .wait_for_completion(self.context.markers.as_ref(), &self.context.cancel)
            .await
        {
            Ok(completion) => completion,
            Err(DetectorError::Cancelled) => return None,
            Err(DetectorError::DirectoryUnavailable(reason)) => return Some(skipped(dir, reason)),
            Err(e) => {
                error!("{}", e);
                return Some(ItemStep {
                    outcome: ItemOutcome::SoftFailed {
                        reason: e.to_string(),
                    },
                    session_lost: false,
                });
            }
        };

        let new_artifacts = self.new_artifacts(dir, &before).await;
        info!(
            "\t{}: {} download completed",
            Local::now().format(TIME_FORMAT),
            latest_before
                .as_deref()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "<none>".to_string())
        );
        for path in &new_artifacts {
            info!("\t\tnew file: {}", path.display());
        }

        Some(ItemStep {
            outcome: ItemOutcome::Completed {
                new_artifacts,
                latest_before,
                waited: completion.elapsed,
            },
            session_lost: false,
        })
    }

    async fn new_artifacts(&self, dir: &Path, before: &DirectorySnapshot) -> Vec<PathBuf> {
        match snapshot_directory(dir, self.context.config.detector.extension()).await {
            Ok(after) => after.new_since(before),
            Err(e) => {
                warn!("Could not list {} after completion: {}", dir.display(), e);
                Vec::new()
            }
        }
    }

    /// Soft rotation: new circuit, same session. Failures are only logged.
    async fn rotate_identity(&self) {
        info!("\tresetting circuit");
        if let Err(e) = self.context.identity.rotate().await {
            error!("Circuit rotation failed: {}", e);
        }
        self.settle(self.context.config.orchestrator.rotation_settle())
            .await;
    }

    /// Hard restart: close the session, restart Tor, open a new session.
    /// Only the final session creation can fail the run.
    async fn restart(&self, session: &mut Option<Box<dyn Session>>) -> Result<(), SessionError> {
        info!("\trestarting browser session and {}", self.context.identity.name());

        if let Some(old) = session.take() {
            if let Err(e) = old.close().await {
                error!("Failed to close session {}: {}", old.id(), e);
            }
        }
        if let Err(e) = self.context.identity.terminate().await {
            error!("Failed to stop {}: {}", self.context.identity.name(), e);
        }

        self.settle(self.context.config.orchestrator.restart_settle())
            .await;

        if let Err(e) = self.context.identity.launch().await {
            error!("Failed to launch {}: {}", self.context.identity.name(), e);
        }

        let new = self.context.sessions.create().await?;
        info!("\tnew session {}", new.id());
        *session = Some(new);
        Ok(())
    }

    async fn reopen_session(
        &self,
        session: &mut Option<Box<dyn Session>>,
    ) -> Result<(), SessionError> {
        if let Some(old) = session.take() {
            if let Err(e) = old.close().await {
                debug!("Lost session {} did not close cleanly: {}", old.id(), e);
            }
        }
        let new = self.context.sessions.create().await?;
        info!("\tnew session {}", new.id());
        *session = Some(new);
        Ok(())
    }

    /// Sleep unless cancelled first.
    async fn settle(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            _ = self.context.cancel.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}

fn skipped(dir: &Path, reason: String) -> ItemStep {
    error!("{}: 404 {} ({})", Local::now().format(TIME_FORMAT), dir.display(), reason);
    ItemStep {
        outcome: ItemOutcome::Skipped { reason },
        session_lost: false,
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::OrchestratorConfig;
    use crate::testing::{
        fixtures, CallJournal, DownloadSimulator, MockIdentityChannel, MockSessionFactory,
        ScriptedMarkerSource,
    };
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        sessions: Arc<MockSessionFactory>,
        identity: Arc<MockIdentityChannel>,
        orchestrator: Orchestrator,
    }

    fn harness(orchestrator: OrchestratorConfig, sessions: MockSessionFactory) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::config(dir.path());
        config.orchestrator = orchestrator;

        let sessions = Arc::new(sessions);
        let identity = Arc::new(MockIdentityChannel::new());
        let context = RunContext::new(config, sessions.clone(), identity.clone());
        Harness {
            _dir: dir,
            sessions,
            identity,
            orchestrator: Orchestrator::new(context),
        }
    }

    fn simulated(dir: &Path) -> MockSessionFactory {
        MockSessionFactory::new().with_simulator(DownloadSimulator::new(dir, Duration::from_millis(30)))
    }

    fn rotation(threshold: u32, strategy: RotationStrategy) -> OrchestratorConfig {
        OrchestratorConfig {
            rotation_threshold: threshold,
            rotation_strategy: strategy,
            rotation_settle_secs: 0,
            restart_settle_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_soft_rotation_every_threshold_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::config(dir.path());
        config.orchestrator = rotation(2, RotationStrategy::Soft);
        let sessions = Arc::new(simulated(dir.path()));
        let identity = Arc::new(MockIdentityChannel::new());
        let orchestrator = Orchestrator::new(RunContext::new(
            config,
            sessions.clone(),
            identity.clone(),
        ));

        let report = orchestrator.run(&fixtures::setlist(5)).await;

        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.completed(), 5);
        // Due after items 2 and 4; never after the last one.
        assert_eq!(report.rotations, 2);
        assert_eq!(identity.rotate_count(), 2);
        assert_eq!(sessions.created_count(), 1);
        assert!(sessions.sessions()[0].is_closed());
        assert!(sessions.was_shut_down());
    }

    #[tokio::test]
    async fn test_rotation_happens_between_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::config(dir.path());
        config.orchestrator = rotation(2, RotationStrategy::Soft);
        let journal = CallJournal::new();
        let sessions = Arc::new(simulated(dir.path()).with_journal(journal.clone()));
        let identity = Arc::new(MockIdentityChannel::new().with_journal(journal.clone()));
        let orchestrator = Orchestrator::new(RunContext::new(config, sessions, identity));

        let report = orchestrator.run(&fixtures::setlist(4)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.rotations, 1);

        let second_click = journal
            .position("navigate", 0)
            .and_then(|first| journal.position("navigate", first + 1))
            .and_then(|second| journal.position("click", second))
            .expect("second item was clicked");
        let rotate = journal.position("identity: rotate", 0).expect("rotated");
        let third_navigation = journal.position("navigate", second_click).expect("third item");

        assert!(second_click < rotate, "journal: {:?}", journal.entries());
        assert!(rotate < third_navigation, "journal: {:?}", journal.entries());
    }

    #[tokio::test]
    async fn test_no_rotation_after_final_item() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::config(dir.path());
        config.orchestrator = rotation(3, RotationStrategy::Soft);
        let identity = Arc::new(MockIdentityChannel::new());
        let orchestrator = Orchestrator::new(RunContext::new(
            config,
            Arc::new(simulated(dir.path())),
            identity.clone(),
        ));

        let report = orchestrator.run(&fixtures::setlist(3)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.rotations, 0);
        assert_eq!(identity.rotate_count(), 0);
    }

    #[tokio::test]
    async fn test_soft_rotation_failure_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::config(dir.path());
        config.orchestrator = rotation(1, RotationStrategy::Soft);
        let identity = Arc::new(MockIdentityChannel::new());
        identity.fail_rotate(true);
        let orchestrator = Orchestrator::new(RunContext::new(
            config,
            Arc::new(simulated(dir.path())),
            identity.clone(),
        ));

        let report = orchestrator.run(&fixtures::setlist(3)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.completed(), 3);
        assert_eq!(identity.rotate_count(), 2);
    }

    #[tokio::test]
    async fn test_hard_restart_replaces_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::config(dir.path());
        config.orchestrator = rotation(1, RotationStrategy::Hard);
        let sessions = Arc::new(simulated(dir.path()));
        let identity = Arc::new(MockIdentityChannel::new());
        let orchestrator = Orchestrator::new(RunContext::new(
            config,
            sessions.clone(),
            identity.clone(),
        ));

        let report = orchestrator.run(&fixtures::setlist(2)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.restarts, 1);
        assert_eq!(sessions.created_count(), 2);
        assert!(sessions.sessions().iter().all(|s| s.is_closed()));
        assert_eq!(
            identity.recorded_calls(),
            vec!["launch", "terminate", "launch"]
        );
    }

    #[tokio::test]
    async fn test_hard_restart_without_session_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::config(dir.path());
        config.orchestrator = rotation(1, RotationStrategy::Hard);
        let sessions = Arc::new(simulated(dir.path()));
        sessions.set_max_sessions(1);
        let orchestrator = Orchestrator::new(RunContext::new(
            config,
            sessions.clone(),
            Arc::new(MockIdentityChannel::new()),
        ));

        let report = orchestrator.run(&fixtures::setlist(3)).await;
        assert_eq!(report.status, RunStatus::Fatal);
        assert_eq!(report.items.len(), 1);
        assert!(report.diagnostic.is_some());
        assert_eq!(sessions.downloads_started(), 1);
    }

    #[tokio::test]
    async fn test_startup_session_failure_is_fatal() {
        let h = harness(OrchestratorConfig::default(), MockSessionFactory::new());
        h.sessions.set_max_sessions(0);

        let report = h.orchestrator.run(&fixtures::setlist(2)).await;
        assert_eq!(report.status, RunStatus::Fatal);
        assert_eq!(report.exit_code(), 3);
        assert!(report.items.is_empty());
        assert_eq!(h.identity.launch_count(), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_does_not_stop_run() {
        let h = harness(OrchestratorConfig::default(), MockSessionFactory::new());
        h.identity.fail_launch(true);
        let markers = Arc::new(ScriptedMarkerSource::new());
        markers.push_markers(&["a.part"], 1);

        let orchestrator = Orchestrator::new(
            RunContext::new(
                h.orchestrator.config().clone(),
                h.sessions.clone(),
                h.identity.clone(),
            )
            .with_markers(markers),
        );
        let report = orchestrator.run(&fixtures::setlist(1)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.completed(), 1);
    }

    #[tokio::test]
    async fn test_missing_trigger_soft_fails_without_waiting() {
        let sessions = MockSessionFactory::new().with_setup(|_, session| {
            session.hide_control(&crate::driver::DriverConfig::default().trigger_selector);
        });
        let h = harness(OrchestratorConfig::default(), sessions);

        let report = h.orchestrator.run(&fixtures::setlist(2)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.soft_failed(), 2);
        assert_eq!(h.identity.rotate_count(), 0);
    }

    #[tokio::test]
    async fn test_lost_session_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::config(dir.path());
        let sessions = Arc::new(simulated(dir.path()).with_setup(|index, session| {
            if index == 0 {
                session.lose_session();
            }
        }));
        let orchestrator = Orchestrator::new(RunContext::new(
            config,
            sessions.clone(),
            Arc::new(MockIdentityChannel::new()),
        ));

        let report = orchestrator.run(&fixtures::setlist(2)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.session_recoveries, 1);
        assert_eq!(report.soft_failed(), 1);
        assert_eq!(report.completed(), 1);
        assert_eq!(sessions.created_count(), 2);
    }

    #[tokio::test]
    async fn test_detector_timeout_soft_fails() {
        let h = harness(OrchestratorConfig::default(), MockSessionFactory::new());
        let mut config = h.orchestrator.config().clone();
        config.detector.deadline_secs = 1;
        let markers = Arc::new(ScriptedMarkerSource::new());
        markers.set_default_empty();

        let orchestrator = Orchestrator::new(
            RunContext::new(config, h.sessions.clone(), h.identity.clone()).with_markers(markers),
        );
        let report = orchestrator.run(&fixtures::setlist(1)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.soft_failed(), 1);
    }

    #[tokio::test]
    async fn test_missing_folder_skips_item() {
        let h = harness(OrchestratorConfig::default(), MockSessionFactory::new());
        let mut config = h.orchestrator.config().clone();
        config.downloads_folder_path = config.downloads_folder_path.join("gone");

        let orchestrator = Orchestrator::new(RunContext::new(
            config,
            h.sessions.clone(),
            h.identity.clone(),
        ));
        let report = orchestrator.run(&fixtures::setlist(2)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.skipped(), 2);
        assert!(h.sessions.sessions()[0]
            .recorded_calls()
            .iter()
            .all(|c| !c.starts_with("navigate")));
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let h = harness(OrchestratorConfig::default(), MockSessionFactory::new());
        h.orchestrator.cancel_token().cancel();

        let report = h.orchestrator.run(&fixtures::setlist(3)).await;
        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.exit_code(), 130);
        assert!(report.items.is_empty());
        assert!(h.sessions.sessions()[0].is_closed());
    }

    #[tokio::test]
    async fn test_cancel_during_wait() {
        let h = harness(OrchestratorConfig::default(), MockSessionFactory::new());
        let mut config = h.orchestrator.config().clone();
        config.detector.deadline_secs = 0;
        let markers = Arc::new(ScriptedMarkerSource::new());
        markers.set_default_markers(&["stuck.part"]);
        let cancel = CancellationToken::new();

        let orchestrator = Orchestrator::new(
            RunContext::new(config, h.sessions.clone(), h.identity.clone())
                .with_markers(markers)
                .with_cancel(cancel.clone()),
        );
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let report = orchestrator.run(&fixtures::setlist(2)).await;
        assert_eq!(report.status, RunStatus::Cancelled);
        assert!(report.items.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_slow_navigation() {
        let sessions = MockSessionFactory::new().with_setup(|_, session| {
            session.set_navigation_delay(Duration::from_secs(10));
        });
        let h = harness(OrchestratorConfig::default(), sessions);
        let cancel = h.orchestrator.cancel_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let started = std::time::Instant::now();
        let report = h.orchestrator.run(&fixtures::setlist(2)).await;

        assert_eq!(report.status, RunStatus::Cancelled);
        assert!(report.items.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(h.sessions.sessions()[0].is_closed());
    }

    #[tokio::test]
    async fn test_empty_setlist_opens_nothing() {
        let h = harness(OrchestratorConfig::default(), MockSessionFactory::new());

        let report = h.orchestrator.run(&fixtures::setlist(0)).await;
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(h.sessions.created_count(), 0);
        assert_eq!(h.identity.launch_count(), 0);
    }

    #[tokio::test]
    async fn test_preconditions() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::config(dir.path());

        let err = check_preconditions(&config).await.unwrap_err();
        assert!(err.to_string().contains("setlist"));

        std::fs::write(&config.setlist_path, "https://a.test/1\n").unwrap();
        check_preconditions(&config).await.unwrap();

        config.downloads_folder_path = config.setlist_path.clone();
        let err = check_preconditions(&config).await.unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
