//! Per-item download procedure.

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::session::{Session, SessionError};
use crate::setlist::WorkItem;

use super::config::DriverConfig;

/// What the driver achieved for one item.
#[derive(Debug, Clone)]
pub enum DriveOutcome {
    /// The trigger control was clicked.
    Triggered,
    /// Nothing was clicked; no download should be expected.
    NotTriggered(SessionError),
}

impl DriveOutcome {
    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered)
    }
}

/// Opens the conversion page for an item, applies metadata overrides and
/// clicks the download trigger.
#[derive(Debug, Clone)]
pub struct DownloadDriver {
    config: DriverConfig,
}

impl DownloadDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Conversion page for an item.
    pub fn conversion_url(&self, item: &WorkItem) -> String {
        self.config
            .conversion_url_template
            .replace("{url}", &urlencoding::encode(item.source_url.as_str()))
    }

    /// Drive one item. Never fails: automation errors are logged and reported
    /// as `NotTriggered`.
    pub async fn drive(&self, session: &dyn Session, item: &WorkItem) -> DriveOutcome {
        match self.try_drive(session, item).await {
            Ok(()) => DriveOutcome::Triggered,
            Err(e) => {
                warn!("Download not triggered for {}: {}", item.label(), e);
                DriveOutcome::NotTriggered(e)
            }
        }
    }

    async fn try_drive(&self, session: &dyn Session, item: &WorkItem) -> Result<(), SessionError> {
        let url = self.conversion_url(item);
        let limit = self.config.control_timeout();

        info!("opening {}", url);
        timeout(limit, session.navigate(&url))
            .await
            .map_err(|_| SessionError::NavigationFailed {
                url: url.clone(),
                reason: format!("no response within {}s", limit.as_secs()),
            })??;

        let trigger = session
            .wait_for_control(&self.config.trigger_selector, limit)
            .await?;

        self.apply_override(session, &self.config.title_selector, &item.track, "title")
            .await;
        self.apply_override(session, &self.config.artist_selector, &item.artist, "artist")
            .await;

        session.click(&trigger).await?;
        debug!("Clicked trigger for {}", item.label());
        Ok(())
    }

    /// Best-effort: a missing or unwritable field never blocks the download.
    async fn apply_override(&self, session: &dyn Session, selector: &str, value: &str, field: &str) {
        if value.is_empty() || selector.is_empty() {
            return;
        }

        let result = match session.find_control(selector).await {
            Ok(control) => session.fill_field(&control, value).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!("Set {} to '{}'", field, value),
            Err(e) => warn!("Could not set {} override: {}", field, e),
        }
    }
}
