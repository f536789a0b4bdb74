pub mod config;
pub mod detector;
pub mod driver;
pub mod identity;
pub mod orchestrator;
pub mod session;
pub mod setlist;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LoggingConfig,
    SanitizedConfig,
};
pub use detector::{CompletionDetector, DetectorConfig, DetectorError, FsMarkerSource, MarkerSource};
pub use driver::{DownloadDriver, DriveOutcome, DriverConfig};
pub use identity::{IdentityChannel, IdentityError, TorConfig, TorIdentityChannel};
pub use orchestrator::{
    check_preconditions, ItemOutcome, Orchestrator, OrchestratorConfig, OrchestratorError,
    RotationStrategy, RunContext, RunReport, RunStatus,
};
pub use session::{BrowserConfig, Session, SessionError, SessionFactory, WebDriverSessionFactory};
pub use setlist::{load_setlist, parse_setlist, Setlist, SetlistError, WorkItem};
