//! Download driver: turns a work item into a click on the conversion page.

mod config;
mod download;

pub use config::DriverConfig;
pub use download::{DownloadDriver, DriveOutcome};
