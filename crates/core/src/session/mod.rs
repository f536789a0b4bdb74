//! Browser automation sessions.
//!
//! The orchestrator only sees the narrow `Session` / `SessionFactory` traits.
//! `WebDriverSessionFactory` is the production implementation: it talks the
//! W3C WebDriver protocol to geckodriver and configures Firefox to route all
//! traffic through the Tor SOCKS proxy and to save downloads silently into the
//! watched directory.

mod config;
mod error;
mod traits;
mod webdriver;

pub use config::BrowserConfig;
pub use error::SessionError;
pub use traits::{Control, Session, SessionFactory};
pub use webdriver::{WebDriverSession, WebDriverSessionFactory};
