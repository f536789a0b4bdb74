//! W3C WebDriver session implementation (geckodriver / Firefox).

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::config::BrowserConfig;
use super::error::SessionError;
use super::traits::{Control, Session, SessionFactory};

/// Key under which W3C drivers return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Content types the browser saves without prompting.
const SAVE_WITHOUT_ASKING: &str = "audio/mpeg,audio/mp4,audio/webm,video/mp4,application/octet-stream";

#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

/// Failure of a single wire call.
#[derive(Debug)]
enum WireFailure {
    /// Never got a WebDriver response.
    Transport(SessionError),
    /// The driver answered with a W3C error.
    Driver { error: String, message: String },
}

impl WireFailure {
    fn is(&self, code: &str) -> bool {
        matches!(self, Self::Driver { error, .. } if error == code)
    }

    fn reason(&self) -> String {
        match self {
            Self::Transport(e) => e.to_string(),
            Self::Driver { error, message } if message.is_empty() => error.clone(),
            Self::Driver { error, message } => format!("{}: {}", error, message),
        }
    }
}

impl From<WireFailure> for SessionError {
    fn from(failure: WireFailure) -> Self {
        match failure {
            WireFailure::Transport(e) => e,
            WireFailure::Driver { ref error, .. } if error == "invalid session id" => {
                SessionError::Closed
            }
            other => SessionError::Protocol(other.reason()),
        }
    }
}

/// Minimal JSON-over-HTTP client for the WebDriver endpoints we use.
#[derive(Debug, Clone)]
struct WireClient {
    client: Client,
    base_url: String,
}

impl WireClient {
    fn new(base_url: &str) -> Result<Self, SessionError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SessionError::StartupFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, WireFailure> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            WireFailure::Transport(if e.is_connect() {
                SessionError::ConnectionFailed(e.to_string())
            } else {
                SessionError::Protocol(e.to_string())
            })
        })?;

        let status = response.status();
        let body: WireResponse = response.json().await.map_err(|e| {
            WireFailure::Transport(SessionError::Protocol(format!(
                "HTTP {} with unreadable body: {}",
                status, e
            )))
        })?;

        if status.is_success() {
            return Ok(body.value);
        }

        match serde_json::from_value::<WireErrorBody>(body.value) {
            Ok(err) => Err(WireFailure::Driver {
                error: err.error,
                message: err.message,
            }),
            Err(_) => Err(WireFailure::Driver {
                error: format!("HTTP {}", status),
                message: String::new(),
            }),
        }
    }
}

/// A browser session driven over the WebDriver protocol.
pub struct WebDriverSession {
    wire: WireClient,
    session_id: String,
    poll_interval: Duration,
    closed: AtomicBool,
}

impl WebDriverSession {
    fn path(&self, suffix: &str) -> String {
        format!("/session/{}{}", self.session_id, suffix)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    async fn element_flag(&self, control: &Control, flag: &str) -> Result<bool, WireFailure> {
        let value = self
            .wire
            .call(
                Method::GET,
                &self.path(&format!("/element/{}/{}", control.element_id, flag)),
                None,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Visible and enabled. A stale reference counts as not yet interactable.
    async fn is_interactable(&self, control: &Control) -> Result<bool, SessionError> {
        let displayed = match self.element_flag(control, "displayed").await {
            Ok(v) => v,
            Err(f) if f.is("stale element reference") => return Ok(false),
            Err(f) => return Err(f.into()),
        };
        if !displayed {
            return Ok(false);
        }
        match self.element_flag(control, "enabled").await {
            Ok(v) => Ok(v),
            Err(f) if f.is("stale element reference") => Ok(false),
            Err(f) => Err(f.into()),
        }
    }

    async fn element_action(
        &self,
        control: &Control,
        action: &str,
        body: Value,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.wire
            .call(
                Method::POST,
                &self.path(&format!("/element/{}/{}", control.element_id, action)),
                Some(body),
            )
            .await
            .map_err(|f| {
                if f.is("no such element") || f.is("stale element reference") {
                    SessionError::ControlNotFound {
                        selector: control.selector.clone(),
                    }
                } else {
                    f.into()
                }
            })?;
        Ok(())
    }
}

#[async_trait]
impl Session for WebDriverSession {
    fn id(&self) -> &str {
        &self.session_id
    }

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        debug!("Navigating session {} to {}", self.session_id, url);
        self.wire
            .call(Method::POST, &self.path("/url"), Some(json!({ "url": url })))
            .await
            .map_err(|f| match f {
                WireFailure::Transport(e) => e,
                f if f.is("invalid session id") => SessionError::Closed,
                f => SessionError::NavigationFailed {
                    url: url.to_string(),
                    reason: f.reason(),
                },
            })?;
        Ok(())
    }

    async fn find_control(&self, selector: &str) -> Result<Control, SessionError> {
        self.ensure_open()?;
        let value = self
            .wire
            .call(
                Method::POST,
                &self.path("/element"),
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await
            .map_err(|f| {
                if f.is("no such element") {
                    SessionError::ControlNotFound {
                        selector: selector.to_string(),
                    }
                } else {
                    f.into()
                }
            })?;

        let element_id = value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::Protocol("element reference missing".to_string()))?;

        Ok(Control {
            selector: selector.to_string(),
            element_id: element_id.to_string(),
        })
    }

    async fn wait_for_control(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Control, SessionError> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.find_control(selector).await {
                Ok(control) => {
                    if self.is_interactable(&control).await? {
                        return Ok(control);
                    }
                }
                Err(SessionError::ControlNotFound { .. }) => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::Timeout {
                    selector: selector.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    async fn fill_field(&self, control: &Control, value: &str) -> Result<(), SessionError> {
        self.element_action(control, "clear", json!({})).await?;
        self.element_action(control, "value", json!({ "text": value }))
            .await
    }

    async fn click(&self, control: &Control) -> Result<(), SessionError> {
        self.element_action(control, "click", json!({})).await
    }

    async fn close(&self) -> Result<(), SessionError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("Closing session {}", self.session_id);
        match self.wire.call(Method::DELETE, &self.path(""), None).await {
            Ok(_) => Ok(()),
            Err(f) if f.is("invalid session id") => Ok(()),
            Err(f) => Err(f.into()),
        }
    }
}

/// Opens Firefox sessions through a WebDriver endpoint, optionally spawning
/// and owning the driver process.
pub struct WebDriverSessionFactory {
    config: BrowserConfig,
    download_dir: PathBuf,
    wire: WireClient,
    driver: Mutex<Option<Child>>,
}

impl WebDriverSessionFactory {
    /// Create a factory. Sessions download into `download_dir`.
    pub fn new(config: BrowserConfig, download_dir: PathBuf) -> Result<Self, SessionError> {
        let wire = WireClient::new(&config.webdriver_url)?;
        Ok(Self {
            config,
            download_dir,
            wire,
            driver: Mutex::new(None),
        })
    }

    /// New-session capabilities: SOCKS proxy, silent downloads, optional
    /// binary and profile.
    pub fn capabilities(&self) -> Value {
        let prefs = json!({
            "network.proxy.type": 1,
            "network.proxy.socks": self.config.socks_host,
            "network.proxy.socks_port": self.config.socks_port,
            "network.proxy.socks_version": 5,
            "network.proxy.socks_remote_dns": self.config.socks_remote_dns,
            "browser.download.folderList": 2,
            "browser.download.dir": self.download_dir.display().to_string(),
            "browser.download.useDownloadDir": true,
            "browser.helperApps.neverAsk.saveToDisk": SAVE_WITHOUT_ASKING,
        });

        let mut firefox = json!({ "prefs": prefs });
        if let Some(binary) = &self.config.binary_path {
            firefox["binary"] = json!(binary.display().to_string());
        }
        if let Some(profile) = &self.config.profile_path {
            firefox["args"] = json!(["-profile", profile.display().to_string()]);
        }

        json!({
            "browserName": "firefox",
            "acceptInsecureCerts": true,
            "timeouts": { "pageLoad": self.config.page_load_timeout_secs * 1000 },
            "moz:firefoxOptions": firefox,
        })
    }

    fn driver_port(&self) -> Result<u16, SessionError> {
        Url::parse(&self.config.webdriver_url)
            .ok()
            .and_then(|u| u.port_or_known_default())
            .ok_or_else(|| {
                SessionError::StartupFailed(format!(
                    "cannot derive port from {}",
                    self.config.webdriver_url
                ))
            })
    }

    /// Spawn the configured driver binary unless one is already running.
    async fn ensure_driver(&self) -> Result<(), SessionError> {
        let Some(driver_path) = &self.config.driver_path else {
            return Ok(());
        };

        let mut driver = self.driver.lock().await;
        if let Some(child) = driver.as_mut() {
            match child.try_wait() {
                Ok(None) => return Ok(()),
                Ok(Some(status)) => warn!("WebDriver exited ({}), restarting it", status),
                Err(e) => warn!("Could not query WebDriver process: {}", e),
            }
        }

        let port = self.driver_port()?;
        info!("Starting WebDriver {} on port {}", driver_path.display(), port);

        let child = Command::new(driver_path)
            .arg("--port")
            .arg(port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SessionError::DriverNotFound {
                        path: driver_path.clone(),
                    }
                } else {
                    SessionError::StartupFailed(e.to_string())
                }
            })?;
        *driver = Some(child);
        drop(driver);

        self.wait_until_ready().await
    }

    async fn wait_until_ready(&self) -> Result<(), SessionError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.startup_timeout_secs);

        loop {
            if let Ok(value) = self.wire.call(Method::GET, "/status", None).await {
                if value.get("ready").and_then(Value::as_bool).unwrap_or(false) {
                    debug!("WebDriver ready");
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(SessionError::StartupFailed(format!(
                    "WebDriver not ready after {}s",
                    self.config.startup_timeout_secs
                )));
            }
            sleep(Duration::from_millis(100)).await;
        }
    }
}

#[async_trait]
impl SessionFactory for WebDriverSessionFactory {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn create(&self) -> Result<Box<dyn Session>, SessionError> {
        self.ensure_driver().await?;

        let value = self
            .wire
            .call(
                Method::POST,
                "/session",
                Some(json!({ "capabilities": { "alwaysMatch": self.capabilities() } })),
            )
            .await
            .map_err(|f| match f {
                WireFailure::Transport(e) => e,
                f => SessionError::StartupFailed(f.reason()),
            })?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::Protocol("sessionId missing".to_string()))?
            .to_string();

        info!(
            "Browser session {} opened (SOCKS {}:{})",
            session_id, self.config.socks_host, self.config.socks_port
        );

        Ok(Box::new(WebDriverSession {
            wire: self.wire.clone(),
            session_id,
            poll_interval: Duration::from_millis(self.config.control_poll_ms.max(1)),
            closed: AtomicBool::new(false),
        }))
    }

    async fn shutdown(&self) {
        if let Some(mut child) = self.driver.lock().await.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop WebDriver: {}", e);
            }
        }
    }
}
