//! Tor control-port client and managed Tor process.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::config::TorConfig;
use super::error::IdentityError;
use super::traits::IdentityChannel;

/// A complete control-port reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlReply {
    pub code: u16,
    /// Reply lines with the status prefix stripped.
    pub lines: Vec<String>,
}

impl ControlReply {
    pub fn is_ok(&self) -> bool {
        self.code == 250
    }

    /// Text of the final line.
    pub fn message(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or("")
    }
}

/// Authentication methods advertised by `PROTOCOLINFO`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AuthInfo {
    methods: Vec<String>,
    cookie_file: Option<String>,
}

impl AuthInfo {
    fn from_reply(reply: &ControlReply) -> Self {
        let mut info = Self::default();
        for line in &reply.lines {
            let Some(rest) = line.strip_prefix("AUTH ") else {
                continue;
            };
            for field in split_fields(rest) {
                if let Some(methods) = field.strip_prefix("METHODS=") {
                    info.methods = methods.split(',').map(str::to_string).collect();
                } else if let Some(path) = field.strip_prefix("COOKIEFILE=") {
                    info.cookie_file = Some(unquote(path));
                }
            }
        }
        info
    }

    fn supports(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

/// Split on spaces that are not inside a quoted string.
fn split_fields(s: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;

    for c in s.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if quoted => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                quoted = !quoted;
            }
            ' ' if !quoted => {
                if !current.is_empty() {
                    fields.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

fn unquote(s: &str) -> String {
    let inner = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s);
    inner.replace("\\\"", "\"").replace("\\\\", "\\")
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// One authenticated-or-not connection to the control port.
pub struct ControlConnection {
    stream: BufReader<TcpStream>,
    io_timeout: Duration,
}

impl ControlConnection {
    /// Connect to `addr` (`host:port`).
    pub async fn connect(addr: &str, io_timeout: Duration) -> Result<Self, IdentityError> {
        let stream = timeout(io_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| IdentityError::ConnectionFailed {
                addr: addr.to_string(),
                reason: "connect timed out".to_string(),
            })?
            .map_err(|e| IdentityError::ConnectionFailed {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            stream: BufReader::new(stream),
            io_timeout,
        })
    }

    /// Send one command line and read the full reply.
    pub async fn command(&mut self, line: &str) -> Result<ControlReply, IdentityError> {
        let secs = self.io_timeout.as_secs();
        timeout(self.io_timeout, async {
            self.stream
                .write_all(format!("{}\r\n", line).as_bytes())
                .await?;
            self.stream.flush().await?;
            self.read_reply().await
        })
        .await
        .map_err(|_| IdentityError::Timeout { secs })?
    }

    /// Send a command and require a 250 reply.
    async fn expect_ok(&mut self, line: &str, label: &str) -> Result<ControlReply, IdentityError> {
        let reply = self.command(line).await?;
        if reply.is_ok() {
            Ok(reply)
        } else {
            Err(IdentityError::Rejected {
                command: label.to_string(),
                code: reply.code,
                message: reply.message().to_string(),
            })
        }
    }

    async fn read_reply(&mut self) -> Result<ControlReply, IdentityError> {
        let mut lines = Vec::new();
        loop {
            let mut raw = String::new();
            if self.stream.read_line(&mut raw).await? == 0 {
                return Err(IdentityError::Protocol(
                    "connection closed mid-reply".to_string(),
                ));
            }
            let line = raw.trim_end_matches(['\r', '\n']);
            if line.len() < 4 || !line.is_char_boundary(3) {
                return Err(IdentityError::Protocol(format!("malformed reply: {}", line)));
            }
            let code: u16 = line[..3]
                .parse()
                .map_err(|_| IdentityError::Protocol(format!("bad status in: {}", line)))?;
            let separator = line.as_bytes()[3];
            if !matches!(separator, b' ' | b'-' | b'+') {
                return Err(IdentityError::Protocol(format!("malformed reply: {}", line)));
            }
            lines.push(line[4..].to_string());

            match separator {
                b' ' => return Ok(ControlReply { code, lines }),
                b'+' => self.skip_data_block().await?,
                _ => {}
            }
        }
    }

    /// Data blocks end with a line holding a single dot.
    async fn skip_data_block(&mut self) -> Result<(), IdentityError> {
        loop {
            let mut raw = String::new();
            if self.stream.read_line(&mut raw).await? == 0 {
                return Err(IdentityError::Protocol(
                    "connection closed in data block".to_string(),
                ));
            }
            if raw.trim_end_matches(['\r', '\n']) == "." {
                return Ok(());
            }
        }
    }

    /// Authenticate with a password, or negotiate cookie/null authentication.
    pub async fn authenticate(&mut self, password: Option<&str>) -> Result<(), IdentityError> {
        let command = match password {
            Some(password) => format!("AUTHENTICATE {}", quote(password)),
            None => self.negotiated_auth_command().await?,
        };

        let reply = self.command(&command).await?;
        if reply.is_ok() {
            Ok(())
        } else {
            Err(IdentityError::AuthenticationFailed(format!(
                "{} {}",
                reply.code,
                reply.message()
            )))
        }
    }

    async fn negotiated_auth_command(&mut self) -> Result<String, IdentityError> {
        let reply = self.expect_ok("PROTOCOLINFO 1", "PROTOCOLINFO").await?;
        let info = AuthInfo::from_reply(&reply);
        debug!("Control port auth methods: {:?}", info.methods);

        if info.supports("NULL") {
            return Ok("AUTHENTICATE".to_string());
        }
        if info.supports("COOKIE") {
            if let Some(path) = &info.cookie_file {
                let cookie = tokio::fs::read(path).await.map_err(|e| {
                    IdentityError::AuthenticationFailed(format!(
                        "cannot read cookie file {}: {}",
                        path, e
                    ))
                })?;
                return Ok(format!("AUTHENTICATE {}", hex::encode_upper(&cookie)));
            }
        }
        Err(IdentityError::AuthenticationFailed(format!(
            "no usable method among {:?}; configure tor.control_password",
            info.methods
        )))
    }

    /// Send `SIGNAL <name>`.
    pub async fn signal(&mut self, name: &str) -> Result<(), IdentityError> {
        self.expect_ok(&format!("SIGNAL {}", name), &format!("SIGNAL {}", name))
            .await?;
        Ok(())
    }
}

/// Tor identity channel: `SIGNAL NEWNYM` for rotation, and an optionally
/// managed Tor process for hard restarts.
pub struct TorIdentityChannel {
    config: TorConfig,
    process: Mutex<Option<Child>>,
}

impl TorIdentityChannel {
    pub fn new(config: TorConfig) -> Self {
        Self {
            config,
            process: Mutex::new(None),
        }
    }

    fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.config.control_timeout_secs.max(1))
    }

    async fn authenticated(&self) -> Result<ControlConnection, IdentityError> {
        let mut conn = ControlConnection::connect(&self.config.control_addr(), self.io_timeout()).await?;
        conn.authenticate(self.config.control_password.as_deref())
            .await?;
        Ok(conn)
    }

    async fn send_signal(&self, name: &str) -> Result<(), IdentityError> {
        let mut conn = self.authenticated().await?;
        conn.signal(name).await
    }

    async fn wait_for_control_port(&self) -> Result<(), IdentityError> {
        let secs = self.config.startup_timeout_secs;
        let deadline = Instant::now() + Duration::from_secs(secs);
        let addr = self.config.control_addr();

        loop {
            if TcpStream::connect(&addr).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(IdentityError::StartupTimeout { secs });
            }
            sleep(Duration::from_millis(250)).await;
        }
    }
}

#[async_trait]
impl IdentityChannel for TorIdentityChannel {
    fn name(&self) -> &str {
        "tor"
    }

    async fn rotate(&self) -> Result<(), IdentityError> {
        self.send_signal("NEWNYM").await?;
        info!("Requested new Tor circuit");
        Ok(())
    }

    async fn terminate(&self) -> Result<(), IdentityError> {
        if let Err(e) = self.send_signal("SHUTDOWN").await {
            debug!("Graceful Tor shutdown signal failed: {}", e);
        }

        let mut process = self.process.lock().await;
        let Some(mut child) = process.take() else {
            return Ok(());
        };

        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!("Tor exited ({})", status);
                Ok(())
            }
            Ok(Err(e)) => Err(IdentityError::Io(e)),
            Err(_) => {
                warn!(
                    "Tor still running after {}s, killing it",
                    self.config.shutdown_grace_secs
                );
                child.kill().await?;
                Ok(())
            }
        }
    }

    async fn launch(&self) -> Result<(), IdentityError> {
        let Some(path) = &self.config.launch_path else {
            debug!("Tor is managed externally, nothing to launch");
            return Ok(());
        };

        let mut process = self.process.lock().await;
        if let Some(child) = process.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                return Ok(());
            }
        }

        let child = Command::new(path)
            .args(&self.config.launch_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    IdentityError::NotFound { path: path.clone() }
                } else {
                    IdentityError::LaunchFailed(e.to_string())
                }
            })?;
        info!("Tor started (pid {:?})", child.id());
        *process = Some(child);
        drop(process);

        self.wait_for_control_port().await
    }
}
