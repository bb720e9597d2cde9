//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use specpad_core::{DEFAULT_DOCUMENT_PATH, DEFAULT_FLUSH_INTERVAL_MS};

use crate::{GatewayError, DEFAULT_HOST, DEFAULT_PORT};

/// Where the browser editor is served from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorSource {
    /// Assets compiled into the binary
    Builtin,
    /// An editor installation on disk
    Directory(PathBuf),
}

impl Default for EditorSource {
    fn default() -> Self {
        Self::Builtin
    }
}

impl FromStr for EditorSource {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "builtin" {
            Ok(Self::Builtin)
        } else {
            Ok(Self::Directory(PathBuf::from(s)))
        }
    }
}

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Document being edited
    pub document_path: PathBuf,

    /// Directory served under `/static/`, defaults to the document's directory
    pub static_path: Option<PathBuf>,

    /// Editor assets
    pub editor: EditorSource,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Time between flush ticks
    pub flush_interval_ms: u64,

    /// Open the editor in a browser once listening
    pub open_browser: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from(DEFAULT_DOCUMENT_PATH),
            static_path: None,
            editor: EditorSource::Builtin,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            open_browser: true,
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.document_path = path.into();
        self
    }

    pub fn with_static_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_path = Some(path.into());
        self
    }

    pub fn with_editor(mut self, editor: EditorSource) -> Self {
        self.editor = editor;
        self
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_open_browser(mut self, open: bool) -> Self {
        self.open_browser = open;
        self
    }

    /// Static directory, falling back to the directory holding the document
    pub fn resolved_static_path(&self) -> PathBuf {
        if let Some(path) = &self.static_path {
            return path.clone();
        }
        match self.document_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| GatewayError::InvalidConfig(format!("{}:{}: {}", self.host, self.port, e)))
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.flush_interval_ms == 0 {
            return Err(GatewayError::InvalidConfig(
                "flush_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.document_path.as_os_str().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "document_path must not be empty".to_string(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }
}
