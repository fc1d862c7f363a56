//! Channel Factory
//!
//! Builds the configured channel kind and hands it back as a trait object so
//! callers never depend on the concrete link type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::error::{LinkError, Result};
use crate::line::{DEFAULT_RESPONSE_TIMEOUT, DEFAULT_TERMINATOR};
use crate::serial::SerialConfig;
use crate::tcp::TcpConfig;
use crate::traits::InstrumentChannel;

/// Supported link kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// RS-232 serial port
    #[default]
    Serial,
    /// TCP serial device server
    Tcp,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Serial => write!(f, "serial"),
            LinkKind::Tcp => write!(f, "tcp"),
        }
    }
}

impl std::str::FromStr for LinkKind {
    type Err = LinkError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "serial" | "rs232" => Ok(LinkKind::Serial),
            "tcp" => Ok(LinkKind::Tcp),
            _ => Err(LinkError::config(format!("Unknown link kind: {s}"))),
        }
    }
}

/// Instrument link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Which link to open
    pub kind: LinkKind,
    /// Serial parameters, used when `kind` is `serial`
    pub serial: SerialConfig,
    /// TCP parameters, used when `kind` is `tcp`
    pub tcp: TcpConfig,
    /// Time to wait for each response line, in milliseconds
    pub response_timeout_ms: u64,
    /// Line terminator appended to commands and expected on responses
    pub line_terminator: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            kind: LinkKind::default(),
            serial: SerialConfig::default(),
            tcp: TcpConfig::default(),
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT.as_millis() as u64,
            line_terminator: DEFAULT_TERMINATOR.to_string(),
        }
    }
}

impl LinkConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Validate the parameters of the selected link kind
    pub fn validate(&self) -> Result<()> {
        if self.response_timeout_ms == 0 {
            return Err(LinkError::config(
                "Response timeout must be greater than zero",
            ));
        }
        if self.line_terminator.is_empty() {
            return Err(LinkError::config("Line terminator cannot be empty"));
        }
        match self.kind {
            LinkKind::Serial => self.serial.validate(),
            LinkKind::Tcp => self.tcp.validate(),
        }
    }
}

/// Open the configured instrument channel
pub async fn open_channel(config: &LinkConfig) -> Result<Box<dyn InstrumentChannel>> {
    config.validate()?;
    info!("Opening {} instrument link", config.kind);

    let response_timeout = config.response_timeout();
    let channel: Box<dyn InstrumentChannel> = match config.kind {
        LinkKind::Serial => Box::new(
            config
                .serial
                .open(response_timeout)?
                .with_terminator(config.line_terminator.clone())?,
        ),
        LinkKind::Tcp => Box::new(
            config
                .tcp
                .connect(response_timeout)
                .await?
                .with_terminator(config.line_terminator.clone())?,
        ),
    };

    Ok(channel)
}
