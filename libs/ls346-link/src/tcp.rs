//! TCP Channel Implementation
//!
//! For instruments reached through a serial device server (ser2net, Moxa
//! NPort and similar). Framing is identical to the serial channel.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::error::{LinkError, Result};
use crate::line::LineChannel;

/// Line channel over a TCP stream
pub type TcpChannel = LineChannel<TcpStream>;

/// TCP channel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpConfig {
    /// Remote address as `host:port`
    pub address: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// TCP no-delay (Nagle algorithm)
    pub no_delay: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:4001".to_string(),
            connect_timeout_ms: 3000,
            no_delay: true,
        }
    }
}

impl TcpConfig {
    /// Validate TCP parameters
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(LinkError::config("Address cannot be empty"));
        }

        match self.address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {},
            _ => {
                return Err(LinkError::config(format!(
                    "Address must be host:port, got '{}'",
                    self.address
                )))
            },
        }

        if self.connect_timeout_ms == 0 {
            return Err(LinkError::config(
                "Connect timeout must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Connect and wrap the stream in a line channel
    pub async fn connect(&self, response_timeout: Duration) -> Result<TcpChannel> {
        self.validate()?;

        debug!("Connecting to {}", self.address);

        let connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        let stream = match timeout(connect_timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                let error_msg = format!("Failed to connect to {}: {e}", self.address);
                error!("{error_msg}");
                return Err(LinkError::Connection(error_msg));
            },
            Err(_) => {
                return Err(LinkError::timeout(format!(
                    "connect to {} timed out after {connect_timeout:?}",
                    self.address
                )))
            },
        };

        stream.set_nodelay(self.no_delay)?;

        info!("Connected to {}", self.address);
        Ok(LineChannel::new(format!("tcp:{}", self.address), stream)
            .with_response_timeout(response_timeout))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::traits::InstrumentChannel;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[test]
    fn test_validate_address() {
        assert!(TcpConfig::default().validate().is_ok());

        for address in ["", "localhost", ":4001", "host:notaport"] {
            let config = TcpConfig {
                address: address.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{address} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(socket);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            assert_eq!(line, ";CRVPT? 21,1\r\n");
            reader.get_mut().write_all(b"+0.10000,+300.000\r\n").await.unwrap();
        });

        let config = TcpConfig {
            address,
            ..Default::default()
        };
        let mut channel = config.connect(Duration::from_secs(1)).await.unwrap();

        let response = channel.query(";CRVPT? 21,1").await.unwrap();
        assert_eq!(response, "+0.10000,+300.000");
        assert!(channel.name().starts_with("tcp:127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let config = TcpConfig {
            address,
            ..Default::default()
        };
        assert!(config.connect(Duration::from_secs(1)).await.is_err());
    }
}
