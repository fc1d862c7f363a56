//! Line-Framed Channel
//!
//! The instrument speaks a text protocol: one command line out, one response
//! line back, both terminated by CR/LF. [`LineChannel`] implements that
//! framing over any async byte stream so the serial and TCP channels share it.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{LinkError, Result};
use crate::traits::{InstrumentChannel, LinkStats};

/// Default line terminator used by the instrument
pub const DEFAULT_TERMINATOR: &str = "\r\n";

/// Default time to wait for a response line
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Request/response channel over a line-framed byte stream
#[derive(Debug)]
pub struct LineChannel<S> {
    name: String,
    stream: BufReader<S>,
    terminator: String,
    response_timeout: Duration,
    stats: LinkStats,
}

impl<S> LineChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream
    pub fn new(name: impl Into<String>, stream: S) -> Self {
        Self {
            name: name.into(),
            stream: BufReader::new(stream),
            terminator: DEFAULT_TERMINATOR.to_string(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            stats: LinkStats::new(),
        }
    }

    /// Override the line terminator (must not be empty)
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Result<Self> {
        let terminator = terminator.into();
        if terminator.is_empty() {
            return Err(LinkError::config("Line terminator cannot be empty"));
        }
        self.terminator = terminator;
        Ok(self)
    }

    /// Override the response timeout
    pub fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    async fn round_trip(&mut self, command: &str) -> Result<(String, usize, usize)> {
        let mut frame = Vec::with_capacity(command.len() + self.terminator.len());
        frame.extend_from_slice(command.as_bytes());
        frame.extend_from_slice(self.terminator.as_bytes());

        let response_timeout = self.response_timeout;
        let writer = self.stream.get_mut();
        let send_operation = async {
            writer.write_all(&frame).await?;
            writer.flush().await?;
            Ok::<_, std::io::Error>(())
        };
        match timeout(response_timeout, send_operation).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(LinkError::timeout(format!(
                    "send timed out after {response_timeout:?}"
                )))
            },
        }

        // The terminator's last byte delimits a line; anything that does not
        // end with the full terminator is still read up to that byte.
        let delimiter = self.terminator.as_bytes()[self.terminator.len() - 1];
        let mut raw = Vec::new();
        let received = match timeout(
            response_timeout,
            self.stream.read_until(delimiter, &mut raw),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(LinkError::timeout(format!(
                    "no response within {response_timeout:?}"
                )))
            },
        };

        if received == 0 {
            return Err(LinkError::io("unexpected end of file"));
        }

        if raw.ends_with(self.terminator.as_bytes()) {
            raw.truncate(raw.len() - self.terminator.len());
        } else if raw.last() == Some(&delimiter) {
            raw.pop();
        }

        let response = String::from_utf8_lossy(&raw).into_owned();
        Ok((response, frame.len(), received))
    }
}

#[async_trait]
impl<S> InstrumentChannel for LineChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&mut self, command: &str) -> Result<String> {
        debug!(channel = %self.name, command, direction = "send", "[Line] Command");

        match self.round_trip(command).await {
            Ok((response, sent, received)) => {
                self.stats.record_round_trip(sent, received);
                debug!(channel = %self.name, response = %response, direction = "recv", "[Line] Response");
                Ok(response)
            },
            Err(e) => {
                self.stats.record_failure();
                warn!(channel = %self.name, "Round trip failed: {}", e);
                Err(e)
            },
        }
    }

    fn stats(&self) -> LinkStats {
        self.stats.clone()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_query_frames_command_and_strips_terminator() {
        let (client, instrument) = duplex(256);
        let mut channel = LineChannel::new("duplex", client);

        let responder = tokio::spawn(async move {
            let mut reader = BufReader::new(instrument);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            reader.get_mut().write_all(b"1\r\n").await.unwrap();
            line
        });

        let response = channel.query(";CRVPT 21,1,1.000000,10.000000;*OPC?").await.unwrap();
        let sent = responder.await.unwrap();

        assert_eq!(response, "1");
        assert_eq!(sent, ";CRVPT 21,1,1.000000,10.000000;*OPC?\r\n");

        let stats = channel.stats();
        assert_eq!(stats.round_trips, 1);
        assert_eq!(stats.bytes_received, 3);
    }

    #[tokio::test]
    async fn test_query_accepts_bare_newline() {
        let (client, mut instrument) = duplex(256);
        let mut channel = LineChannel::new("duplex", client);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 64];
            let _ = instrument.read(&mut buf).await.unwrap();
            instrument.write_all(b"+1.234,+77.35\n").await.unwrap();
        });

        let response = channel.query(";CRVPT? 1,1").await.unwrap();
        assert_eq!(response, "+1.234,+77.35");
    }

    #[tokio::test]
    async fn test_query_times_out_without_response() {
        let (client, _instrument) = duplex(256);
        let mut channel =
            LineChannel::new("silent", client).with_response_timeout(Duration::from_millis(20));

        let err = channel.query(";CRVPT? 1,1").await.unwrap_err();
        assert!(matches!(err, LinkError::Timeout(_)));
        assert_eq!(channel.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_query_reports_closed_stream() {
        let (client, instrument) = duplex(256);
        drop(instrument);
        let mut channel = LineChannel::new("closed", client);

        assert!(channel.query(";CRVPT? 1,1").await.is_err());
    }

    #[test]
    fn test_empty_terminator_rejected() {
        let (client, _instrument) = duplex(8);
        let result = LineChannel::new("duplex", client).with_terminator("");
        assert!(matches!(result, Err(LinkError::Config(_))));
    }
}
