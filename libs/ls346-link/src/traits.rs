//! Core Communication Traits
//!
//! The curve transfer engine only ever sees these two seams: a channel that
//! performs one request/response round trip, and a sink that receives
//! percentage-complete updates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::error::Result;

// ============================================================================
// Link Statistics
// ============================================================================

/// Round-trip statistics for an instrument channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Completed round trips
    pub round_trips: u64,
    /// Round trips that ended in an error
    pub failures: u64,
    /// Total bytes written, including line terminators
    pub bytes_sent: u64,
    /// Total bytes read, including line terminators
    pub bytes_received: u64,
    /// Time of the last successful round trip
    pub last_round_trip: Option<SystemTime>,
}

impl LinkStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful round trip
    pub fn record_round_trip(&mut self, sent: usize, received: usize) {
        self.round_trips += 1;
        self.bytes_sent += sent as u64;
        self.bytes_received += received as u64;
        self.last_round_trip = Some(SystemTime::now());
    }

    /// Record a failed round trip
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ============================================================================
// Instrument Channel
// ============================================================================

/// Synchronous request/response link to one instrument
///
/// A call to [`query`](InstrumentChannel::query) sends exactly one command
/// line and waits for exactly one response line. Callers must not interleave
/// operations on the same channel; `&mut self` enforces that at compile time.
#[async_trait]
pub trait InstrumentChannel: Send {
    /// Human-readable channel name used in logs
    fn name(&self) -> &str;

    /// Send `command` and return the response with its line terminator removed
    async fn query(&mut self, command: &str) -> Result<String>;

    /// Round-trip statistics
    fn stats(&self) -> LinkStats {
        LinkStats::default()
    }
}

// ============================================================================
// Progress Sink
// ============================================================================

/// Observer for percentage-complete updates during a transfer
///
/// Reports are fire-and-forget and are delivered from the same task that
/// performs the round trips.
pub trait ProgressSink: Send {
    /// Receive a completion percentage
    fn report(&mut self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: FnMut(f64) + Send,
{
    fn report(&mut self, percent: f64) {
        self(percent)
    }
}
