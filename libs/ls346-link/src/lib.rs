//! LakeShore 346 Instrument Link Library
//!
//! Communication abstractions shared by the curve transfer engine and the
//! command-line tool.
//!
//! # Architecture
//!
//! This library provides:
//! - **Core Traits**: `InstrumentChannel` (one command, one response line) and
//!   `ProgressSink` (percentage observer)
//! - **Line Channels**: CR/LF framed request/response over serial ports and
//!   TCP device servers
//! - **Progress Sinks**: tracing-backed and `watch`-channel observers
//!
//! # Features
//!
//! - `test-utils` - scripted channel and recording sink for tests

pub mod error;
pub mod factory;
pub mod line;
pub mod progress;
pub mod serial;
pub mod tcp;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

// Re-export core types
pub use error::{LinkError, Result};
pub use factory::{open_channel, LinkConfig, LinkKind};
pub use line::LineChannel;
pub use progress::{render_percent, LogProgress, WatchProgress};
pub use serial::{SerialChannel, SerialConfig};
pub use tcp::{TcpChannel, TcpConfig};
pub use traits::{InstrumentChannel, LinkStats, ProgressSink};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{RecordingProgress, ScriptedChannel};
