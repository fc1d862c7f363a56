//! Progress Sinks
//!
//! Concrete observers for transfer progress. The instrument-side contract is
//! a named observable that receives the percentage as a decimal string.

use tokio::sync::watch;
use tracing::info;

use crate::traits::ProgressSink;

/// Render a percentage the way the progress observable expects it
pub fn render_percent(percent: f64) -> String {
    format!("{percent:.6}")
}

/// Emits each progress update as a structured tracing event
#[derive(Debug, Clone)]
pub struct LogProgress {
    name: String,
}

impl LogProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ProgressSink for LogProgress {
    fn report(&mut self, percent: f64) {
        info!(observable = %self.name, progress = %render_percent(percent), "Transfer progress");
    }
}

/// Publishes each progress update on a `watch` channel
///
/// Subscribers always see the latest rendered value; intermediate values may
/// be skipped by slow readers, which matches a polled observable.
#[derive(Debug)]
pub struct WatchProgress {
    name: String,
    sender: watch::Sender<String>,
}

impl WatchProgress {
    /// Create a sink and the receiver that observes it
    pub fn new(name: impl Into<String>) -> (Self, watch::Receiver<String>) {
        let (sender, receiver) = watch::channel(render_percent(0.0));
        (
            Self {
                name: name.into(),
                sender,
            },
            receiver,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.sender.subscribe()
    }
}

impl ProgressSink for WatchProgress {
    fn report(&mut self, percent: f64) {
        // No receivers left is not an error for a fire-and-forget observer
        self.sender.send_replace(render_percent(percent));
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_render_percent() {
        assert_eq!(render_percent(0.0), "0.000000");
        assert_eq!(render_percent(40.0), "40.000000");
        assert_eq!(render_percent(100.0 / 3.0), "33.333333");
    }

    #[test]
    fn test_watch_progress_latest_value() {
        let (mut sink, receiver) = WatchProgress::new("curve:progress");
        assert_eq!(*receiver.borrow(), "0.000000");

        sink.report(40.0);
        sink.report(80.0);
        assert_eq!(*receiver.borrow(), "80.000000");
        assert_eq!(sink.name(), "curve:progress");
    }

    #[test]
    fn test_watch_progress_without_receivers() {
        let (mut sink, receiver) = WatchProgress::new("orphan");
        drop(receiver);
        sink.report(50.0);
        assert_eq!(*sink.subscribe().borrow(), "50.000000");
    }

    #[test]
    #[traced_test]
    fn test_log_progress_emits_event() {
        let mut sink = LogProgress::new("curve:progress");
        sink.report(25.0);
        assert!(logs_contain("25.000000"));
        assert!(logs_contain("curve:progress"));
    }
}
