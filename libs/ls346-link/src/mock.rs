//! Scripted Channel for Testing
//!
//! Replays canned responses (or a responder closure) instead of talking to
//! hardware, and records every command it was sent.

use async_trait::async_trait;
use std::collections::VecDeque;
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::traits::{InstrumentChannel, LinkStats, ProgressSink};

type Responder = Box<dyn FnMut(&str) -> Result<String> + Send>;

/// Channel that answers from a script
pub struct ScriptedChannel {
    name: String,
    responses: VecDeque<Result<String>>,
    responder: Option<Responder>,
    sent: Vec<String>,
    stats: LinkStats,
}

impl std::fmt::Debug for ScriptedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedChannel")
            .field("name", &self.name)
            .field("pending_responses", &self.responses.len())
            .field("has_responder", &self.responder.is_some())
            .field("sent", &self.sent)
            .finish()
    }
}

impl ScriptedChannel {
    /// Channel that replays `responses` in order
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "scripted".to_string(),
            responses: responses.into_iter().map(|r| Ok(r.into())).collect(),
            responder: None,
            sent: Vec::new(),
            stats: LinkStats::new(),
        }
    }

    /// Channel that computes each response from the command
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&str) -> Result<String> + Send + 'static,
    {
        Self {
            name: "scripted".to_string(),
            responses: VecDeque::new(),
            responder: Some(Box::new(responder)),
            sent: Vec::new(),
            stats: LinkStats::new(),
        }
    }

    /// Queue a successful response
    pub fn push_response(&mut self, response: impl Into<String>) {
        self.responses.push_back(Ok(response.into()));
    }

    /// Queue a link failure
    pub fn push_error(&mut self, error: LinkError) {
        self.responses.push_back(Err(error));
    }

    /// Commands sent so far, in order
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Number of scripted responses not yet consumed
    pub fn pending(&self) -> usize {
        self.responses.len()
    }
}

#[async_trait]
impl InstrumentChannel for ScriptedChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&mut self, command: &str) -> Result<String> {
        self.sent.push(command.to_string());

        let response = match self.responses.pop_front() {
            Some(response) => response,
            None => match self.responder.as_mut() {
                Some(responder) => responder(command),
                None => Err(LinkError::timeout(format!(
                    "no scripted response for '{command}'"
                ))),
            },
        };

        match &response {
            Ok(text) => {
                self.stats.record_round_trip(command.len(), text.len());
                debug!(command, response = %text, "Scripted round trip");
            },
            Err(_) => self.stats.record_failure(),
        }
        response
    }

    fn stats(&self) -> LinkStats {
        self.stats.clone()
    }
}

/// Progress sink that keeps every reported value
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    values: Vec<f64>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&mut self, percent: f64) {
        self.values.push(percent);
    }
}
