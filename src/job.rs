//! Tracking of a server-side analysis job through its progress stream.
//!
//! The monitor is a plain state machine: the transport feeds it
//! [`StreamEvent`]s one at a time and it answers with a [`Transition`] telling
//! the caller what to show or do next. It owns the stream subscription and is
//! the only thing that closes it.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const CONNECTION_LOST: &str = "Connection to server lost";
const ANALYSIS_FAILED: &str = "Analysis failed";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        SessionId(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Pending,
    Validating,
    Extracting,
    Tokenizing,
    DetectingPhrases,
    MatchingLevels,
    GeneratingStats,
    Completed,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Pending => "Waiting to start...",
            Stage::Validating => "Validating file...",
            Stage::Extracting => "Extracting text...",
            Stage::Tokenizing => "Tokenizing words...",
            Stage::DetectingPhrases => "Detecting phrases...",
            Stage::MatchingLevels => "Matching CEFR levels...",
            Stage::GeneratingStats => "Generating statistics...",
            Stage::Completed => "Complete!",
        }
    }

    /// Parses the wire name, e.g. `DETECTING_PHRASES`.
    pub fn from_wire(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }
}

/// One decoded signal from the progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The subscription is established.
    Opened,
    /// `stage` is the raw wire name; unknown names are shown verbatim.
    Progress { progress: u8, stage: String },
    Complete,
    /// Explicit `error` event from the server.
    Failed { message: Option<String> },
    /// The connection dropped, or sent a payload that could not be read.
    Disconnected { reason: Option<String> },
}

/// Handle to a live stream subscription.
pub trait Subscription: Send {
    fn close(&mut self);
}

/// Opens progress streams. The receiver yields events in arrival order.
pub trait StreamConnector {
    fn connect(&mut self, session: &SessionId) -> OpenedStream;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Connecting,
    Active,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobState {
    pub session_id: SessionId,
    pub stage: Stage,
    pub progress: u8,
    pub phase: Phase,
    /// What the progress display currently reads.
    pub stage_text: String,
}

impl JobState {
    fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            stage: Stage::Pending,
            progress: 0,
            phase: Phase::Connecting,
            stage_text: Stage::Pending.label().to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

/// What the caller should do after an event has been applied.
#[derive(Debug)]
pub enum Transition {
    /// Redraw the progress display.
    Progress { progress: u8, stage_text: String },
    /// Job done and stream closed; fetch the result after `fetch_after`.
    Completed { session_id: SessionId, fetch_after: Duration },
    /// Job over with an error; stream already closed.
    Failed(ClientError),
    /// Nothing to show.
    Unchanged,
}

/// A freshly opened stream, or the reason it could not be opened.
pub type OpenedStream = Result<(Box<dyn Subscription>, UnboundedReceiver<StreamEvent>), ClientError>;

pub struct JobMonitor {
    state: Option<JobState>,
    subscription: Option<Box<dyn Subscription>>,
    completion_delay: Duration,
}

impl fmt::Debug for JobMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobMonitor")
            .field("state", &self.state)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

impl JobMonitor {
    pub fn new(completion_delay: Duration) -> Self {
        Self {
            state: None,
            subscription: None,
            completion_delay,
        }
    }

    pub fn state(&self) -> Option<&JobState> {
        self.state.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribes to the progress stream for `session`, closing any previous
    /// subscription first.
    pub fn start<C>(&mut self, connector: &mut C, session: SessionId) -> Result<UnboundedReceiver<StreamEvent>, ClientError>
    where
        C: StreamConnector + ?Sized,
    {
        self.close_subscription();
        let opened = connector.connect(&session);
        self.attach(session, opened)
    }

    /// Takes over a stream opened elsewhere, e.g. on a blocking thread.
    /// Any previous subscription is closed.
    pub fn attach(&mut self, session: SessionId, opened: OpenedStream) -> Result<UnboundedReceiver<StreamEvent>, ClientError> {
        self.close_subscription();
        let mut state = JobState::new(session);

        match opened {
            Ok((subscription, events)) => {
                tracing::info!(session = %state.session_id, "progress stream opened");
                self.subscription = Some(subscription);
                self.state = Some(state);
                Ok(events)
            }
            Err(e) => {
                tracing::warn!(session = %state.session_id, error = %e, "could not open progress stream");
                state.phase = Phase::Failed;
                self.state = Some(state);
                Err(ClientError::Stream(e.to_string()))
            }
        }
    }

    pub fn handle(&mut self, event: StreamEvent) -> Transition {
        let Some(state) = self.state.as_mut() else {
            tracing::debug!(?event, "stream event without a job, ignoring");
            return Transition::Unchanged;
        };
        if state.is_terminal() {
            tracing::debug!(session = %state.session_id, ?event, "job already finished, ignoring stream signal");
            return Transition::Unchanged;
        }

        match event {
            StreamEvent::Opened => {
                state.phase = Phase::Active;
                Transition::Unchanged
            }
            StreamEvent::Progress { progress, stage } => {
                state.phase = Phase::Active;
                state.progress = progress.min(100);
                state.stage_text = match Stage::from_wire(&stage) {
                    Some(known) => {
                        state.stage = known;
                        known.label().to_string()
                    }
                    None => stage,
                };
                Transition::Progress {
                    progress: state.progress,
                    stage_text: state.stage_text.clone(),
                }
            }
            StreamEvent::Complete => {
                state.phase = Phase::Succeeded;
                state.progress = 100;
                state.stage = Stage::Completed;
                state.stage_text = Stage::Completed.label().to_string();
                let session_id = state.session_id.clone();
                tracing::info!(session = %session_id, "analysis complete");
                self.close_subscription();
                Transition::Completed {
                    session_id,
                    fetch_after: self.completion_delay,
                }
            }
            StreamEvent::Failed { message } => {
                state.phase = Phase::Failed;
                let message = message.unwrap_or_else(|| ANALYSIS_FAILED.to_string());
                tracing::warn!(session = %state.session_id, %message, "analysis failed");
                self.close_subscription();
                Transition::Failed(ClientError::Job(message))
            }
            StreamEvent::Disconnected { reason } => {
                state.phase = Phase::Failed;
                tracing::warn!(session = %state.session_id, reason = reason.as_deref().unwrap_or("none"), "progress stream lost");
                self.close_subscription();
                Transition::Failed(ClientError::Stream(CONNECTION_LOST.to_string()))
            }
        }
    }

    /// Closes the stream if one is open, then forgets the job.
    pub fn reset(&mut self) {
        self.close_subscription();
        self.state = None;
    }

    fn close_subscription(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
            tracing::debug!("progress stream closed");
        }
    }
}

impl Drop for JobMonitor {
    fn drop(&mut self) {
        self.close_subscription();
    }
}
