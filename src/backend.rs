//! HTTP side of the client: the progress stream and result download.

use crate::analysis::AnalysisResult;
use crate::error::{ClientError, Result};
use crate::job::{SessionId, StreamConnector, StreamEvent, Subscription};
use crate::sse::{self, SseParser};
use std::io::{BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Retrieves the full result document once a job has completed.
pub trait ResultSource {
    fn fetch_result(&self, session: &SessionId) -> Result<AnalysisResult>;

    /// Download link for one of the server's export formats.
    fn export_url(&self, session: &SessionId, format: ExportFormat) -> String;
}

/// Everything a session needs from the server. Cloned to run the result
/// fetch off the control thread.
pub trait Backend: StreamConnector + ResultSource + Clone + Send + Sync + 'static {}

impl<T> Backend for T where T: StreamConnector + ResultSource + Clone + Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Markdown];

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout_connect(connect_timeout).build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn progress_url(&self, session: &SessionId) -> String {
        format!("{}/progress/{}", self.base_url, session)
    }
}

impl StreamConnector for HttpBackend {
    fn connect(&mut self, session: &SessionId) -> Result<(Box<dyn Subscription>, UnboundedReceiver<StreamEvent>)> {
        let url = self.progress_url(session);
        let response = self
            .agent
            .get(&url)
            .set("Accept", "text/event-stream")
            .call()
            .map_err(|e| ClientError::Http(format!("Failed to open {}: {}", url, e)))?;

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = unbounded_channel();
        let cancel_clone = Arc::clone(&cancel);
        let reader = response.into_reader();
        std::thread::Builder::new()
            .name(format!("progress-{}", session))
            .spawn(move || pump_events(reader, tx, cancel_clone))?;

        Ok((Box::new(HttpSubscription { cancel }), rx))
    }
}

impl ResultSource for HttpBackend {
    fn fetch_result(&self, session: &SessionId) -> Result<AnalysisResult> {
        let url = self.export_url(session, ExportFormat::Json);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| ClientError::ResultFetch(e.to_string()))?;

        // Results for long books easily exceed ureq's in-memory string limit.
        let result: AnalysisResult = serde_json::from_reader(BufReader::new(response.into_reader()))
            .map_err(|e| ClientError::InvalidResult(e.to_string()))?;
        tracing::info!(session = %session, words = result.words.len(), phrases = result.phrases.len(), "result fetched");
        Ok(result)
    }

    fn export_url(&self, session: &SessionId, format: ExportFormat) -> String {
        format!("{}/download/{}/{}", self.base_url, session, format.as_str())
    }
}

struct HttpSubscription {
    cancel: Arc<AtomicBool>,
}

impl Subscription for HttpSubscription {
    fn close(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

/// Reads the stream line by line and forwards decoded events until the
/// stream ends, the subscription is closed, or nobody is listening.
fn pump_events<R: Read>(reader: R, tx: UnboundedSender<StreamEvent>, cancel: Arc<AtomicBool>) {
    let mut reader = BufReader::new(reader);
    let mut parser = SseParser::default();
    let mut line = String::new();

    if tx.send(StreamEvent::Opened).is_err() {
        return;
    }

    loop {
        line.clear();
        let outcome = reader.read_line(&mut line);
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        let event = match outcome {
            Ok(0) => Some(StreamEvent::Disconnected { reason: None }),
            Ok(_) => parser.push_line(&line).and_then(|frame| sse::decode(&frame)),
            Err(e) => Some(StreamEvent::Disconnected { reason: Some(e.to_string()) }),
        };
        let Some(event) = event else { continue };
        let last = matches!(event, StreamEvent::Disconnected { .. });
        if tx.send(event).is_err() || last {
            return;
        }
    }
}
