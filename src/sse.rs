//! Server-sent events: line framing and decoding of the three progress
//! stream event types.

use crate::job::StreamEvent;
use serde::Deserialize;

/// One dispatched SSE message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Accumulates `field: value` lines until a blank line dispatches a frame.
#[derive(Debug, Default)]
pub struct SseParser {
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Feeds one line (with or without its line terminator).
    pub fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

#[derive(Deserialize)]
struct ProgressPayload {
    progress: i64,
    #[serde(default)]
    stage: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Maps a frame to a monitor event. Unreadable payloads count as a broken
/// stream; frames of other types are skipped.
pub fn decode(frame: &SseFrame) -> Option<StreamEvent> {
    match frame.event.as_str() {
        "progress" => Some(match serde_json::from_str::<ProgressPayload>(&frame.data) {
            Ok(p) => StreamEvent::Progress {
                progress: p.progress.clamp(0, 100) as u8,
                stage: p.stage,
            },
            Err(e) => StreamEvent::Disconnected {
                reason: Some(format!("malformed progress payload: {e}")),
            },
        }),
        "complete" => Some(StreamEvent::Complete),
        "error" => Some(if frame.data.trim().is_empty() {
            StreamEvent::Disconnected { reason: None }
        } else {
            match serde_json::from_str::<ErrorPayload>(&frame.data) {
                Ok(payload) => StreamEvent::Failed {
                    message: payload.error.and_then(|e| e.message),
                },
                Err(e) => StreamEvent::Disconnected {
                    reason: Some(format!("malformed error payload: {e}")),
                },
            }
        }),
        other => {
            tracing::debug!(event = other, "skipping unknown stream event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut SseParser, text: &str) -> Vec<SseFrame> {
        text.split_inclusive('\n').filter_map(|l| parser.push_line(l)).collect()
    }

    #[test]
    fn test_frames_split_on_blank_lines() {
        let mut parser = SseParser::default();
        let frames = feed(
            &mut parser,
            ": keepalive\nevent: progress\ndata: {\"progress\": 15, \"stage\": \"EXTRACTING\"}\n\nevent: complete\ndata: {\"progress\": 100}\n\n",
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "progress");
        assert_eq!(
            decode(&frames[0]),
            Some(StreamEvent::Progress { progress: 15, stage: "EXTRACTING".into() })
        );
        assert_eq!(decode(&frames[1]), Some(StreamEvent::Complete));
    }

    #[test]
    fn test_multiline_data_is_joined() {
        let mut parser = SseParser::default();
        let frames = feed(&mut parser, "data: a\r\ndata: b\r\n\r\n");
        assert_eq!(frames[0], SseFrame { event: "message".into(), data: "a\nb".into() });
        assert_eq!(decode(&frames[0]), None);
    }

    #[test]
    fn test_error_events() {
        let with_message = SseFrame {
            event: "error".into(),
            data: r#"{"status": "failed", "error": {"code": "EXTRACT", "message": "Could not read PDF"}}"#.into(),
        };
        assert_eq!(
            decode(&with_message),
            Some(StreamEvent::Failed { message: Some("Could not read PDF".into()) })
        );

        let empty = SseFrame { event: "error".into(), data: String::new() };
        assert_eq!(decode(&empty), Some(StreamEvent::Disconnected { reason: None }));

        let no_message = SseFrame { event: "error".into(), data: "{}".into() };
        assert_eq!(decode(&no_message), Some(StreamEvent::Failed { message: None }));
    }

    #[test]
    fn test_malformed_progress_breaks_stream() {
        let frame = SseFrame { event: "progress".into(), data: "not json".into() };
        assert!(matches!(decode(&frame), Some(StreamEvent::Disconnected { reason: Some(_) })));
    }
}
