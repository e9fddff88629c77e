//! Typed events on the workflow streaming channel.
//!
//! The workflow service emits SSE frames whose payload is a JSON object
//! tagged by an `event` field with the body under `data`. The same shape is
//! re-emitted verbatim to our own SSE subscribers, so every variant is both
//! serializable and deserializable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WorkflowEvent {
    WorkflowStarted {
        /// Run id assigned by the workflow service.
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },
    NodeStarted {
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    TextChunk {
        text: String,
    },
    NodeFinished {
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    WorkflowFinished {
        #[serde(skip_serializing_if = "Option::is_none")]
        outputs: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Error {
        message: String,
    },
}

impl WorkflowEvent {
    /// Terminal events end a run; nothing meaningful follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowEvent::WorkflowFinished { .. } | WorkflowEvent::Error { .. }
        )
    }
}

/// Pulls the generated text out of a finished event's outputs. The workflow
/// publishes it under `text` (single-output workflows) or `output`.
pub fn outputs_text(outputs: &Value) -> Option<String> {
    outputs
        .get("text")
        .or_else(|| outputs.get("output"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Incremental SSE frame decoder. Feed raw body chunks in; completed events
/// come out. Frames are separated by a blank line; only `data:` lines carry
/// payload. The transport splits chunks at arbitrary byte offsets, including
/// inside a UTF-8 sequence, so the buffer holds raw bytes and decodes text
/// only once a frame is complete. Unknown event types are logged and skipped
/// so protocol additions on the workflow side do not break the relay.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buf: Vec<u8>,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<WorkflowEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(idx) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let frame: Vec<u8> = self.buf.drain(..idx + 2).collect();
            let block = String::from_utf8_lossy(&frame);
            if let Some(event) = parse_event_block(&block) {
                events.push(event);
            }
        }

        events
    }
}

/// Parses one SSE frame. Returns `None` for comments, keep-alives and
/// payloads this client does not understand.
pub fn parse_event_block(block: &str) -> Option<WorkflowEvent> {
    let data: String = block
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter_map(|l| l.strip_prefix("data:"))
        .map(|l| l.trim_start())
        .collect::<Vec<_>>()
        .join("\n");

    if data.is_empty() {
        return None;
    }

    match serde_json::from_str::<WorkflowEvent>(&data) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Skipping unrecognized workflow event: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_chunk_frame() {
        let block = "data: {\"event\":\"text_chunk\",\"data\":{\"text\":\"Hello\"}}\n\n";
        let event = parse_event_block(block).unwrap();
        assert_eq!(
            event,
            WorkflowEvent::TextChunk {
                text: "Hello".to_string()
            }
        );
    }

    #[test]
    fn test_parse_workflow_started_with_task_id() {
        let block =
            "data: {\"event\":\"workflow_started\",\"data\":{\"id\":\"run-1\",\"task_id\":\"t-9\"}}\n\n";
        let event = parse_event_block(block).unwrap();
        assert_eq!(
            event,
            WorkflowEvent::WorkflowStarted {
                id: "run-1".to_string(),
                task_id: Some("t-9".to_string()),
            }
        );
    }

    #[test]
    fn test_buffer_reassembles_split_frames() {
        let mut buf = SseBuffer::new();
        assert!(buf
            .push(b"data: {\"event\":\"text_chunk\",\"data\"")
            .is_empty());
        let events = buf.push(b":{\"text\":\"Hi\"}}\n\n");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_buffer_reassembles_multibyte_char_split_across_chunks() {
        let frame = "data: {\"event\":\"text_chunk\",\"data\":{\"text\":\"你好\"}}\n\n".as_bytes();
        // Split inside the three-byte 好 so neither chunk decodes on its own.
        let (head, tail) = frame.split_at(frame.len() - 7);

        let mut buf = SseBuffer::new();
        assert!(buf.push(head).is_empty());
        let events = buf.push(tail);
        assert_eq!(
            events,
            vec![WorkflowEvent::TextChunk {
                text: "你好".to_string()
            }]
        );
    }

    #[test]
    fn test_buffer_yields_multiple_frames_from_one_chunk() {
        let mut buf = SseBuffer::new();
        let chunk = b"data: {\"event\":\"text_chunk\",\"data\":{\"text\":\"a\"}}\n\n\
                     data: {\"event\":\"text_chunk\",\"data\":{\"text\":\"b\"}}\n\n";
        let events = buf.push(chunk);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_unknown_event_is_skipped() {
        let block = "data: {\"event\":\"tts_message\",\"data\":{}}\n\n";
        assert!(parse_event_block(block).is_none());
    }

    #[test]
    fn test_comment_and_ping_frames_are_skipped() {
        assert!(parse_event_block(": keep-alive\n\n").is_none());
        assert!(parse_event_block("event: ping\n\n").is_none());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(WorkflowEvent::WorkflowFinished {
            outputs: None,
            status: None,
            error: None
        }
        .is_terminal());
        assert!(WorkflowEvent::Error {
            message: "boom".to_string()
        }
        .is_terminal());
        assert!(!WorkflowEvent::TextChunk {
            text: String::new()
        }
        .is_terminal());
    }

    #[test]
    fn test_outputs_text_prefers_text_key() {
        let outputs = json!({ "text": "generated", "output": "other" });
        assert_eq!(outputs_text(&outputs).unwrap(), "generated");
        let outputs = json!({ "output": "fallback key" });
        assert_eq!(outputs_text(&outputs).unwrap(), "fallback key");
        assert!(outputs_text(&json!({})).is_none());
    }

    #[test]
    fn test_event_serializes_back_to_wire_shape() {
        let event = WorkflowEvent::TextChunk {
            text: "Hi".to_string(),
        };
        let wire = serde_json::to_value(&event).unwrap();
        assert_eq!(wire, json!({ "event": "text_chunk", "data": { "text": "Hi" } }));
    }
}
