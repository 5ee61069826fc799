use serde_json::Value;

use crate::events::MessagesStreamEvent;
use crate::response::TextCitation;

/// Incremental parser for SSE text streams.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<MessagesStreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find("\n\n") {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 2);
            events.extend(parse_frame(&frame));
        }

        events
    }

    /// Drain a trailing frame left without its blank-line terminator.
    pub fn finish(&mut self) -> Vec<MessagesStreamEvent> {
        let frame = std::mem::take(&mut self.buffer);
        parse_frame(frame.trim_end()).into_iter().collect()
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<MessagesStreamEvent> {
        let mut parser = Self::default();
        let mut events = parser.feed(input.as_bytes());
        events.extend(parser.finish());
        events
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn parse_frame(frame: &str) -> Option<MessagesStreamEvent> {
    let payload = extract_data_payload(frame)?;
    if payload == "[DONE]" {
        return None;
    }
    let value = serde_json::from_str::<Value>(&payload).ok()?;
    map_event(value)
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|value| value.as_str())
        .map(ToString::to_string)
}

fn index_field(value: &Value) -> usize {
    value
        .get("index")
        .and_then(|value| value.as_u64())
        .and_then(|index| usize::try_from(index).ok())
        .unwrap_or(0)
}

fn map_event(value: Value) -> Option<MessagesStreamEvent> {
    let event_type = value.get("type")?.as_str()?;

    match event_type {
        "message_start" => {
            let message = value.get("message");
            Some(MessagesStreamEvent::MessageStart {
                id: message.and_then(|message| str_field(message, "id")),
                model: message.and_then(|message| str_field(message, "model")),
            })
        }
        "content_block_start" => {
            let block_type = value
                .get("content_block")
                .and_then(|block| str_field(block, "type"))
                .unwrap_or_default();
            Some(MessagesStreamEvent::ContentBlockStart {
                index: index_field(&value),
                block_type,
            })
        }
        "content_block_delta" => map_delta(index_field(&value), value.get("delta")?),
        "content_block_stop" => Some(MessagesStreamEvent::ContentBlockStop {
            index: index_field(&value),
        }),
        "message_delta" => Some(MessagesStreamEvent::MessageDelta {
            stop_reason: value
                .get("delta")
                .and_then(|delta| str_field(delta, "stop_reason")),
        }),
        "message_stop" => Some(MessagesStreamEvent::MessageStop),
        "ping" => Some(MessagesStreamEvent::Ping),
        "error" => {
            let error = value.get("error");
            Some(MessagesStreamEvent::Error {
                error_type: error.and_then(|error| str_field(error, "type")),
                message: error.and_then(|error| str_field(error, "message")),
            })
        }
        other => Some(MessagesStreamEvent::Unknown {
            event_type: other.to_string(),
        }),
    }
}

fn map_delta(index: usize, delta: &Value) -> Option<MessagesStreamEvent> {
    match delta.get("type")?.as_str()? {
        "text_delta" => Some(MessagesStreamEvent::TextDelta {
            index,
            text: str_field(delta, "text").unwrap_or_default(),
        }),
        "thinking_delta" => Some(MessagesStreamEvent::ThinkingDelta {
            index,
            thinking: str_field(delta, "thinking").unwrap_or_default(),
        }),
        "citations_delta" => {
            let citation = serde_json::from_value::<TextCitation>(delta.get("citation")?.clone())
                .ok()?
                .as_web()?;
            Some(MessagesStreamEvent::CitationDelta { index, citation })
        }
        // signature and tool-input deltas carry nothing a text consumer reads
        _ => None,
    }
}
