/// One complete server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    Data(String),
    /// The `data: [DONE]` terminator.
    Done,
}

/// Incremental SSE framing over arbitrary byte chunks.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut frames = Vec::new();
        while let Some(split) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..split + 2).collect();
            frames.extend(parse_frame(&frame));
        }
        frames
    }

    /// Frame left without its blank-line terminator at end of body.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let frame = std::mem::take(&mut self.buffer);
        parse_frame(&frame)
    }
}

fn parse_frame(frame: &str) -> Option<SseFrame> {
    let data: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();
    if data.is_empty() {
        return None;
    }

    let payload = data.join("\n");
    if payload == "[DONE]" {
        Some(SseFrame::Done)
    } else {
        Some(SseFrame::Data(payload))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn frames_split_across_chunks() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b"data: {\"a\":1}\r\n").is_empty());
        assert_eq!(
            parser.feed(b"\r\n: keep-alive\n\ndata: [DONE]\n\n"),
            vec![SseFrame::Data("{\"a\":1}".to_string()), SseFrame::Done]
        );
    }

    #[test]
    fn trailing_frame_is_drained_on_finish() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b"data: {\"b\":2}").is_empty());
        assert_eq!(
            parser.finish(),
            Some(SseFrame::Data("{\"b\":2}".to_string()))
        );
        assert_eq!(parser.finish(), None);
    }
}
