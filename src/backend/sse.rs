//! SSE frame decoding
//!
//! Turns an incremental byte stream into discrete `(event, data)` frames.
//! The decoder is protocol-agnostic: it knows the SSE grammar and nothing
//! about what the payloads mean.
//!
//! Frames are delimited by a blank line. Within a frame, an `event:` line
//! names the frame (default "message") and one or more `data:` lines join
//! with newlines to form the payload. Frames whose payload is empty are
//! dropped. Chunk boundaries are arbitrary: they may split a UTF-8
//! sequence, a `data:` line, or the blank-line delimiter, so undecodable
//! trailing bytes stay buffered until the next chunk arrives.

/// One decoded SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental SSE decoder. Feed it chunks, collect frames, then `finish`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes that did not yet decode to complete UTF-8
    raw: Vec<u8>,
    /// Decoded text not yet assembled into a frame
    text: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning all frames it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.raw.extend_from_slice(chunk);
        self.decode_buffered();
        self.drain_frames()
    }

    /// Signal end of stream. A trailing partial frame is flushed if it
    /// carries a non-empty payload.
    pub fn finish(mut self) -> Option<SseFrame> {
        if !self.raw.is_empty() {
            // Stream ended mid-sequence; salvage what is readable
            self.text.push_str(&String::from_utf8_lossy(&self.raw));
            self.raw.clear();
        }

        if self.text.trim().is_empty() {
            return None;
        }

        let frame = parse_frame(&self.text);
        if frame.data.is_empty() {
            None
        } else {
            Some(frame)
        }
    }

    /// Move as many buffered bytes as possible into decoded text, keeping
    /// an incomplete trailing UTF-8 sequence for the next feed.
    fn decode_buffered(&mut self) {
        loop {
            match std::str::from_utf8(&self.raw) {
                Ok(s) => {
                    self.text.push_str(s);
                    self.raw.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.text
                        .push_str(std::str::from_utf8(&self.raw[..valid]).unwrap_or(""));
                    match e.error_len() {
                        // Truly invalid bytes: replace and keep going
                        Some(len) => {
                            self.text.push('\u{FFFD}');
                            self.raw.drain(..valid + len);
                        }
                        // Incomplete trailing sequence: wait for more bytes
                        None => {
                            self.raw.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_frames(&mut self) -> Vec<SseFrame> {
        let mut frames = Vec::new();

        while let Some(idx) = self.text.find("\n\n") {
            let raw_frame = self.text[..idx].to_string();
            self.text.drain(..idx + 2);
            let frame = parse_frame(&raw_frame);
            if !frame.data.is_empty() {
                frames.push(frame);
            }
        }

        frames
    }
}

/// Parse one raw frame's lines into event name and joined data payload.
fn parse_frame(raw: &str) -> SseFrame {
    let mut event = "message".to_string();
    let mut data_parts: Vec<&str> = Vec::new();

    for line in raw.split('\n') {
        if let Some(value) = line.strip_prefix("event:") {
            event = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data_parts.push(value.trim());
        }
    }

    SseFrame {
        event,
        data: data_parts.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<SseFrame> {
        let mut decoder = SseDecoder::new();
        let mut frames = Vec::new();
        for chunk in chunks {
            frames.extend(decoder.feed(chunk));
        }
        frames.extend(decoder.finish());
        frames
    }

    #[test]
    fn test_single_frame() {
        let frames = decode_all(&[b"event: response.done\ndata: {\"ok\":true}\n\n"]);
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "response.done".to_string(),
                data: "{\"ok\":true}".to_string(),
            }]
        );
    }

    #[test]
    fn test_default_event_name() {
        let frames = decode_all(&[b"data: hello\n\n"]);
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "hello");
    }

    #[test]
    fn test_multiple_data_lines_join_with_newline() {
        let frames = decode_all(&[b"data: line one\ndata: line two\n\n"]);
        assert_eq!(frames[0].data, "line one\nline two");
    }

    #[test]
    fn test_empty_data_frame_is_dropped() {
        let frames = decode_all(&[b"event: ping\n\ndata: real\n\n"]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "real");
    }

    #[test]
    fn test_arbitrary_chunk_splits_match_single_chunk() {
        let body: &[u8] =
            b"event: a\ndata: first\n\ndata: second part\n\nevent: b\ndata: third\n\n";

        let whole = decode_all(&[body]);

        // Byte-by-byte delivery
        let bytes: Vec<&[u8]> = body.chunks(1).collect();
        assert_eq!(decode_all(&bytes), whole);

        // Split straddling the blank-line delimiter and the data payload
        for split in [5, 14, 15, 16, 30, body.len() - 1] {
            let halves = [&body[..split], &body[split..]];
            assert_eq!(decode_all(&halves), whole, "split at {}", split);
        }
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let body = "data: caf\u{00e9} \u{65e5}\u{672c}\n\n".as_bytes();

        // Find a split point inside a multi-byte sequence
        let split = body.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let frames = decode_all(&[&body[..split], &body[split..]]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "caf\u{00e9} \u{65e5}\u{672c}");
    }

    #[test]
    fn test_trailing_partial_frame_flushed_on_finish() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: last\ndata: unterminated").is_empty());

        let frame = decoder.finish().unwrap();
        assert_eq!(frame.event, "last");
        assert_eq!(frame.data, "unterminated");
    }

    #[test]
    fn test_finish_without_data_yields_nothing() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"event: only-a-name\n");
        assert!(decoder.finish().is_none());

        let decoder = SseDecoder::new();
        assert!(decoder.finish().is_none());
    }
}
