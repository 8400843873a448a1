//! Frame reassembly for the server-sent-event wire format.
//!
//! Chunks arrive with arbitrary boundaries; frames are delimited by a blank
//! line. The buffer is kept as raw bytes and a frame is decoded as text only
//! once its trailing delimiter has been seen, so a multi-byte character split
//! across two chunks is never mis-decoded (the delimiter bytes cannot occur
//! inside a UTF-8 continuation sequence).

use tracing::warn;

/// Incremental frame reassembler.
///
/// `feed` returns the `data` payloads of every frame completed by the given
/// chunk, in order. Frames without a `data:` line are dropped silently, and
/// an unterminated trailing frame is discarded when the stream ends.
#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and extracts every frame payload it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf) {
            let frame_bytes = self.buf[..idx].to_vec();
            self.buf.drain(..idx + delim_len);
            if let Some(payload) = parse_frame_data(&frame_bytes) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Number of buffered bytes awaiting a delimiter.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

fn find_frame_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buf.len()
            && buf[i] == b'\r'
            && buf[i + 1] == b'\n'
            && buf[i + 2] == b'\r'
            && buf[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

/// Extracts the joined `data:` payload of one complete frame, or `None` when
/// the frame carries no data line.
fn parse_frame_data(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => {
            warn!(error = %e, "frame contained invalid UTF-8, decoding lossily");
            String::from_utf8_lossy(bytes).into_owned()
        }
    };
    let mut data_lines: Vec<&str> = Vec::new();
    for raw_line in text.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim_start());
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    Some(data_lines.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_frames_across_arbitrary_chunk_boundaries() {
        let wire = b"data: {\"status\":\"started\"}\n\ndata: {\"status\":\"fetching\"}\n\n";
        for split in 0..wire.len() {
            let mut decoder = SseDecoder::new();
            let mut payloads = decoder.feed(&wire[..split]);
            payloads.extend(decoder.feed(&wire[split..]));
            assert_eq!(
                payloads,
                vec![
                    "{\"status\":\"started\"}".to_string(),
                    "{\"status\":\"fetching\"}".to_string(),
                ],
                "split at byte {split}"
            );
        }
    }

    #[test]
    fn multi_byte_character_split_across_chunks_decodes_intact() {
        let wire = "data: {\"detail\":\"crème brûlée\"}\n\n".as_bytes();
        // Split inside the two-byte 'è' of "crème".
        let idx = wire
            .windows(2)
            .position(|w| w == "è".as_bytes())
            .expect("è present")
            + 1;
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&wire[..idx]).is_empty());
        let payloads = decoder.feed(&wire[idx..]);
        assert_eq!(payloads, vec!["{\"detail\":\"crème brûlée\"}".to_string()]);
    }

    #[test]
    fn split_inside_crlf_delimiter_still_yields_one_frame() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"a\":1}\r\n\r").is_empty());
        let payloads = decoder.feed(b"\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn frame_without_data_prefix_is_dropped() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"event: ping\n\ndata: {\"a\":1}\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn comment_frames_are_ignored() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b": keep-alive\n\n").is_empty());
    }

    #[test]
    fn unterminated_trailer_stays_buffered_and_is_never_emitted() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"a\":1}\n\ndata: {\"partial\":");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string()]);
        assert!(decoder.pending_len() > 0);
        // The stream ends here; the remainder is simply dropped with the
        // decoder.
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: line-one\ndata: line-two\n\n");
        assert_eq!(payloads, vec!["line-one\nline-two".to_string()]);
    }
}
