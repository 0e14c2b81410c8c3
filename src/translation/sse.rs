/*!
 * Incremental decoder for the server-sent-events line protocol.
 *
 * The translation stream is a chunked HTTP body carrying repeated
 * `event: <name>\ndata: <json>\n\n` records. A single network read may
 * split a record or deliver several at once, so bytes are buffered until
 * a full record (terminated by a blank line) is available. Lines that do
 * not match the `event:`/`data:` shape are ignored, never fatal.
 */

/// One framed record, still undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Event name from the `event:` line
    pub event: String,
    /// Payload text from the `data:` line
    pub data: String,
}

/// Stateful record framer over raw stream bytes
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        SseDecoder { buffer: Vec::new() }
    }

    /// Feed one chunk of bytes, returning every record completed by it.
    /// The trailing partial record stays buffered for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, sep_len)) = find_record_end(&self.buffer) {
            let record: Vec<u8> = self.buffer.drain(..end + sep_len).collect();
            let text = String::from_utf8_lossy(&record[..end]);
            if let Some(event) = parse_record(&text) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is still buffered at end-of-stream. A final record
    /// is valid even when the server closed without a trailing blank line.
    pub fn finish(&mut self) -> Vec<RawEvent> {
        if self.buffer.iter().all(|b| b.is_ascii_whitespace()) {
            self.buffer.clear();
            return Vec::new();
        }

        let remainder = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&remainder);
        text.split("\n\n")
            .filter(|part| !part.trim().is_empty())
            .filter_map(parse_record)
            .collect()
    }

    /// Bytes currently waiting for a record terminator
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Locate the earliest blank-line separator, LF or CRLF framed
fn find_record_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buffer.len() {
        if buffer[i] == b'\n' && buffer[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if buffer[i] == b'\r'
            && i + 3 < buffer.len()
            && buffer[i + 1] == b'\n'
            && buffer[i + 2] == b'\r'
            && buffer[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

/// Extract the first `event:` and `data:` lines of a record.
/// Returns None when either is missing, which drops the record silently.
fn parse_record(record: &str) -> Option<RawEvent> {
    let mut event = None;
    let mut data = None;

    for line in record.lines() {
        if let Some(rest) = line.strip_prefix("event: ") {
            if event.is_none() {
                event = Some(rest.to_string());
            }
        } else if let Some(rest) = line.strip_prefix("data: ") {
            if data.is_none() {
                data = Some(rest.to_string());
            }
        }
    }

    match (event, data) {
        (Some(event), Some(data)) => Some(RawEvent { event, data }),
        _ => None,
    }
}
