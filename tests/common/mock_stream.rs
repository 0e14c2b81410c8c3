/*!
 * Mock stream transport for coordinator tests
 *
 * Scripts the byte stream of each connection attempt so tests can drive
 * the retry loop without a network. Every request is recorded so tests
 * can assert on resume hints and attempt numbers.
 */

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;

use pptxlate::errors::ServiceError;
use pptxlate::translation::{ByteStream, StreamRequest, StreamTransport};

/// One scripted connection attempt
pub enum ScriptedAttempt {
    /// Opening the connection fails outright
    OpenFailure(String),
    /// The connection opens and yields these chunks in order
    Stream(Vec<Result<Bytes, ServiceError>>),
}

/// Records every stream request the coordinator makes
#[derive(Debug, Default)]
pub struct StreamCallTracker {
    /// Count of open_stream calls made
    pub call_count: usize,
    /// Resume hint carried by each request, in call order
    pub completed_ids: Vec<Vec<String>>,
    /// Attempt number carried by each request
    pub attempts: Vec<u32>,
    /// Block identifiers submitted with the last request
    pub last_submitted: Vec<String>,
}

/// Stream transport replaying scripted attempts in order. Attempts beyond
/// the script yield an empty stream, which the coordinator treats as an
/// incomplete connection.
pub struct MockStreamTransport {
    script: Mutex<VecDeque<ScriptedAttempt>>,
    tracker: Arc<Mutex<StreamCallTracker>>,
}

impl MockStreamTransport {
    /// Create a transport that replays the given attempts
    pub fn new(script: Vec<ScriptedAttempt>) -> Self {
        MockStreamTransport {
            script: Mutex::new(script.into()),
            tracker: Arc::new(Mutex::new(StreamCallTracker::default())),
        }
    }

    /// Get the call tracker
    pub fn tracker(&self) -> Arc<Mutex<StreamCallTracker>> {
        self.tracker.clone()
    }
}

#[async_trait]
impl StreamTransport for MockStreamTransport {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ServiceError> {
        {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.call_count += 1;
            tracker.completed_ids.push(request.completed_ids.clone());
            tracker.attempts.push(request.attempt);
            tracker.last_submitted = request
                .blocks
                .iter()
                .map(|block| block.client_id.clone())
                .collect();
        }

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedAttempt::Stream(Vec::new()));

        match next {
            ScriptedAttempt::OpenFailure(detail) => Err(ServiceError::ConnectionError(detail)),
            ScriptedAttempt::Stream(chunks) => Ok(Box::pin(stream::iter(chunks))),
        }
    }
}

/// Build one framed stream record as raw bytes
pub fn sse_record(event: &str, data: &str) -> Bytes {
    Bytes::from(format!("event: {}\ndata: {}\n\n", event, data))
}

/// Progress record confirming the given block identifiers
pub fn progress_record(ids: &[&str]) -> Bytes {
    let id_list = ids
        .iter()
        .map(|id| format!("\"{}\"", id))
        .collect::<Vec<_>>()
        .join(",");
    sse_record("progress", &format!("{{\"completed_ids\":[{}]}}", id_list))
}

/// Complete record carrying (identifier, translated text) pairs
pub fn complete_record(blocks: &[(&str, &str)]) -> Bytes {
    let block_list = blocks
        .iter()
        .map(|(id, text)| {
            format!(
                "{{\"client_id\":\"{}\",\"translated_text\":\"{}\"}}",
                id, text
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    sse_record("complete", &format!("{{\"blocks\":[{}]}}", block_list))
}

/// Error record with the given detail text
pub fn error_record(detail: &str) -> Bytes {
    sse_record("error", &format!("{{\"detail\":\"{}\"}}", detail))
}
