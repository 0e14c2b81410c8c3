/*!
 * Streaming job coordinator.
 *
 * Runs one translation job at a time: it snapshots the selected blocks,
 * opens the backend event stream and folds progress records into a
 * monotonically growing confirmed set. Dropped connections are retried a
 * bounded number of times, each retry carrying the confirmed set as a
 * resume hint. Store writes always merge by block identity and touch only
 * the fields the coordinator owns (translated text, in-flight flag,
 * update timestamp), leaving concurrent edits to other fields intact.
 */

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use log::{debug, info, trace, warn};
use parking_lot::RwLock;

use crate::app_config::{Config, LlmProvider, StreamRetryConfig, TranslationMode};
use crate::blocks::{BlockStore, TextBlock};
use crate::errors::{JobError, ServiceError};
use crate::translation::job::TranslationJob;
use crate::translation::protocol::{CompletePayload, ProgressPayload, StreamEvent};
use crate::translation::sse::{RawEvent, SseDecoder};

/// Byte stream of one open translation connection
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ServiceError>> + Send>>;

/// Block store shared between the coordinator and the rest of the application
pub type SharedBlockStore = Arc<RwLock<BlockStore>>;

// @struct: routing parameters for one translation job
#[derive(Debug, Clone)]
pub struct TranslateRequest {
    // @field: source language code, "auto" lets the backend detect it
    pub source_language: String,
    // @field: secondary source language for mixed-language documents
    pub secondary_language: String,
    // @field: target language code
    pub target_language: String,
    // @field: operating mode forwarded to the backend
    pub mode: TranslationMode,
    // @field: whether the backend should consult its translation memory
    pub use_tm: bool,
    // @field: LLM provider identifier
    pub provider: LlmProvider,
    // @field: model override, None lets the backend pick its default
    pub model: Option<String>,
    // @field: provider credential, required by non-local providers
    pub api_key: Option<String>,
    // @field: provider service URL override
    pub base_url: Option<String>,
    // @field: trade quality for speed where the provider supports it
    pub fast_mode: bool,
    // @field: bypass cached translations server-side
    pub refresh: bool,
}

impl TranslateRequest {
    /// Build routing parameters from the application config
    pub fn from_config(config: &Config) -> Self {
        let translation = &config.translation;
        TranslateRequest {
            source_language: config.source_language.clone(),
            secondary_language: config.secondary_language.clone(),
            target_language: config.target_language.clone(),
            mode: config.mode,
            use_tm: translation.use_tm,
            provider: translation.provider,
            model: non_empty(translation.get_model()),
            api_key: non_empty(translation.get_api_key()),
            base_url: non_empty(translation.get_base_url()),
            fast_mode: translation.get_fast_mode(),
            refresh: false,
        }
    }

    #[allow(dead_code)] // API surface for library consumers
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}

/// One attempt's wire request: the batch, the routing and the resume hint
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Blocks submitted for translation, in store order
    pub blocks: Vec<TextBlock>,
    /// Routing parameters, identical across attempts of a job
    pub params: TranslateRequest,
    /// Identifiers confirmed by prior attempts, for the server to skip
    pub completed_ids: Vec<String>,
    /// Attempt number starting at 1, for logging
    pub attempt: u32,
}

/// Connection seam between the coordinator and the backend. Tests script
/// streams through this trait without touching a network.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ServiceError>;
}

// Lets a shared client serve the coordinator and direct endpoint calls at once
#[async_trait]
impl<T: StreamTransport + ?Sized> StreamTransport for Arc<T> {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ServiceError> {
        (**self).open_stream(request).await
    }
}

// Outcome of a single connection attempt
enum AttemptOutcome {
    /// Terminal complete record processed
    Completed,
    /// The server pushed an error record with this detail
    ServerError(String),
    /// Connection failed or dropped mid-stream
    Transport(ServiceError),
    /// Stream ended cleanly without a complete record
    Incomplete,
    /// A newer job took over mid-stream
    Superseded,
}

// @struct: runs streaming translation jobs against a shared block store
pub struct StreamCoordinator<T: StreamTransport> {
    transport: T,
    store: SharedBlockStore,
    retry: StreamRetryConfig,
    // @field: bumped by every submission; a stale run stops merging once it moves
    epoch: AtomicU64,
}

impl<T: StreamTransport> StreamCoordinator<T> {
    pub fn new(transport: T, store: SharedBlockStore) -> Self {
        StreamCoordinator {
            transport,
            store,
            retry: StreamRetryConfig::default(),
            epoch: AtomicU64::new(0),
        }
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: StreamRetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Run one translation job over the currently selected blocks.
    ///
    /// Returns Err only for pre-flight failures (nothing selected, missing
    /// credentials). Once a connection is attempted the outcome travels in
    /// the returned job's status, so callers always get the partial
    /// progress back. The progress callback receives
    /// (confirmed count, submitted count) after every merge.
    pub async fn translate_all<F>(
        &self,
        params: TranslateRequest,
        on_progress: F,
    ) -> Result<TranslationJob, JobError>
    where
        F: Fn(usize, usize) + Send + 'static,
    {
        if params.provider.requires_api_key() && params.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(JobError::AuthenticationRequired {
                provider: params.provider.display_name().to_string(),
            });
        }

        let submitted: Vec<TextBlock> = self.store.read().selected_blocks();
        if submitted.is_empty() {
            return Err(JobError::EmptyBatch);
        }

        // Taking the epoch supersedes any job still running
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let ids: Vec<String> = submitted.iter().map(|block| block.client_id.clone()).collect();
        let mut job = TranslationJob::new(ids);

        info!(
            "Starting translation job {} with {} blocks via {}",
            job.id(),
            job.total(),
            params.provider.display_name()
        );

        self.store.write().mark_translating(job.submitted_ids());
        on_progress(0, job.total());

        let mut last_outcome = AttemptOutcome::Incomplete;
        while job.attempts() < self.retry.max_attempts {
            if job.attempts() > 0 {
                debug!("Waiting {} ms before reconnecting", self.retry.backoff_ms);
                tokio::time::sleep(Duration::from_millis(self.retry.backoff_ms)).await;
                if !self.is_current(epoch) {
                    debug!("Job {} superseded during backoff", job.id());
                    return Ok(job);
                }
                info!(
                    "Reconnecting stream for job {} (attempt {}/{}, {}/{} confirmed)",
                    job.id(),
                    job.attempts() + 1,
                    self.retry.max_attempts,
                    job.confirmed_count(),
                    job.total()
                );
            }
            job.record_attempt();

            match self
                .run_attempt(epoch, &params, &submitted, &mut job, &on_progress)
                .await
            {
                AttemptOutcome::Completed => {
                    job.mark_completed();
                    on_progress(job.confirmed_count(), job.total());
                    info!(
                        "Translation job {} completed after {} attempt(s)",
                        job.id(),
                        job.attempts()
                    );
                    return Ok(job);
                }
                AttemptOutcome::Superseded => {
                    debug!("Job {} superseded, abandoning stream", job.id());
                    return Ok(job);
                }
                outcome => last_outcome = outcome,
            }
        }

        let attempts = job.attempts();
        let completed = job.confirmed_count();
        let total = job.total();
        if self.is_current(epoch) {
            self.store.write().clear_translating();
        }
        match last_outcome {
            AttemptOutcome::ServerError(detail) => {
                warn!(
                    "Translation job {} failed after {} attempts: {}",
                    job.id(),
                    attempts,
                    detail
                );
                job.mark_failed(JobError::TranslationFailed { detail });
            }
            _ => {
                warn!(
                    "Translation job {} interrupted after {} attempts, {}/{} blocks confirmed",
                    job.id(),
                    attempts,
                    completed,
                    total
                );
                job.mark_interrupted(JobError::Interrupted {
                    attempts,
                    completed,
                    total,
                });
            }
        }
        Ok(job)
    }

    /// Open one connection and consume it until a terminal record, an error
    /// or end of stream
    async fn run_attempt<F>(
        &self,
        epoch: u64,
        params: &TranslateRequest,
        blocks: &[TextBlock],
        job: &mut TranslationJob,
        on_progress: &F,
    ) -> AttemptOutcome
    where
        F: Fn(usize, usize) + Send + 'static,
    {
        let request = StreamRequest {
            blocks: blocks.to_vec(),
            params: params.clone(),
            completed_ids: job.resume_hint(),
            attempt: job.attempts(),
        };

        let mut stream = match self.transport.open_stream(&request).await {
            Ok(stream) => stream,
            Err(error) => {
                warn!("Opening translation stream failed: {}", error);
                return AttemptOutcome::Transport(error);
            }
        };

        let mut decoder = SseDecoder::new();
        while let Some(chunk) = stream.next().await {
            if !self.is_current(epoch) {
                return AttemptOutcome::Superseded;
            }
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => {
                    warn!("Translation stream dropped: {}", error);
                    return AttemptOutcome::Transport(error);
                }
            };
            trace!("Stream chunk of {} bytes", chunk.len());
            if let Some(outcome) = self.apply_records(epoch, decoder.push(&chunk), job, on_progress)
            {
                return outcome;
            }
        }

        // A final record is still valid without its trailing blank line
        if let Some(outcome) = self.apply_records(epoch, decoder.finish(), job, on_progress) {
            return outcome;
        }

        debug!(
            "Stream ended without a complete record ({}/{} confirmed)",
            job.confirmed_count(),
            job.total()
        );
        AttemptOutcome::Incomplete
    }

    /// Dispatch decoded records. Returns Some when the attempt is over.
    fn apply_records<F>(
        &self,
        epoch: u64,
        records: Vec<RawEvent>,
        job: &mut TranslationJob,
        on_progress: &F,
    ) -> Option<AttemptOutcome>
    where
        F: Fn(usize, usize) + Send + 'static,
    {
        for record in records {
            let Some(event) = StreamEvent::decode(&record) else {
                trace!("Ignoring unrecognized stream record '{}'", record.event);
                continue;
            };
            if !self.is_current(epoch) {
                return Some(AttemptOutcome::Superseded);
            }
            match event {
                StreamEvent::Progress(payload) => {
                    self.merge_progress(&payload, job);
                    on_progress(job.confirmed_count(), job.total());
                }
                StreamEvent::Complete(payload) => {
                    self.merge_complete(payload, job);
                    return Some(AttemptOutcome::Completed);
                }
                StreamEvent::Error { detail } => {
                    warn!("Server reported an error: {}", detail);
                    return Some(AttemptOutcome::ServerError(detail));
                }
            }
        }
        None
    }

    /// Union confirmed ids into the job and drop those blocks' in-flight
    /// flags. Text is untouched here, it only arrives with the complete
    /// record.
    fn merge_progress(&self, payload: &ProgressPayload, job: &mut TranslationJob) {
        let confirmed = payload.resolve_ids(job.submitted_ids());
        if confirmed.is_empty() {
            return;
        }
        let newly = job.confirm(confirmed.iter().cloned());
        {
            let mut store = self.store.write();
            for id in &confirmed {
                store.finish_translating(id);
            }
        }
        debug!(
            "Progress: {} newly confirmed, {}/{} total ({}%)",
            newly,
            job.confirmed_count(),
            job.total(),
            job.percent()
        );
    }

    /// Write the final texts back by identity, falling back to position for
    /// servers that do not echo ids
    fn merge_complete(&self, payload: CompletePayload, job: &mut TranslationJob) {
        if let Some(warning) = &payload.warning {
            warn!("Server warning: {}", warning);
        }

        let mut confirmed: Vec<String> = Vec::with_capacity(payload.blocks.len());
        {
            let mut store = self.store.write();
            for (position, refreshed) in payload.blocks.iter().enumerate() {
                let id = if refreshed.client_id.is_empty() {
                    job.submitted_ids().get(position).cloned()
                } else {
                    Some(refreshed.client_id.clone())
                };
                let Some(id) = id else {
                    debug!("Dropping completed block at position {} with no identity", position);
                    continue;
                };
                store.apply_translation(&id, &refreshed.translated_text);
                confirmed.push(id);
            }
            store.clear_translating();
        }
        job.confirm(confirmed);
        job.set_warning(payload.warning);
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
