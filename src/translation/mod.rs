/*!
 * Streaming translation job handling.
 *
 * This module owns the lifecycle of one translation job against the
 * backend's event stream. It is split into several submodules:
 *
 * - `sse`: incremental decoder for the `event:`/`data:` line protocol
 * - `protocol`: typed stream events and payload normalization
 * - `job`: per-job bookkeeping of submitted and confirmed blocks
 * - `coordinator`: the retrying stream consumer that reconciles server
 *   progress onto the block store
 */

// Re-export main types for easier usage
pub use self::coordinator::{
    ByteStream, SharedBlockStore, StreamCoordinator, StreamRequest, StreamTransport,
    TranslateRequest,
};
pub use self::job::{JobStatus, TranslationJob};
pub use self::protocol::{CompletePayload, ProgressPayload, StreamEvent};
pub use self::sse::{RawEvent, SseDecoder};

// Submodules
pub mod coordinator;
pub mod job;
pub mod protocol;
pub mod sse;
