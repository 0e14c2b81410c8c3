/*!
 * Typed events of the translation stream.
 *
 * Raw records decode into one of three events. Progress payloads arrive
 * in two shapes for backward compatibility: a list of confirmed block
 * identifiers (preferred) or a list of zero-based positions into the
 * submitted batch. Both are normalized into identifiers here, at the
 * parser boundary, so the coordinator only ever sees one shape.
 */

use serde::Deserialize;

use crate::blocks::TextBlock;
use crate::translation::sse::RawEvent;

/// Payload of a `progress` record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressPayload {
    /// Confirmed block identifiers
    #[serde(default)]
    pub completed_ids: Option<Vec<String>>,

    /// Legacy fallback: positions into the submitted batch
    #[serde(default)]
    pub completed_indices: Option<Vec<usize>>,

    /// Blocks still waiting server-side, informational only
    #[serde(default)]
    pub total_pending: Option<usize>,
}

impl ProgressPayload {
    /// Normalize the payload into identifiers. Identifier lists win over
    /// positional lists; positions outside the batch are dropped.
    pub fn resolve_ids(&self, submitted: &[String]) -> Vec<String> {
        if let Some(ids) = &self.completed_ids {
            return ids.clone();
        }
        if let Some(indices) = &self.completed_indices {
            return indices
                .iter()
                .filter_map(|&position| submitted.get(position).cloned())
                .collect();
        }
        Vec::new()
    }
}

/// Payload of the terminal `complete` record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletePayload {
    /// Final block list in submission order, translated text filled in
    #[serde(default)]
    pub blocks: Vec<TextBlock>,

    /// Optional server-side notice worth surfacing to the user
    #[serde(default)]
    pub warning: Option<String>,
}

/// Payload of an `error` record
#[derive(Debug, Clone, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    detail: String,
}

/// One decoded stream event
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Incremental completion report
    Progress(ProgressPayload),
    /// Terminal success carrying the full result
    Complete(CompletePayload),
    /// Terminal failure reported by the server
    Error {
        /// Human-readable detail, surfaced verbatim
        detail: String,
    },
}

impl StreamEvent {
    /// Decode a framed record into a typed event. Unknown event names and
    /// undecodable payloads yield None and are skipped by the consumer.
    pub fn decode(raw: &RawEvent) -> Option<StreamEvent> {
        match raw.event.as_str() {
            "progress" => serde_json::from_str::<ProgressPayload>(&raw.data)
                .ok()
                .map(StreamEvent::Progress),
            "complete" => serde_json::from_str::<CompletePayload>(&raw.data)
                .ok()
                .map(StreamEvent::Complete),
            "error" => {
                let detail = serde_json::from_str::<ErrorPayload>(&raw.data)
                    .map(|payload| payload.detail)
                    .ok()
                    .filter(|detail| !detail.is_empty())
                    .unwrap_or_else(|| "Stream reported an error".to_string());
                Some(StreamEvent::Error { detail })
            }
            _ => None,
        }
    }
}
