/*!
 * Lifecycle state of one streaming translation job.
 *
 * A job tracks the batch it submitted, the set of blocks the server has
 * confirmed so far, and how many connection attempts were spent. The
 * confirmed set only grows; repeated progress reports are idempotent and
 * the resume hint sent on reconnect is exactly this set.
 */

use std::collections::HashSet;

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::errors::JobError;

// @enum: terminal and non-terminal job states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Stream open or between retry attempts
    Running,
    /// Server sent the terminal complete record
    Completed,
    /// Transport gave out before completion, no explicit server error
    Interrupted,
    /// Server reported an explicit error on the final attempt
    Failed,
}

// @struct: one translation run over a submitted batch
#[derive(Debug, Clone)]
pub struct TranslationJob {
    // @field: unique run identifier, used in logs
    id: Uuid,
    // @field: block identifiers in submission order
    submitted: Vec<String>,
    // @field: identifiers the server has confirmed, monotonic
    confirmed: HashSet<String>,
    // @field: connection attempts spent so far
    attempts: u32,
    status: JobStatus,
    // @field: cause of a terminal Interrupted or Failed status
    failure: Option<JobError>,
    // @field: server-side notice from the complete record
    warning: Option<String>,
    started_at: DateTime<Local>,
    finished_at: Option<DateTime<Local>>,
}

impl TranslationJob {
    pub fn new(submitted: Vec<String>) -> Self {
        TranslationJob {
            id: Uuid::new_v4(),
            submitted,
            confirmed: HashSet::new(),
            attempts: 0,
            status: JobStatus::Running,
            failure: None,
            warning: None,
            started_at: Local::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn submitted_ids(&self) -> &[String] {
        &self.submitted
    }

    pub fn total(&self) -> usize {
        self.submitted.len()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn failure(&self) -> Option<&JobError> {
        self.failure.as_ref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Local>> {
        self.finished_at
    }

    /// Merge confirmed identifiers into the set. Returns how many were
    /// new; replays and overlapping reports add nothing.
    pub fn confirm<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.confirmed.len();
        self.confirmed.extend(ids);
        self.confirmed.len() - before
    }

    pub fn is_confirmed(&self, id: &str) -> bool {
        self.confirmed.contains(id)
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }

    /// Confirmed identifiers in submission order. This is the resume
    /// hint sent on reconnect so the server skips finished blocks.
    pub fn resume_hint(&self) -> Vec<String> {
        self.submitted
            .iter()
            .filter(|id| self.confirmed.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// Completion percentage rounded to the nearest integer
    pub fn percent(&self) -> u32 {
        if self.submitted.is_empty() {
            return 0;
        }
        let ratio = self.confirmed.len() as f64 / self.submitted.len() as f64;
        (ratio * 100.0).round() as u32
    }

    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn is_terminal(&self) -> bool {
        self.status != JobStatus::Running
    }

    pub fn set_warning(&mut self, warning: Option<String>) {
        self.warning = warning;
    }

    pub fn mark_completed(&mut self) {
        self.status = JobStatus::Completed;
        self.finished_at = Some(Local::now());
    }

    pub fn mark_interrupted(&mut self, failure: JobError) {
        self.status = JobStatus::Interrupted;
        self.failure = Some(failure);
        self.finished_at = Some(Local::now());
    }

    pub fn mark_failed(&mut self, failure: JobError) {
        self.status = JobStatus::Failed;
        self.failure = Some(failure);
        self.finished_at = Some(Local::now());
    }
}
