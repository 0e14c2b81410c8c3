/*!
 * Tests for translation job bookkeeping
 */

use pptxlate::errors::JobError;
use pptxlate::translation::{JobStatus, TranslationJob};

fn job_with_ids(ids: &[&str]) -> TranslationJob {
    TranslationJob::new(ids.iter().map(|id| id.to_string()).collect())
}

/// Test the initial state of a freshly created job
#[test]
fn test_newJob_shouldStartRunningWithNothingConfirmed() {
    let job = job_with_ids(&["a", "b", "c"]);

    assert_eq!(job.status(), JobStatus::Running);
    assert_eq!(job.total(), 3);
    assert_eq!(job.confirmed_count(), 0);
    assert_eq!(job.attempts(), 0);
    assert!(!job.is_terminal());
    assert!(job.failure().is_none());
    assert!(job.warning().is_none());
    assert!(job.finished_at().is_none());
    assert_eq!(job.percent(), 0);
}

/// Test that confirming reports only newly added identifiers
#[test]
fn test_confirm_withOverlappingReports_shouldCountOnlyNewIds() {
    let mut job = job_with_ids(&["a", "b", "c"]);

    assert_eq!(job.confirm(vec!["a".to_string()]), 1);
    // Replay of "a" plus one new id
    assert_eq!(job.confirm(vec!["a".to_string(), "b".to_string()]), 1);
    // Full replay adds nothing
    assert_eq!(job.confirm(vec!["a".to_string(), "b".to_string()]), 0);

    assert_eq!(job.confirmed_count(), 2);
    assert!(job.is_confirmed("a"));
    assert!(job.is_confirmed("b"));
    assert!(!job.is_confirmed("c"));
}

/// Test that the resume hint preserves submission order
#[test]
fn test_resumeHint_withConfirmedSubset_shouldKeepSubmissionOrder() {
    let mut job = job_with_ids(&["first", "second", "third", "fourth"]);

    // Confirm out of order
    job.confirm(vec!["third".to_string(), "first".to_string()]);

    assert_eq!(
        job.resume_hint(),
        vec!["first".to_string(), "third".to_string()]
    );
}

/// Test percentage rounding at awkward ratios
#[test]
fn test_percent_withPartialProgress_shouldRoundToNearestInteger() {
    let mut job = job_with_ids(&["a", "b", "c"]);
    job.confirm(vec!["a".to_string()]);
    // 1/3 rounds to 33
    assert_eq!(job.percent(), 33);

    job.confirm(vec!["b".to_string()]);
    // 2/3 rounds to 67
    assert_eq!(job.percent(), 67);

    job.confirm(vec!["c".to_string()]);
    assert_eq!(job.percent(), 100);

    // Empty batch never divides by zero
    let empty = TranslationJob::new(Vec::new());
    assert_eq!(empty.percent(), 0);
}

/// Test attempt counting
#[test]
fn test_recordAttempt_withRepeatedCalls_shouldAccumulate() {
    let mut job = job_with_ids(&["a"]);

    job.record_attempt();
    job.record_attempt();

    assert_eq!(job.attempts(), 2);
}

/// Test the completed terminal transition
#[test]
fn test_markCompleted_shouldBecomeTerminalWithFinishTime() {
    let mut job = job_with_ids(&["a"]);

    job.mark_completed();

    assert_eq!(job.status(), JobStatus::Completed);
    assert!(job.is_terminal());
    assert!(job.finished_at().is_some());
    assert!(job.finished_at().unwrap() >= job.started_at());
}

/// Test the interrupted terminal transition carries its cause
#[test]
fn test_markInterrupted_shouldKeepFailureDetails() {
    let mut job = job_with_ids(&["a", "b"]);
    job.confirm(vec!["a".to_string()]);

    job.mark_interrupted(JobError::Interrupted {
        attempts: 3,
        completed: 1,
        total: 2,
    });

    assert_eq!(job.status(), JobStatus::Interrupted);
    assert!(job.is_terminal());
    match job.failure() {
        Some(JobError::Interrupted {
            attempts,
            completed,
            total,
        }) => {
            assert_eq!(*attempts, 3);
            assert_eq!(*completed, 1);
            assert_eq!(*total, 2);
        }
        other => panic!("Expected interrupted failure, got {:?}", other),
    }
}

/// Test the failed terminal transition carries the server detail
#[test]
fn test_markFailed_shouldKeepServerDetail() {
    let mut job = job_with_ids(&["a"]);

    job.mark_failed(JobError::TranslationFailed {
        detail: "provider quota exhausted".to_string(),
    });

    assert_eq!(job.status(), JobStatus::Failed);
    match job.failure() {
        Some(JobError::TranslationFailed { detail }) => {
            assert_eq!(detail, "provider quota exhausted");
        }
        other => panic!("Expected translation failure, got {:?}", other),
    }
}

/// Test that the server warning survives on the job
#[test]
fn test_setWarning_shouldBeReadableBack() {
    let mut job = job_with_ids(&["a"]);

    job.set_warning(Some("partial glossary match".to_string()));
    assert_eq!(job.warning(), Some("partial glossary match"));

    job.set_warning(None);
    assert!(job.warning().is_none());
}
