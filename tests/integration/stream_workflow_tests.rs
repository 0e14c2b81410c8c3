/*!
 * Integration tests for the streaming translation workflow
 *
 * These tests run the full path from a server extraction payload through
 * the coordinator's retry loop into the shared block store, with stream
 * bytes fragmented the way a real connection delivers them.
 */

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use parking_lot::RwLock;
use pptxlate::api::ExtractResponse;
use pptxlate::app_config::{Config, StreamRetryConfig};
use pptxlate::blocks::{BlockStore, ReplaceOptions};
use pptxlate::translation::{
    JobStatus, SharedBlockStore, StreamCoordinator, TranslateRequest,
};

use crate::common::mock_stream::{MockStreamTransport, ScriptedAttempt};
use crate::common::init_logging;

/// Extraction payload as the backend sends it, with server identities
fn extraction_payload() -> &'static str {
    r#"{
        "blocks": [
            {"_uid": "s1-t1", "source_text": "Welcome", "slide_index": 0, "shape_id": 3, "block_type": "textbox"},
            {"_uid": "s1-t2", "source_text": "Quarterly results", "slide_index": 0, "shape_id": 4, "block_type": "textbox"},
            {"_uid": "s2-n1", "source_text": "Speaker notes", "slide_index": 1, "block_type": "notes"}
        ],
        "language_summary": {"primary": "en", "secondary": "vi"}
    }"#
}

fn load_store_from_extraction() -> SharedBlockStore {
    let extracted: ExtractResponse = serde_json::from_str(extraction_payload()).unwrap();
    let mut store = BlockStore::new();
    store.replace_all(extracted.blocks);
    Arc::new(RwLock::new(store))
}

/// Test that a server extraction adopts its identities into the store
#[test]
fn test_extraction_withServerUids_shouldAdoptThemAsIdentities() {
    let extracted: ExtractResponse = serde_json::from_str(extraction_payload()).unwrap();
    assert_eq!(
        extracted.language_summary.as_ref().and_then(|s| s.primary.as_deref()),
        Some("en")
    );

    let store = load_store_from_extraction();
    let store = store.read();

    assert_eq!(store.len(), 3);
    assert!(store.get("s1-t1").is_some());
    assert!(store.get("s2-n1").is_some());
    assert_eq!(store.selected_count(), 3);
    assert_eq!(store.get("s1-t1").unwrap().source_text, "Welcome");
}

/// Test a full translation round that survives a connection drop.
///
/// The first connection confirms one block and dies. The reconnect carries
/// that block as its resume hint, streams the rest in fragments and ends
/// with the complete record.
#[tokio::test]
async fn test_workflow_withConnectionDrop_shouldResumeAndFinish() {
    init_logging();
    let store = load_store_from_extraction();

    let complete_data = r#"{"blocks": [
        {"client_id": "s1-t1", "translated_text": "歡迎"},
        {"client_id": "s1-t2", "translated_text": "季度業績"},
        {"client_id": "s2-n1", "translated_text": "演講者備註"}
    ], "warning": null}"#;
    let complete_bytes = format!("event: complete\ndata: {}\n\n", complete_data.replace('\n', " "));
    // Cut the complete record mid-payload to force reassembly
    let (complete_head, complete_tail) = complete_bytes.split_at(40);

    let script = vec![
        // First connection: one block confirmed, then the link dies with a
        // half-delivered record in the buffer
        ScriptedAttempt::Stream(vec![
            Ok(Bytes::from(
                "event: progress\ndata: {\"completed_ids\":[\"s1-t1\"]}\n\n",
            )),
            Ok(Bytes::from("event: progress\ndata: {\"comp")),
            Err(pptxlate::errors::ServiceError::ConnectionError(
                "connection reset by peer".to_string(),
            )),
        ]),
        // Reconnect: remaining blocks confirmed, then the fragmented
        // complete record
        ScriptedAttempt::Stream(vec![
            Ok(Bytes::from(
                "event: progress\ndata: {\"completed_ids\":[\"s1-t2\",\"s2-n1\"]}\n\n",
            )),
            Ok(Bytes::from(complete_head.to_string())),
            Ok(Bytes::from(complete_tail.to_string())),
        ]),
    ];

    let transport = MockStreamTransport::new(script);
    let tracker = transport.tracker();
    let coordinator = StreamCoordinator::new(transport, Arc::clone(&store)).with_retry(
        StreamRetryConfig {
            max_attempts: 3,
            backoff_ms: 1,
        },
    );

    let reports: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let job = coordinator
        .translate_all(
            TranslateRequest::from_config(&Config::default()),
            move |done, total| {
                sink.lock().unwrap().push((done, total));
            },
        )
        .await
        .unwrap();

    // The job completed on the second connection
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.attempts(), 2);
    assert_eq!(job.confirmed_count(), 3);
    assert!(job.warning().is_none());

    // The reconnect carried the confirmed block as its resume hint
    {
        let tracker = tracker.lock().unwrap();
        assert_eq!(tracker.call_count, 2);
        assert_eq!(
            tracker.completed_ids,
            vec![Vec::new(), vec!["s1-t1".to_string()]]
        );
        assert_eq!(
            tracker.last_submitted,
            vec![
                "s1-t1".to_string(),
                "s1-t2".to_string(),
                "s2-n1".to_string()
            ]
        );
    }

    // Every translation landed on its block and nothing is left in flight
    let store = store.read();
    assert_eq!(store.get("s1-t1").unwrap().translated_text, "歡迎");
    assert_eq!(store.get("s1-t2").unwrap().translated_text, "季度業績");
    assert_eq!(store.get("s2-n1").unwrap().translated_text, "演講者備註");
    assert_eq!(store.translating_count(), 0);
    assert_eq!(store.translated_count(), 3);

    // Progress moved monotonically from nothing to everything
    let reports = reports.lock().unwrap();
    assert_eq!(reports.first(), Some(&(0, 3)));
    assert_eq!(reports.last(), Some(&(3, 3)));
    assert!(reports.windows(2).all(|pair| pair[0].0 <= pair[1].0));
}

/// Test the post-translation cleanup pass over translated text
#[tokio::test]
async fn test_workflow_withReplacePass_shouldFixTerminologyAfterTranslation() {
    let store = load_store_from_extraction();

    let script = vec![ScriptedAttempt::Stream(vec![Ok(Bytes::from(
        "event: complete\ndata: {\"blocks\":[\
         {\"client_id\":\"s1-t1\",\"translated_text\":\"Willkommen bei Acme Inc.\"},\
         {\"client_id\":\"s1-t2\",\"translated_text\":\"Quartalszahlen der Acme Inc.\"},\
         {\"client_id\":\"s2-n1\",\"translated_text\":\"Notizen\"}]}\n\n",
    ))])];

    let transport = MockStreamTransport::new(script);
    let coordinator = StreamCoordinator::new(transport, Arc::clone(&store)).with_retry(
        StreamRetryConfig {
            max_attempts: 3,
            backoff_ms: 1,
        },
    );

    let job = coordinator
        .translate_all(TranslateRequest::from_config(&Config::default()), |_, _| {})
        .await
        .unwrap();
    assert_eq!(job.status(), JobStatus::Completed);

    // The cleanup pass normalizes the company name everywhere
    let changed = store
        .write()
        .batch_replace("Acme Inc.", "Acme GmbH", &ReplaceOptions::default())
        .unwrap();
    assert_eq!(changed, 2);

    let store = store.read();
    assert_eq!(
        store.get("s1-t1").unwrap().translated_text,
        "Willkommen bei Acme GmbH"
    );
    assert_eq!(
        store.get("s2-n1").unwrap().translated_text,
        "Notizen"
    );
}

/// Test that a failed job leaves the store consistent for a later retry
#[tokio::test]
async fn test_workflow_withExhaustedRetries_shouldLeaveStoreConsistent() {
    init_logging();
    let store = load_store_from_extraction();

    let script = vec![
        ScriptedAttempt::Stream(vec![
            Ok(Bytes::from(
                "event: progress\ndata: {\"completed_ids\":[\"s1-t1\"]}\n\n",
            )),
            Err(pptxlate::errors::ServiceError::ConnectionError(
                "reset".to_string(),
            )),
        ]),
        ScriptedAttempt::OpenFailure("refused".to_string()),
        ScriptedAttempt::OpenFailure("refused".to_string()),
    ];

    let transport = MockStreamTransport::new(script);
    let coordinator = StreamCoordinator::new(transport, Arc::clone(&store)).with_retry(
        StreamRetryConfig {
            max_attempts: 3,
            backoff_ms: 1,
        },
    );

    let job = coordinator
        .translate_all(TranslateRequest::from_config(&Config::default()), |_, _| {})
        .await
        .unwrap();

    assert_eq!(job.status(), JobStatus::Interrupted);
    assert_eq!(job.attempts(), 3);
    assert_eq!(job.confirmed_count(), 1);

    // Nothing is stuck in flight and the partial confirmation is visible,
    // so a follow-up job can resume from a clean store
    let store = store.read();
    assert_eq!(store.translating_count(), 0);
    assert!(job.is_confirmed("s1-t1"));
    assert_eq!(store.selected_count(), 3);
}
