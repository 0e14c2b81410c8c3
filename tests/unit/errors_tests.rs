/*!
 * Tests for error types and conversions
 */

use pptxlate::errors::{AppError, JobError, ServiceError};

#[test]
fn test_serviceError_requestFailed_shouldDisplayCorrectly() {
    let error = ServiceError::RequestFailed("Connection timeout".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Request failed"));
    assert!(display.contains("Connection timeout"));
}

#[test]
fn test_serviceError_parseError_shouldDisplayCorrectly() {
    let error = ServiceError::ParseError("Invalid JSON".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Failed to parse server response"));
    assert!(display.contains("Invalid JSON"));
}

#[test]
fn test_serviceError_apiError_shouldDisplayStatusAndDetail() {
    let error = ServiceError::ApiError {
        status_code: 422,
        detail: "Unsupported file type".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("422"));
    assert!(display.contains("Unsupported file type"));
}

#[test]
fn test_serviceError_connectionError_shouldDisplayCorrectly() {
    let error = ServiceError::ConnectionError("Host unreachable".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Connection error"));
    assert!(display.contains("Host unreachable"));
}

#[test]
fn test_serviceError_invalidBaseUrl_shouldDisplayCorrectly() {
    let error = ServiceError::InvalidBaseUrl("not a url".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Invalid base URL"));
    assert!(display.contains("not a url"));
}

#[test]
fn test_jobError_authenticationRequired_shouldNameTheProvider() {
    let error = JobError::AuthenticationRequired {
        provider: "ChatGPT".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("ChatGPT"));
    assert!(display.contains("API key"));
}

#[test]
fn test_jobError_emptyBatch_shouldDisplayCorrectly() {
    let error = JobError::EmptyBatch;
    let display = format!("{}", error);
    assert!(display.contains("No blocks selected"));
}

#[test]
fn test_jobError_translationFailed_shouldCarryServerDetail() {
    let error = JobError::TranslationFailed {
        detail: "model not loaded".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("Translation failed"));
    assert!(display.contains("model not loaded"));
}

#[test]
fn test_jobError_interrupted_shouldDisplayAttemptsAndProgress() {
    let error = JobError::Interrupted {
        attempts: 3,
        completed: 7,
        total: 12,
    };
    let display = format!("{}", error);
    assert!(display.contains("3 attempts"));
    assert!(display.contains("7/12"));
}

#[test]
fn test_appError_fromServiceError_shouldWrapCorrectly() {
    let service_error = ServiceError::RequestFailed("Test error".to_string());
    let app_error: AppError = service_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Service error"));
    assert!(display.contains("Test error"));
}

#[test]
fn test_appError_fromJobError_shouldWrapCorrectly() {
    let job_error = JobError::EmptyBatch;
    let app_error: AppError = job_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Job error"));
}

#[test]
fn test_appError_fromIoError_shouldBecomeFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pptx");
    let app_error: AppError = io_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("File error"));
    assert!(display.contains("missing.pptx"));
}

#[test]
fn test_jobError_equality_shouldCompareVariantsAndFields() {
    assert_eq!(JobError::EmptyBatch, JobError::EmptyBatch);
    assert_ne!(
        JobError::TranslationFailed {
            detail: "a".to_string()
        },
        JobError::TranslationFailed {
            detail: "b".to_string()
        }
    );
}
