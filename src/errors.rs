/*!
 * Error types for the pptxlate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to the translation backend over HTTP
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Error when building or sending a request fails
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing a server response fails
    #[error("Failed to parse server response: {0}")]
    ParseError(String),

    /// Error returned by the server itself
    #[error("Server responded with error: {status_code} - {detail}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Detail text extracted from the response body
        detail: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with the configured base URL
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Terminal failures of a streaming translation job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The selected provider needs an API key and none is configured
    #[error("Provider '{provider}' requires an API key, configure one before translating")]
    AuthenticationRequired {
        /// Provider display name
        provider: String,
    },

    /// Nothing to translate
    #[error("No blocks selected for translation")]
    EmptyBatch,

    /// The server reported a failure through the event stream
    #[error("Translation failed: {detail}")]
    TranslationFailed {
        /// Detail string from the server, surfaced verbatim
        detail: String,
    },

    /// The stream ended without completing and retries are exhausted
    #[error("Translation interrupted after {attempts} attempts, {completed}/{total} blocks finished")]
    Interrupted {
        /// Connection attempts made
        attempts: u32,
        /// Blocks confirmed complete
        completed: usize,
        /// Blocks submitted
        total: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration loading or validation
    #[error("Config error: {0}")]
    Config(String),

    /// Error from the backend API
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Error from a translation job
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
