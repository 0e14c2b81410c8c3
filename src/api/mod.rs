/*!
 * HTTP client for the translation backend.
 *
 * One `ApiClient` wraps a shared `reqwest::Client` and the configured base
 * URL. The endpoint groups live in submodules: `documents` (health,
 * extract, apply, export and the translation stream), `terminology`
 * (glossary, translation memory and preserve-terms) and `llm` (model
 * discovery, prompt templates, token statistics).
 */

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use crate::app_config::Config;
use crate::errors::ServiceError;

pub mod documents;
pub mod llm;
pub mod terminology;

pub use self::documents::{ApplyOutcome, ApplyRequest, ExportFormat, ExtractResponse};
pub use self::llm::{TokenStats, TokenUsage};
pub use self::terminology::{ImportSummary, PreserveTerm, TmEntry, TmKind};

/// Longest error-body excerpt surfaced to the user
const MAX_DETAIL_LEN: usize = 300;

static HTML_TITLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Client for the PPTX translation backend
pub struct ApiClient {
    /// Shared HTTP client, no total timeout so streams can run long
    client: Client,
    /// Backend base URL without a trailing slash
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL. The URL is validated here so
    /// a typo fails fast instead of on the first request.
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed)
            .map_err(|error| ServiceError::InvalidBaseUrl(format!("{}: {}", trimmed, error)))?;
        Ok(ApiClient {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(15))
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            base_url: trimmed.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a server-relative path
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Pass 2xx responses through, turn everything else into an ApiError
    /// with friendly detail text
    pub(crate) async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    pub(crate) async fn error_from_response(response: Response) -> ServiceError {
        let status_code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ServiceError::ApiError {
            status_code,
            detail: detail_from_body(status_code, &body),
        }
    }
}

/// Derive user-facing detail text from an error response body. Gateway
/// statuses get fixed messages, HTML pages contribute their title, JSON
/// bodies their `detail` field, anything else its (truncated) text.
pub fn detail_from_body(status_code: u16, body: &str) -> String {
    match status_code {
        502 => return "Translation backend is unreachable (502 Bad Gateway)".to_string(),
        504 => return "Translation backend timed out (504 Gateway Timeout)".to_string(),
        _ => {}
    }

    let trimmed = body.trim();
    if trimmed.starts_with('<') {
        if let Some(title) = html_title(trimmed) {
            return title;
        }
        return format!("Server returned an HTML error page (status {})", status_code);
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            if !detail.trim().is_empty() {
                return truncate_detail(detail.trim());
            }
        }
    }

    if trimmed.is_empty() {
        format!("Request failed with status {}", status_code)
    } else {
        truncate_detail(trimmed)
    }
}

fn html_title(body: &str) -> Option<String> {
    HTML_TITLE_REGEX
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|title| title.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
}

fn truncate_detail(text: &str) -> String {
    if text.chars().count() <= MAX_DETAIL_LEN {
        return text.to_string();
    }
    let excerpt: String = text.chars().take(MAX_DETAIL_LEN).collect();
    format!("{}...", excerpt)
}
