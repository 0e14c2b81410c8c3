/*!
 * Document endpoints: health, extraction, the translation stream, apply
 * and export.
 */

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use log::{debug, info};
use reqwest::header;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::api::ApiClient;
use crate::app_config::{BilingualLayout, CorrectionStyle, TranslationMode};
use crate::blocks::TextBlock;
use crate::errors::ServiceError;
use crate::language_utils::LanguageSummary;
use crate::translation::{ByteStream, StreamRequest, StreamTransport};

const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Payload of the extract endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub blocks: Vec<TextBlock>,

    /// Detected document languages, feeds language auto-selection
    #[serde(default)]
    pub language_summary: Option<LanguageSummary>,

    #[serde(default)]
    pub slide_width: Option<f64>,

    #[serde(default)]
    pub slide_height: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: String,
}

// Newer backends answer apply with this envelope instead of the file body
#[derive(Debug, Deserialize)]
struct ApplyEnvelope {
    #[serde(default)]
    filename: String,
    download_url: String,
}

/// Input of the apply endpoint
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    /// Original upload name, echoed into the multipart part
    pub file_name: String,
    /// Raw bytes of the original presentation
    pub file_data: Vec<u8>,
    /// Edited blocks, already resolved for the active mode
    pub blocks: Vec<TextBlock>,
    pub mode: TranslationMode,
    /// Slide layout, only sent in bilingual mode
    pub bilingual_layout: BilingualLayout,
    /// Styling colors, only sent in correction mode
    pub correction: CorrectionStyle,
    /// Font substitution table forwarded verbatim
    pub font_mapping: Option<Map<String, Value>>,
    pub target_language: String,
}

/// Finished document returned by apply
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// Server-side file name when the backend reported one
    pub filename: Option<String>,
    /// The rebuilt presentation
    pub data: Bytes,
}

/// Formats of the export endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Xlsx,
    Txt,
}

impl ExportFormat {
    /// File extension, doubles as the URL path segment
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Txt => "txt",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "xlsx" => Ok(Self::Xlsx),
            "txt" => Ok(Self::Txt),
            _ => Err(anyhow::anyhow!("Invalid export format: {}", s)),
        }
    }
}

impl ApiClient {
    /// Connectivity pre-flight against the backend
    pub async fn health(&self) -> Result<(), ServiceError> {
        let response = self.client.get(self.endpoint("/health")).send().await?;
        let response = Self::ensure_success(response).await?;
        let payload: HealthResponse = response.json().await?;
        if payload.status != "ok" {
            return Err(ServiceError::RequestFailed(format!(
                "Backend health check answered with status '{}'",
                payload.status
            )));
        }
        Ok(())
    }

    /// Upload a presentation and extract its text blocks
    pub async fn extract(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<ExtractResponse, ServiceError> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(PPTX_MIME)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("/api/pptx/extract"))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let extracted: ExtractResponse = response.json().await?;
        info!("Extracted {} text blocks", extracted.blocks.len());
        Ok(extracted)
    }

    /// Ask the backend to rebuild the presentation with the edited blocks.
    ///
    /// Two backend revisions exist: one streams the finished file directly,
    /// the newer one answers with a JSON envelope pointing at a download
    /// URL. The response Content-Type decides which path applies.
    pub async fn apply(&self, request: ApplyRequest) -> Result<ApplyOutcome, ServiceError> {
        let blocks_json = serde_json::to_string(&request.blocks)
            .map_err(|error| ServiceError::ParseError(error.to_string()))?;

        let part = Part::bytes(request.file_data)
            .file_name(request.file_name.clone())
            .mime_str(PPTX_MIME)?;
        let mut form = Form::new()
            .part("file", part)
            .text("blocks", blocks_json)
            .text("mode", request.mode.to_string())
            .text("target_language", request.target_language.clone());
        if request.mode == TranslationMode::Bilingual {
            form = form.text("bilingual_layout", request.bilingual_layout.to_string());
        }
        if request.mode == TranslationMode::Correction {
            form = form
                .text("fill_color", request.correction.fill_color.clone())
                .text("text_color", request.correction.text_color.clone())
                .text("line_color", request.correction.line_color.clone())
                .text("line_dash", request.correction.line_dash.clone());
        }
        if let Some(font_mapping) = &request.font_mapping {
            let mapping_json = serde_json::to_string(font_mapping)
                .map_err(|error| ServiceError::ParseError(error.to_string()))?;
            form = form.text("font_mapping", mapping_json);
        }

        let response = self
            .client
            .post(self.endpoint("/api/pptx/apply"))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let envelope: ApplyEnvelope = response.json().await?;
            debug!("Apply produced '{}', downloading it", envelope.filename);
            let data = self.download(&envelope.download_url).await?;
            let filename = if envelope.filename.is_empty() {
                None
            } else {
                Some(envelope.filename)
            };
            Ok(ApplyOutcome { filename, data })
        } else {
            let data = response.bytes().await?;
            Ok(ApplyOutcome {
                filename: None,
                data,
            })
        }
    }

    /// Fetch a finished file by its server-relative download URL
    pub async fn download(&self, download_url: &str) -> Result<Bytes, ServiceError> {
        let response = self.client.get(self.endpoint(download_url)).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?)
    }

    /// Export blocks to a tabular or plain-text document
    pub async fn export(
        &self,
        format: ExportFormat,
        blocks: &[TextBlock],
    ) -> Result<Bytes, ServiceError> {
        let response = self
            .client
            .post(self.endpoint(&format!("/api/export/{}", format.extension())))
            .json(&json!({ "blocks": blocks }))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl StreamTransport for ApiClient {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ServiceError> {
        let blocks_json = serde_json::to_string(&request.blocks)
            .map_err(|error| ServiceError::ParseError(error.to_string()))?;
        let params = &request.params;

        let mut form = Form::new()
            .text("blocks", blocks_json)
            .text("source_language", params.source_language.clone())
            .text("secondary_language", params.secondary_language.clone())
            .text("target_language", params.target_language.clone())
            .text("mode", params.mode.to_string())
            .text("use_tm", params.use_tm.to_string())
            .text("provider", params.provider.to_lowercase_string())
            .text("ollama_fast_mode", params.fast_mode.to_string());
        if let Some(model) = &params.model {
            form = form.text("model", model.clone());
        }
        if let Some(api_key) = &params.api_key {
            form = form.text("api_key", api_key.clone());
        }
        if let Some(base_url) = &params.base_url {
            form = form.text("base_url", base_url.clone());
        }
        if !request.completed_ids.is_empty() {
            let ids_json = serde_json::to_string(&request.completed_ids)
                .map_err(|error| ServiceError::ParseError(error.to_string()))?;
            form = form.text("completed_ids", ids_json);
        }
        if params.refresh {
            form = form.text("refresh", "true");
        }

        info!(
            "Opening translation stream (attempt {}, {} blocks, {} already confirmed)",
            request.attempt,
            request.blocks.len(),
            request.completed_ids.len()
        );
        let response = self
            .client
            .post(self.endpoint("/api/pptx/translate-stream"))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ServiceError::from));
        Ok(Box::pin(stream))
    }
}
