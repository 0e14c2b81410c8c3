/*!
 * Terminology endpoints: the translation-memory pair (glossary and memory)
 * and the preserve-terms list.
 */

use log::info;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::ApiClient;
use crate::errors::ServiceError;

/// The two translation-memory collections share one wire shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmKind {
    /// Curated term pairs with priorities
    Glossary,
    /// Accumulated sentence pairs from past jobs
    Memory,
}

impl TmKind {
    fn path(&self) -> &'static str {
        match self {
            Self::Glossary => "/api/tm/glossary",
            Self::Memory => "/api/tm/memory",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Glossary => "glossary",
            Self::Memory => "memory",
        }
    }
}

/// One translation-memory row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub source_lang: String,

    #[serde(default)]
    pub target_lang: String,

    #[serde(default)]
    pub source_text: String,

    #[serde(default)]
    pub target_text: String,

    /// Match weight, glossary rows only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TmListResponse {
    #[serde(default)]
    entries: Vec<TmEntry>,
}

/// One preserved term, excluded from translation by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreserveTerm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub term: String,

    #[serde(default)]
    pub category: String,

    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_case_sensitive() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct PreserveTermsResponse {
    #[serde(default)]
    terms: Vec<PreserveTerm>,
}

/// Result of a CSV import
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ImportSummary {
    #[serde(default)]
    pub imported: usize,

    #[serde(default)]
    pub skipped: usize,
}

impl ApiClient {
    pub async fn tm_list(&self, kind: TmKind) -> Result<Vec<TmEntry>, ServiceError> {
        let response = self.client.get(self.endpoint(kind.path())).send().await?;
        let response = Self::ensure_success(response).await?;
        let listed: TmListResponse = response.json().await?;
        Ok(listed.entries)
    }

    /// Insert or update one row, keyed server-side on languages and source
    /// text
    pub async fn tm_upsert(&self, kind: TmKind, entry: &TmEntry) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.endpoint(kind.path()))
            .json(entry)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    pub async fn tm_delete(&self, kind: TmKind, id: i64) -> Result<(), ServiceError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("{}/{}", kind.path(), id)))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Download the collection as CSV text
    pub async fn tm_export_csv(&self, kind: TmKind) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&format!("{}/export", kind.path())))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    /// Upload a CSV file into the collection
    pub async fn tm_import_csv(
        &self,
        kind: TmKind,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<(), ServiceError> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint(&format!("{}/import", kind.path())))
            .multipart(form)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        info!("Imported '{}' into the {} collection", file_name, kind.label());
        Ok(())
    }

    pub async fn preserve_terms(&self) -> Result<Vec<PreserveTerm>, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("/api/preserve-terms"))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let listed: PreserveTermsResponse = response.json().await?;
        Ok(listed.terms)
    }

    pub async fn add_preserve_term(&self, term: &PreserveTerm) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.endpoint("/api/preserve-terms"))
            .json(term)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    pub async fn delete_preserve_term(&self, id: i64) -> Result<(), ServiceError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/api/preserve-terms/{}", id)))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    pub async fn export_preserve_terms(&self) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("/api/preserve-terms/export"))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    /// Import preserve terms from CSV text. The payload travels as JSON,
    /// not as a file part.
    pub async fn import_preserve_terms(
        &self,
        csv_data: &str,
    ) -> Result<ImportSummary, ServiceError> {
        let response = self
            .client
            .post(self.endpoint("/api/preserve-terms/import"))
            .json(&json!({ "csv_data": csv_data }))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }
}
