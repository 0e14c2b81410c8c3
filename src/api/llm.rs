/*!
 * LLM-side endpoints: model discovery, prompt templates and token usage
 * statistics.
 */

use log::debug;
use reqwest::multipart::Form;
use serde::Deserialize;
use serde_json::json;

use crate::api::ApiClient;
use crate::app_config::LlmProvider;
use crate::errors::ServiceError;

#[derive(Debug, Default, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PromptResponse {
    #[serde(default)]
    content: String,
}

/// Aggregated token usage for one bucket. The session bucket fills every
/// field, the all-time bucket only the totals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,

    #[serde(default)]
    pub completion_tokens: u64,

    #[serde(default)]
    pub total_tokens: u64,

    #[serde(default)]
    pub estimated_cost_usd: f64,

    #[serde(default)]
    pub request_count: u64,

    #[serde(default)]
    pub models_used: Vec<String>,
}

impl TokenUsage {
    /// One-line human description of the usage counters
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} tokens ({} prompt / {} completion) over {} request(s)",
            self.total_tokens, self.prompt_tokens, self.completion_tokens, self.request_count
        );
        if self.estimated_cost_usd > 0.0 {
            text.push_str(&format!(", estimated ${:.4}", self.estimated_cost_usd));
        }
        if !self.models_used.is_empty() {
            text.push_str(&format!(" via {}", self.models_used.join(", ")));
        }
        text
    }
}

/// Payload of the token-stats endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenStats {
    /// Usage within the current working session
    #[serde(default)]
    pub session: TokenUsage,

    /// Usage accumulated over the backend's lifetime
    #[serde(default)]
    pub all_time: TokenUsage,
}

impl ApiClient {
    /// List the models the given provider offers. Non-local providers need
    /// the API key to answer.
    pub async fn llm_models(
        &self,
        provider: LlmProvider,
        api_key: Option<&str>,
        base_url: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let mut form = Form::new()
            .text("provider", provider.to_lowercase_string())
            .text("base_url", base_url.to_string());
        if let Some(api_key) = api_key {
            form = form.text("api_key", api_key.to_string());
        }

        let response = self
            .client
            .post(self.endpoint("/api/llm/models"))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let listed: ModelsResponse = response.json().await?;
        debug!(
            "Provider {} reports {} models",
            provider.display_name(),
            listed.models.len()
        );
        Ok(listed.models)
    }

    /// Names of the editable prompt templates
    pub async fn prompt_names(&self) -> Result<Vec<String>, ServiceError> {
        let response = self.client.get(self.endpoint("/api/prompts")).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Current content of one prompt template
    pub async fn prompt(&self, name: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/api/prompts/{}", name)))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let payload: PromptResponse = response.json().await?;
        Ok(payload.content)
    }

    pub async fn save_prompt(&self, name: &str, content: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.endpoint(&format!("/api/prompts/{}", name)))
            .json(&json!({ "content": content }))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    pub async fn token_stats(&self) -> Result<TokenStats, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("/api/token-stats"))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }
}
