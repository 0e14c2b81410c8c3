use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the translation backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Source language code, "auto" lets the backend detect it
    #[serde(default = "default_auto_language")]
    pub source_language: String,

    /// Secondary source language code for mixed-language documents
    #[serde(default = "default_auto_language")]
    pub secondary_language: String,

    /// Target language code
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Operating mode for the produced document
    #[serde(default)]
    pub mode: TranslationMode,

    /// Slide layout when mode is bilingual
    #[serde(default)]
    pub bilingual_layout: BilingualLayout,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Correction mode styling
    #[serde(default)]
    pub correction: CorrectionStyle,

    /// Optional font substitution table forwarded to the apply endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_mapping: Option<Map<String, Value>>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// LLM provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    // @provider: Ollama (local, no API key)
    #[default]
    Ollama,
    // @provider: ChatGPT
    ChatGpt,
    // @provider: Gemini
    Gemini,
}

impl LlmProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::ChatGpt => "ChatGPT",
            Self::Gemini => "Gemini",
        }
    }

    // @returns: Lowercase provider identifier used on the wire
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::ChatGpt => "chatgpt".to_string(),
            Self::Gemini => "gemini".to_string(),
        }
    }

    /// Whether the provider refuses requests without an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

// Implement Display trait for LlmProvider
impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for LlmProvider
impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "chatgpt" => Ok(Self::ChatGpt),
            "gemini" => Ok(Self::Gemini),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Operating mode for the produced document
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    /// Replace text with its translation
    #[default]
    Translated,
    /// Keep original and translation together
    Bilingual,
    /// Correct text in place, styled for review
    Correction,
}

impl std::fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Translated => write!(f, "translated"),
            Self::Bilingual => write!(f, "bilingual"),
            Self::Correction => write!(f, "correction"),
        }
    }
}

impl std::str::FromStr for TranslationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "translated" => Ok(Self::Translated),
            "bilingual" => Ok(Self::Bilingual),
            "correction" => Ok(Self::Correction),
            _ => Err(anyhow!("Invalid mode: {}", s)),
        }
    }
}

/// Slide layout for bilingual output
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BilingualLayout {
    /// Translation appended inside the original shape
    #[default]
    Inline,
    /// Backend decides per shape
    Auto,
    /// Translated copy of each slide inserted after the original
    NewSlide,
}

impl std::fmt::Display for BilingualLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Auto => write!(f, "auto"),
            Self::NewSlide => write!(f, "new_slide"),
        }
    }
}

impl std::str::FromStr for BilingualLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "auto" => Ok(Self::Auto),
            "new_slide" | "new-slide" => Ok(Self::NewSlide),
            _ => Err(anyhow!("Invalid bilingual layout: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name, empty lets the backend pick its default
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Provider service URL
    #[serde(default = "String::new")]
    pub base_url: String,

    // @field: Trade quality for speed where the provider supports it
    #[serde(default)]
    pub fast_mode: bool,
}

impl ProviderConfig {
    // @param provider: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider: LlmProvider) -> Self {
        match provider {
            LlmProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: String::new(),
                api_key: String::new(),
                base_url: default_ollama_base_url(),
                fast_mode: false,
            },
            LlmProvider::ChatGpt => Self {
                provider_type: "chatgpt".to_string(),
                model: String::new(),
                api_key: String::new(),
                base_url: default_chatgpt_base_url(),
                fast_mode: false,
            },
            LlmProvider::Gemini => Self {
                provider_type: "gemini".to_string(),
                model: String::new(),
                api_key: String::new(),
                base_url: default_gemini_base_url(),
                fast_mode: false,
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// LLM provider to use
    #[serde(default)]
    pub provider: LlmProvider,

    /// Available provider configurations
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Whether the backend should consult its translation memory
    #[serde(default)]
    pub use_tm: bool,

    /// Streaming retry policy
    #[serde(default)]
    pub stream: StreamRetryConfig,
}

/// Retry policy for the translation event stream
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StreamRetryConfig {
    /// Total connection attempts per job, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay before each retry, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for StreamRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Styling applied to corrected shapes in correction mode
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorrectionStyle {
    /// Highlight fill color
    #[serde(default = "default_fill_color")]
    pub fill_color: String,

    /// Corrected text color
    #[serde(default = "default_text_color")]
    pub text_color: String,

    /// Outline color
    #[serde(default = "default_line_color")]
    pub line_color: String,

    /// Outline dash style
    #[serde(default = "default_line_dash")]
    pub line_dash: String,

    /// Similarity threshold above which text counts as unchanged
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

impl Default for CorrectionStyle {
    fn default() -> Self {
        Self {
            fill_color: default_fill_color(),
            text_color: default_text_color(),
            line_color: default_line_color(),
            line_dash: default_line_dash(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_base_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_auto_language() -> String {
    "auto".to_string()
}

fn default_target_language() -> String {
    crate::language_utils::DEFAULT_TARGET_LANGUAGE.to_string()
}

fn default_max_attempts() -> u32 {
    3 // Initial connection plus two retries
}

fn default_retry_backoff_ms() -> u64 {
    2000 // Fixed 2 second pause before each retry
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_chatgpt_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_fill_color() -> String {
    "#FFF16A".to_string()
}

fn default_text_color() -> String {
    "#D90000".to_string()
}

fn default_line_color() -> String {
    "#7B2CB9".to_string()
}

fn default_line_dash() -> String {
    "dash".to_string()
}

fn default_similarity_threshold() -> f32 {
    0.75
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source = crate::language_utils::normalize_language_code(&self.source_language)?;
        let _secondary = crate::language_utils::normalize_language_code(&self.secondary_language)?;
        let target = crate::language_utils::normalize_language_code(&self.target_language)?;
        if target == "auto" {
            return Err(anyhow!("Target language must be a concrete language, not 'auto'"));
        }

        if self.base_url.trim().is_empty() {
            return Err(anyhow!("Backend base URL must not be empty"));
        }

        if self.translation.stream.max_attempts == 0 {
            return Err(anyhow!("Stream retry policy needs at least one attempt"));
        }

        // Validate API key for providers that need one
        if self.translation.provider.requires_api_key()
            && self.translation.get_api_key().is_empty()
        {
            return Err(anyhow!(
                "An API key is required for the {} provider",
                self.translation.provider.display_name()
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            source_language: default_auto_language(),
            secondary_language: default_auto_language(),
            target_language: default_target_language(),
            mode: TranslationMode::default(),
            bilingual_layout: BilingualLayout::default(),
            translation: TranslationConfig::default(),
            correction: CorrectionStyle::default(),
            font_mapping: None,
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider: &LlmProvider) -> Option<&ProviderConfig> {
        let provider_str = provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider, empty when the backend should pick
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }
        String::new()
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }
        String::new()
    }

    /// Get the base URL for the active provider
    pub fn get_base_url(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.base_url.is_empty() {
                return provider_config.base_url.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            LlmProvider::Ollama => default_ollama_base_url(),
            LlmProvider::ChatGpt => default_chatgpt_base_url(),
            LlmProvider::Gemini => default_gemini_base_url(),
        }
    }

    /// Get the fast-mode flag for the active provider
    pub fn get_fast_mode(&self) -> bool {
        self.get_active_provider_config()
            .map(|p| p.fast_mode)
            .unwrap_or(false)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: LlmProvider::default(),
            available_providers: Vec::new(),
            use_tm: false,
            stream: StreamRetryConfig::default(),
        };

        // Add default providers
        config.available_providers.push(ProviderConfig::new(LlmProvider::Ollama));
        config.available_providers.push(ProviderConfig::new(LlmProvider::ChatGpt));
        config.available_providers.push(ProviderConfig::new(LlmProvider::Gemini));

        config
    }
}
