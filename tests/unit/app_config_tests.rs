/*!
 * Tests for application configuration functionality
 */

use pptxlate::app_config::{
    BilingualLayout, Config, LlmProvider, ProviderConfig, StreamRetryConfig, TranslationMode,
};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.base_url, "http://localhost:5001");
    assert_eq!(config.source_language, "auto");
    assert_eq!(config.secondary_language, "auto");
    assert_eq!(config.target_language, "zh-TW");
    assert_eq!(config.mode, TranslationMode::Translated);
    assert_eq!(config.bilingual_layout, BilingualLayout::Inline);
    assert_eq!(config.translation.provider, LlmProvider::Ollama);
    assert!(!config.translation.use_tm);

    // Every provider gets a default entry
    assert!(config.translation.get_provider_config(&LlmProvider::Ollama).is_some());
    assert!(config.translation.get_provider_config(&LlmProvider::ChatGpt).is_some());
    assert!(config.translation.get_provider_config(&LlmProvider::Gemini).is_some());

    let ollama = config
        .translation
        .get_provider_config(&LlmProvider::Ollama)
        .expect("Ollama provider config should exist");
    assert_eq!(ollama.base_url, "http://localhost:11434");
    assert!(ollama.api_key.is_empty());
}

/// Test the default stream retry policy
#[test]
fn test_streamRetryDefaults_shouldAllowThreeAttemptsWithFixedBackoff() {
    let retry = StreamRetryConfig::default();

    assert_eq!(retry.max_attempts, 3);
    assert_eq!(retry.backoff_ms, 2000);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    // Start with a valid config
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Unsupported source language
    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    // Target must be concrete, not auto
    config.target_language = "auto".to_string();
    assert!(config.validate().is_err());
    config.target_language = "zh-TW".to_string();

    // Backend URL must be present
    config.base_url = "  ".to_string();
    assert!(config.validate().is_err());
    config.base_url = "http://localhost:5001".to_string();

    // The retry policy needs at least one attempt
    config.translation.stream.max_attempts = 0;
    assert!(config.validate().is_err());
    config.translation.stream.max_attempts = 3;

    // ChatGPT with an empty API key should fail validation
    config.translation.provider = LlmProvider::ChatGpt;
    assert!(config.validate().is_err());

    // Set a valid API key in available_providers
    if let Some(provider) = config
        .translation
        .available_providers
        .iter_mut()
        .find(|p| p.provider_type == "chatgpt")
    {
        provider.api_key = "sk-1234567890".to_string();
    }
    assert!(config.validate().is_ok());

    // Ollama never needs a key
    config.translation.provider = LlmProvider::Ollama;
    assert!(config.validate().is_ok());
}

/// Test provider naming in both directions
#[test]
fn test_llmProvider_namesAndParsing_shouldRoundTrip() {
    assert_eq!(LlmProvider::Ollama.display_name(), "Ollama");
    assert_eq!(LlmProvider::ChatGpt.display_name(), "ChatGPT");
    assert_eq!(LlmProvider::Gemini.display_name(), "Gemini");

    assert_eq!(LlmProvider::ChatGpt.to_lowercase_string(), "chatgpt");
    assert_eq!("chatgpt".parse::<LlmProvider>().unwrap(), LlmProvider::ChatGpt);
    assert_eq!("GEMINI".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
    assert!("claude".parse::<LlmProvider>().is_err());

    assert!(!LlmProvider::Ollama.requires_api_key());
    assert!(LlmProvider::ChatGpt.requires_api_key());
    assert!(LlmProvider::Gemini.requires_api_key());
}

/// Test mode and layout parsing
#[test]
fn test_modeAndLayoutParsing_shouldAcceptWireNames() {
    assert_eq!(
        "bilingual".parse::<TranslationMode>().unwrap(),
        TranslationMode::Bilingual
    );
    assert_eq!(
        "Correction".parse::<TranslationMode>().unwrap(),
        TranslationMode::Correction
    );
    assert!("review".parse::<TranslationMode>().is_err());

    assert_eq!(
        "new_slide".parse::<BilingualLayout>().unwrap(),
        BilingualLayout::NewSlide
    );
    assert_eq!(
        "new-slide".parse::<BilingualLayout>().unwrap(),
        BilingualLayout::NewSlide
    );
    assert_eq!(BilingualLayout::NewSlide.to_string(), "new_slide");
}

/// Test that active-provider getters read the matching provider entry
#[test]
fn test_translationConfig_getters_shouldFollowActiveProvider() {
    let mut config = Config::default();
    config.translation.provider = LlmProvider::ChatGpt;

    if let Some(provider) = config
        .translation
        .available_providers
        .iter_mut()
        .find(|p| p.provider_type == "chatgpt")
    {
        provider.model = "gpt-4o-mini".to_string();
        provider.api_key = "sk-test".to_string();
        provider.fast_mode = true;
    }

    assert_eq!(config.translation.get_model(), "gpt-4o-mini");
    assert_eq!(config.translation.get_api_key(), "sk-test");
    assert_eq!(config.translation.get_base_url(), "https://api.openai.com/v1");
    assert!(config.translation.get_fast_mode());

    // Switching provider switches every getter
    config.translation.provider = LlmProvider::Ollama;
    assert_eq!(config.translation.get_model(), "");
    assert_eq!(config.translation.get_api_key(), "");
    assert_eq!(config.translation.get_base_url(), "http://localhost:11434");
    assert!(!config.translation.get_fast_mode());
}

/// Test that an empty provider base URL falls back to the provider default
#[test]
fn test_getBaseUrl_withMissingEntry_shouldFallBackToProviderDefault() {
    let mut config = Config::default();
    config.translation.provider = LlmProvider::Gemini;
    config.translation.available_providers = Vec::new();

    assert_eq!(
        config.translation.get_base_url(),
        "https://generativelanguage.googleapis.com/v1beta"
    );
}

/// Test deserialization of a partial config file
#[test]
fn test_configDeserialization_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "target_language": "en",
        "translation": {
            "provider": "chatgpt",
            "available_providers": [
                {"type": "chatgpt", "model": "gpt-4o", "api_key": "sk-x"}
            ]
        }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.target_language, "en");
    assert_eq!(config.source_language, "auto");
    assert_eq!(config.base_url, "http://localhost:5001");
    assert_eq!(config.translation.provider, LlmProvider::ChatGpt);
    assert_eq!(config.translation.get_model(), "gpt-4o");
    assert_eq!(config.translation.stream.max_attempts, 3);
    assert_eq!(config.correction.fill_color, "#FFF16A");
    assert_eq!(config.correction.similarity_threshold, 0.75);
}

/// Test the per-provider constructor defaults
#[test]
fn test_providerConfig_new_shouldSetProviderBaseUrls() {
    let ollama = ProviderConfig::new(LlmProvider::Ollama);
    assert_eq!(ollama.provider_type, "ollama");
    assert_eq!(ollama.base_url, "http://localhost:11434");

    let chatgpt = ProviderConfig::new(LlmProvider::ChatGpt);
    assert_eq!(chatgpt.provider_type, "chatgpt");
    assert_eq!(chatgpt.base_url, "https://api.openai.com/v1");

    let gemini = ProviderConfig::new(LlmProvider::Gemini);
    assert_eq!(gemini.provider_type, "gemini");
    assert!(gemini.base_url.starts_with("https://generativelanguage"));
}
