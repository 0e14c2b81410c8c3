/*!
 * Tests for language code utilities
 */

use pptxlate::language_utils::{
    filter_language_lines, get_language_name, infer_fallback_language, language_codes_match,
    normalize_language_code, LanguageSelection, LanguageSummary, DEFAULT_TARGET_LANGUAGE,
};

/// Test normalization of supported language codes
#[test]
fn test_normalizeLanguageCode_withSupportedCodes_shouldReturnCanonicalForm() {
    assert_eq!(normalize_language_code("en").unwrap(), "en");
    assert_eq!(normalize_language_code("zh-TW").unwrap(), "zh-TW");
    // Matching is case-insensitive and trims whitespace
    assert_eq!(normalize_language_code("ZH-tw").unwrap(), "zh-TW");
    assert_eq!(normalize_language_code(" vi ").unwrap(), "vi");
    assert_eq!(normalize_language_code("auto").unwrap(), "auto");
}

/// Test rejection of unsupported codes
#[test]
fn test_normalizeLanguageCode_withUnsupportedCodes_shouldReturnError() {
    assert!(normalize_language_code("fr").is_err());
    assert!(normalize_language_code("").is_err());
    assert!(normalize_language_code("zh").is_err());
}

/// Test language code comparison
#[test]
fn test_languageCodesMatch_withVariants_shouldCompareCanonically() {
    assert!(language_codes_match("en", "EN"));
    assert!(language_codes_match("zh-tw", "zh-TW"));
    assert!(!language_codes_match("zh-TW", "zh-CN"));
    // Unsupported codes never match anything
    assert!(!language_codes_match("fr", "fr"));
}

/// Test display name lookup
#[test]
fn test_getLanguageName_withKnownCodes_shouldReturnNames() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("zh-TW").unwrap(), "Traditional Chinese");
    assert_eq!(get_language_name("AUTO").unwrap(), "Auto detect");
    assert!(get_language_name("xx").is_err());
}

/// Test per-language line filtering of mixed text
#[test]
fn test_filterLanguageLines_withMixedText_shouldKeepMatchingLines() {
    let text = "Hello world\n\n您好世界\nXin chào thế giới\n  \nSecond English line";

    // Chinese keeps only lines with CJK ideographs
    assert_eq!(filter_language_lines(text, "zh-TW"), vec!["您好世界"]);

    // Vietnamese keeps only lines with Vietnamese diacritics
    assert_eq!(
        filter_language_lines(text, "vi"),
        vec!["Xin chào thế giới"]
    );

    // Auto keeps every non-empty line, trimmed
    let all = filter_language_lines(text, "auto");
    assert_eq!(all.len(), 4);
    assert_eq!(all[0], "Hello world");

    // Codes without a filter keep everything
    assert_eq!(filter_language_lines(text, "en").len(), 4);
}

/// Test fallback language inference
#[test]
fn test_inferFallbackLanguage_shouldSuggestChineseForLatinSources() {
    assert_eq!(infer_fallback_language("en", "vi"), Some("zh-TW"));
    assert_eq!(infer_fallback_language("vi", "en"), Some("zh-TW"));
    assert_eq!(infer_fallback_language("ja", "en"), None);
    // A source already equal to the target suggests nothing
    assert_eq!(infer_fallback_language("en", "en"), None);
}

/// Test that detection results fill unlocked selections
#[test]
fn test_applyDetected_withUnlockedSelection_shouldAdoptDetectedLanguages() {
    let mut selection = LanguageSelection::default();
    let summary = LanguageSummary {
        primary: Some("en".to_string()),
        secondary: Some("vi".to_string()),
    };

    selection.apply_detected(&summary);

    assert_eq!(selection.source, "en");
    assert_eq!(selection.secondary, "vi");
    // The detected secondary becomes the preferred target
    assert_eq!(selection.target, "vi");
}

/// Test that locked selections are never overwritten by detection
#[test]
fn test_applyDetected_withLockedFields_shouldKeepUserChoices() {
    let mut selection = LanguageSelection {
        source: "ja".to_string(),
        secondary: "auto".to_string(),
        target: "en".to_string(),
        source_locked: true,
        secondary_locked: false,
        target_locked: true,
    };
    let summary = LanguageSummary {
        primary: Some("en".to_string()),
        secondary: Some("zh-TW".to_string()),
    };

    selection.apply_detected(&summary);

    assert_eq!(selection.source, "ja");
    assert_eq!(selection.secondary, "zh-TW");
    assert_eq!(selection.target, "en");
}

/// Test the target fallback when detection finds no secondary language
#[test]
fn test_applyDetected_withNoSecondary_shouldFallBackToDefaultTarget() {
    let mut selection = LanguageSelection::default();
    let summary = LanguageSummary {
        primary: Some("en".to_string()),
        secondary: None,
    };

    selection.apply_detected(&summary);

    assert_eq!(selection.source, "en");
    // No secondary detected, the secondary selection stays as it was
    assert_eq!(selection.secondary, "auto");
    assert_eq!(selection.target, DEFAULT_TARGET_LANGUAGE);
}

/// Test that an empty summary changes nothing but the target fallback
#[test]
fn test_applyDetected_withEmptySummary_shouldOnlyApplyTargetFallback() {
    let mut selection = LanguageSelection::default();

    selection.apply_detected(&LanguageSummary::default());

    assert_eq!(selection.source, "auto");
    assert_eq!(selection.secondary, "auto");
    assert_eq!(selection.target, DEFAULT_TARGET_LANGUAGE);
}
