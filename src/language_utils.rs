/*!
 * Language utilities for the translation workflow.
 *
 * The backend works with a fixed set of language codes, including regional
 * Chinese variants (zh-TW, zh-CN) that plain ISO 639 lookup cannot express,
 * so the supported set is an explicit table.
 */

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// One supported language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageOption {
    /// Wire code sent to the backend
    pub code: &'static str,
    /// Human-readable name
    pub name: &'static str,
}

/// Languages the translation backend accepts, in display order
pub const LANGUAGE_OPTIONS: &[LanguageOption] = &[
    LanguageOption { code: "auto", name: "Auto detect" },
    LanguageOption { code: "vi", name: "Vietnamese" },
    LanguageOption { code: "zh-TW", name: "Traditional Chinese" },
    LanguageOption { code: "zh-CN", name: "Simplified Chinese" },
    LanguageOption { code: "en", name: "English" },
    LanguageOption { code: "ja", name: "Japanese" },
    LanguageOption { code: "ko", name: "Korean" },
];

/// Default translation target when detection reports nothing
pub const DEFAULT_TARGET_LANGUAGE: &str = "zh-TW";

// @const: CJK unified ideograph detection
static CJK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u{4e00}-\u{9fff}\u{3400}-\u{4dbf}]").unwrap()
});

// @const: Vietnamese diacritic detection
static VI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "(?i)[\u{00C0}-\u{00C3}\u{00C8}-\u{00CA}\u{00CC}-\u{00CD}\u{00D2}-\u{00D5}\
         \u{00D9}-\u{00DA}\u{00DD}\u{00E0}-\u{00E3}\u{00E8}-\u{00EA}\u{00EC}-\u{00ED}\
         \u{00F2}-\u{00F5}\u{00F9}-\u{00FA}\u{00FD}\u{0102}\u{0103}\u{0110}\u{0111}\
         \u{0128}\u{0129}\u{0168}\u{0169}\u{01A0}\u{01A1}\u{01AF}\u{01B0}\u{1EA0}-\u{1EF9}]",
    )
    .unwrap()
});

/// Normalize a language code to its canonical table entry.
/// Matching is case-insensitive so "ZH-tw" resolves to "zh-TW".
pub fn normalize_language_code(code: &str) -> Result<&'static str> {
    let trimmed = code.trim();
    LANGUAGE_OPTIONS
        .iter()
        .find(|option| option.code.eq_ignore_ascii_case(trimmed))
        .map(|option| option.code)
        .ok_or_else(|| anyhow!("Unsupported language code: {}", code))
}

/// Check if two language codes refer to the same supported language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_language_code(code1), normalize_language_code(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the display name for a language code
pub fn get_language_name(code: &str) -> Result<&'static str> {
    let canonical = normalize_language_code(code)?;
    LANGUAGE_OPTIONS
        .iter()
        .find(|option| option.code == canonical)
        .map(|option| option.name)
        .ok_or_else(|| anyhow!("Unknown language code: {}", code))
}

/// Split a block's text into trimmed non-empty lines and keep only those
/// belonging to the given language. "auto" or an empty code keeps every line;
/// Chinese variants keep lines containing CJK ideographs; Vietnamese keeps
/// lines containing Vietnamese diacritics; other codes keep every line.
pub fn filter_language_lines(text: &str, lang: &str) -> Vec<String> {
    let lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    if lang.is_empty() || lang == "auto" {
        return lines.map(str::to_string).collect();
    }
    if lang.starts_with("zh") {
        return lines
            .filter(|line| CJK_REGEX.is_match(line))
            .map(str::to_string)
            .collect();
    }
    if lang == "vi" {
        return lines
            .filter(|line| VI_REGEX.is_match(line))
            .map(str::to_string)
            .collect();
    }
    lines.map(str::to_string).collect()
}

/// Infer a secondary language worth translating alongside the primary one
pub fn infer_fallback_language(primary: &str, target: &str) -> Option<&'static str> {
    if primary == target {
        return None;
    }
    match primary {
        "en" | "vi" => Some("zh-TW"),
        _ => None,
    }
}

/// Detected document languages reported by the extraction endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageSummary {
    /// Most frequent language in the document
    #[serde(default)]
    pub primary: Option<String>,
    /// Second most frequent language, if any
    #[serde(default)]
    pub secondary: Option<String>,
}

/// Source, secondary and target selections with per-field lock flags.
/// Locked fields are never overwritten by detection results.
#[derive(Debug, Clone)]
pub struct LanguageSelection {
    pub source: String,
    pub secondary: String,
    pub target: String,
    pub source_locked: bool,
    pub secondary_locked: bool,
    pub target_locked: bool,
}

impl Default for LanguageSelection {
    fn default() -> Self {
        LanguageSelection {
            source: "auto".to_string(),
            secondary: "auto".to_string(),
            target: DEFAULT_TARGET_LANGUAGE.to_string(),
            source_locked: false,
            secondary_locked: false,
            target_locked: false,
        }
    }
}

impl LanguageSelection {
    /// Fold detected languages into the selection. The detected primary
    /// becomes the source, the detected secondary becomes both the secondary
    /// and the preferred target, falling back to the default target.
    pub fn apply_detected(&mut self, summary: &LanguageSummary) {
        let primary = summary.primary.as_deref().unwrap_or("");
        let secondary = summary.secondary.as_deref().unwrap_or("");

        if !self.source_locked && !primary.is_empty() {
            self.source = primary.to_string();
        }
        if !self.secondary_locked && !secondary.is_empty() {
            self.secondary = secondary.to_string();
        }
        if !self.target_locked {
            self.target = if secondary.is_empty() {
                DEFAULT_TARGET_LANGUAGE.to_string()
            } else {
                secondary.to_string()
            };
        }
    }
}
