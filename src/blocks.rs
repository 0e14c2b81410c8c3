use std::collections::HashSet;
use std::fmt;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// @module: Text block model and the shared block store

/// Output resolution for a block in correction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Keep the original text in the produced document
    Source,
    /// Substitute the translated text
    Translated,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputMode::Source => write!(f, "source"),
            OutputMode::Translated => write!(f, "translated"),
        }
    }
}

fn default_selected() -> bool {
    true
}

// @struct: One extracted text unit (textbox, table cell or speaker note)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    // @field: Stable client identity, the join key for stream reconciliation.
    // Assigned once per extraction and never reassigned afterwards.
    #[serde(default)]
    pub client_id: String,

    // @field: Zero-based slide position, when the server reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<u32>,

    // @field: Shape identifier inside the slide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_id: Option<i64>,

    // @field: Server-reported kind, e.g. "textbox", "table_cell", "notes"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,

    // @field: Extracted text, immutable after extraction
    #[serde(default)]
    pub source_text: String,

    // @field: Translated text, starts empty
    #[serde(default)]
    pub translated_text: String,

    // @field: Whether the block is included in translation and output
    #[serde(default = "default_selected")]
    pub selected: bool,

    // @field: Explicit per-block output choice. The effective mode is
    // computed on read, see effective_output_mode().
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_mode: Option<OutputMode>,

    // @field: Set to false on source-resolved blocks before a correction apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply: Option<bool>,

    // @field: In-flight marker while a translation job is running
    #[serde(skip)]
    pub translating: bool,

    // @field: Last time translated text changed
    #[serde(skip)]
    pub updated_at: Option<DateTime<Local>>,

    // Server fields we do not interpret must survive the round trip untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextBlock {
    /// Create a block with the given identity and source text
    pub fn new(client_id: impl Into<String>, source_text: impl Into<String>) -> Self {
        TextBlock {
            client_id: client_id.into(),
            slide_index: None,
            shape_id: None,
            block_type: None,
            source_text: source_text.into(),
            translated_text: String::new(),
            selected: true,
            output_mode: None,
            apply: None,
            translating: false,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Deterministic identity from (slide index, shape id, block type, ordinal).
    /// Missing components contribute the literal "x".
    pub fn generated_id(&self, ordinal: usize) -> String {
        let slide = self
            .slide_index
            .map_or_else(|| "x".to_string(), |v| v.to_string());
        let shape = self
            .shape_id
            .map_or_else(|| "x".to_string(), |v| v.to_string());
        let kind = self.block_type.as_deref().unwrap_or("x");
        format!("{}-{}-{}-{}", slide, shape, kind, ordinal)
    }

    /// Adopt a stable identity: an existing client_id wins, then a server
    /// `_uid` field, then the generated fallback.
    pub fn ensure_identity(&mut self, ordinal: usize) {
        if !self.client_id.is_empty() {
            return;
        }
        if let Some(uid) = self.extra.get("_uid").and_then(Value::as_str) {
            if !uid.is_empty() {
                self.client_id = uid.to_string();
                return;
            }
        }
        self.client_id = self.generated_id(ordinal);
    }

    /// Whether the block carries a non-empty translation
    pub fn has_translation(&self) -> bool {
        !self.translated_text.trim().is_empty()
    }

    /// Effective output mode: the explicit choice when present, otherwise
    /// translated if translated text is non-empty, else source
    pub fn effective_output_mode(&self) -> OutputMode {
        if let Some(mode) = self.output_mode {
            return mode;
        }
        if self.has_translation() {
            OutputMode::Translated
        } else {
            OutputMode::Source
        }
    }
}

/// Options for a batch find/replace pass over translated text
#[derive(Debug, Clone)]
pub struct ReplaceOptions {
    /// Only touch selected blocks
    pub selected_only: bool,
    /// Match case exactly
    pub case_sensitive: bool,
    /// Interpret the needle as a regular expression
    pub use_regex: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        ReplaceOptions {
            selected_only: true,
            case_sensitive: true,
            use_regex: false,
        }
    }
}

/// The shared collection of text blocks for one loaded document.
///
/// During an active job the coordinator is the only writer of translated
/// text, in-flight flags and timestamps; selection and output mode may be
/// mutated concurrently by other callers. Every write here goes through an
/// identity lookup and touches single fields, never whole records.
#[derive(Debug, Default)]
pub struct BlockStore {
    blocks: Vec<TextBlock>,
}

impl BlockStore {
    /// Create an empty store
    pub fn new() -> Self {
        BlockStore { blocks: Vec::new() }
    }

    /// Load a fresh extraction, assigning stable identities by position
    pub fn replace_all(&mut self, mut blocks: Vec<TextBlock>) {
        for (ordinal, block) in blocks.iter_mut().enumerate() {
            block.ensure_identity(ordinal);
            block.translating = false;
            block.updated_at = None;
        }
        self.blocks = blocks;
    }

    /// Drop all blocks
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Look up a block by identity
    pub fn get(&self, client_id: &str) -> Option<&TextBlock> {
        self.blocks.iter().find(|b| b.client_id == client_id)
    }

    /// Blocks currently marked for translation and output, cloned for submission
    pub fn selected_blocks(&self) -> Vec<TextBlock> {
        self.blocks.iter().filter(|b| b.selected).cloned().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.selected).count()
    }

    pub fn translated_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.has_translation()).count()
    }

    /// Manually edit the translated text of one block
    pub fn set_translated_text(&mut self, client_id: &str, text: impl Into<String>) -> bool {
        match self.blocks.iter_mut().find(|b| b.client_id == client_id) {
            Some(block) => {
                block.translated_text = text.into();
                block.updated_at = Some(Local::now());
                true
            }
            None => false,
        }
    }

    /// Toggle the selection flag of one block
    pub fn set_selected(&mut self, client_id: &str, selected: bool) -> bool {
        match self.blocks.iter_mut().find(|b| b.client_id == client_id) {
            Some(block) => {
                block.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Set or clear the selection flag on every block
    pub fn select_all(&mut self, selected: bool) {
        for block in self.blocks.iter_mut() {
            block.selected = selected;
        }
    }

    /// Override the output mode of one block, or reset it to the computed default
    pub fn set_output_mode(&mut self, client_id: &str, mode: Option<OutputMode>) -> bool {
        match self.blocks.iter_mut().find(|b| b.client_id == client_id) {
            Some(block) => {
                block.output_mode = mode;
                true
            }
            None => false,
        }
    }

    /// Mark the given identities as in-flight
    pub fn mark_translating(&mut self, client_ids: &[String]) {
        let wanted: HashSet<&str> = client_ids.iter().map(String::as_str).collect();
        for block in self.blocks.iter_mut() {
            if wanted.contains(block.client_id.as_str()) {
                block.translating = true;
            }
        }
    }

    /// Clear the in-flight flag of one block, leaving its text alone
    pub fn finish_translating(&mut self, client_id: &str) -> bool {
        match self.blocks.iter_mut().find(|b| b.client_id == client_id) {
            Some(block) => {
                block.translating = false;
                true
            }
            None => false,
        }
    }

    /// Clear every in-flight flag. Every failure path ends here so the
    /// store is never left busy.
    pub fn clear_translating(&mut self) {
        for block in self.blocks.iter_mut() {
            block.translating = false;
        }
    }

    pub fn translating_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.translating).count()
    }

    /// Write a server-confirmed translation onto one block. An empty text
    /// never overwrites an existing translation. Only translated text, the
    /// in-flight flag and the timestamp are touched.
    pub fn apply_translation(&mut self, client_id: &str, text: &str) -> bool {
        match self.blocks.iter_mut().find(|b| b.client_id == client_id) {
            Some(block) => {
                block.translating = false;
                if text.trim().is_empty() {
                    return false;
                }
                block.translated_text = text.to_string();
                block.updated_at = Some(Local::now());
                true
            }
            None => false,
        }
    }

    /// Find/replace over translated text, returning how many blocks changed
    pub fn batch_replace(
        &mut self,
        find: &str,
        replace: &str,
        options: &ReplaceOptions,
    ) -> Result<usize> {
        if find.is_empty() {
            return Ok(0);
        }

        let pattern = if options.use_regex {
            find.to_string()
        } else {
            regex::escape(find)
        };
        let re: Regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|e| anyhow!("Invalid replace pattern '{}': {}", find, e))?;

        let mut changed = 0;
        for block in self.blocks.iter_mut() {
            if options.selected_only && !block.selected {
                continue;
            }
            let next = if options.use_regex {
                re.replace_all(&block.translated_text, replace)
            } else {
                re.replace_all(&block.translated_text, NoExpand(replace))
            };
            if next != block.translated_text {
                block.translated_text = next.into_owned();
                block.updated_at = Some(Local::now());
                changed += 1;
            }
        }
        Ok(changed)
    }
}
