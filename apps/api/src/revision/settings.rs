//! Revision settings and their validation.
//!
//! Settings are validated before any workflow call: style caps differ by
//! scope, the target word count has fixed bounds, and the free-text
//! direction is length-capped. The word control knob crosses the wire as
//! an integer code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const MAX_STYLES_WHOLE_DOCUMENT: usize = 3;
pub const MAX_STYLES_PARAGRAPH: usize = 2;
pub const MIN_TARGET_WORD_COUNT: u32 = 200;
pub const MAX_TARGET_WORD_COUNT: u32 = 6000;
pub const MAX_DIRECTION_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WordControl {
    Keep,
    Expand,
    Reduce,
}

impl WordControl {
    /// Integer code the workflow expects.
    pub fn wire_code(&self) -> u8 {
        match self {
            WordControl::Keep => 0,
            WordControl::Expand => 1,
            WordControl::Reduce => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionScope {
    WholeDocument,
    Paragraph,
}

impl RevisionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionScope::WholeDocument => "whole_document",
            RevisionScope::Paragraph => "paragraph",
        }
    }

    fn max_styles(&self) -> usize {
        match self {
            RevisionScope::WholeDocument => MAX_STYLES_WHOLE_DOCUMENT,
            RevisionScope::Paragraph => MAX_STYLES_PARAGRAPH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionSettings {
    #[serde(default)]
    pub styles: Vec<String>,
    pub word_control: WordControl,
    pub target_word_count: Option<u32>,
    pub direction: Option<String>,
}

impl RevisionSettings {
    pub fn validate(&self, scope: RevisionScope) -> Result<(), String> {
        let max = scope.max_styles();
        if self.styles.len() > max {
            return Err(format!(
                "at most {max} styles allowed for a {} revision",
                scope.as_str()
            ));
        }
        if self.styles.iter().any(|s| s.trim().is_empty()) {
            return Err("style labels must not be blank".to_string());
        }

        if let Some(target) = self.target_word_count {
            if !(MIN_TARGET_WORD_COUNT..=MAX_TARGET_WORD_COUNT).contains(&target) {
                return Err(format!(
                    "target_word_count must be between {MIN_TARGET_WORD_COUNT} and {MAX_TARGET_WORD_COUNT}"
                ));
            }
        }

        if let Some(direction) = &self.direction {
            if direction.chars().count() > MAX_DIRECTION_CHARS {
                return Err(format!(
                    "direction must be at most {MAX_DIRECTION_CHARS} characters"
                ));
            }
        }

        Ok(())
    }

    /// Adds the settings to a workflow input map.
    pub fn apply_to_inputs(&self, scope: RevisionScope, inputs: &mut BTreeMap<String, String>) {
        inputs.insert("revision.scope".to_string(), scope.as_str().to_string());
        if !self.styles.is_empty() {
            inputs.insert("revision.styles".to_string(), self.styles.join(", "));
        }
        inputs.insert(
            "revision.word_control".to_string(),
            self.word_control.wire_code().to_string(),
        );
        if let Some(target) = self.target_word_count {
            inputs.insert("revision.target_word_count".to_string(), target.to_string());
        }
        if let Some(direction) = self.direction.as_deref().map(str::trim) {
            if !direction.is_empty() {
                inputs.insert("revision.direction".to_string(), direction.to_string());
            }
        }
    }
}
