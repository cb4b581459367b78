//! Core types for card extraction.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::token::Token;

/// Which side of a separator card is the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Bidirectional,
}

impl Direction {
    /// Detection order. `<==>` contains both other glyphs, so it goes first.
    pub const PRECEDENCE: [Direction; 3] = [Self::Bidirectional, Self::Forward, Self::Backward];

    /// Literal separator glyph.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Forward => "==>",
            Self::Backward => "<==",
            Self::Bidirectional => "<==>",
        }
    }

    /// Detect the glyph in a text run.
    pub fn detect(content: &str) -> Option<Self> {
        Self::PRECEDENCE
            .into_iter()
            .find(|direction| content.contains(direction.glyph()))
    }
}

/// Candidate separator card located by the scanner.
///
/// `open_index` is the enclosing list-item-open, or the paragraph-open of a
/// top-level paragraph; `close_index` is its matching close at the same level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRegion {
    pub open_index: usize,
    pub inline_index: usize,
    pub symbol_child_index: usize,
    pub direction: Direction,
    pub close_index: usize,
}

/// Candidate `~~cloze~~` span located by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct ClozeRegion {
    pub open_index: usize,
    pub inline_index: usize,
    /// Replacement for the carrier inline token, clozes already numbered.
    pub replacement: Token,
}

/// Synthesized card content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardContent {
    Basic { front: String, back: String },
    Cloze { text: String },
}

/// Card ready for assembly into a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub content: CardContent,
    pub tags: BTreeSet<String>,
    pub file_path: String,
}

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Front-matter tag that turns a whole file into a front/back card.
    pub file_card_tag: String,
    /// Tag that gives every top-level back item its own cloze number.
    pub incremental_tag: String,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            file_card_tag: "card".to_string(),
            incremental_tag: "incremental".to_string(),
        }
    }
}
