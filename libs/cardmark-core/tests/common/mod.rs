//! Shared helpers for extraction tests.

use once_cell::sync::Lazy;
use regex::Regex;

use cardmark_core::{Card, CardContent, Extractor};

static CLOZE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{c(\d+)::").unwrap());

/// Extract with default settings, panicking on per-file errors.
pub fn extract(markdown: &str) -> Vec<Card> {
    Extractor::default()
        .extract_text(markdown, "notes/test.md")
        .unwrap()
}

/// Text field of a cloze card.
pub fn cloze_text(card: &Card) -> &str {
    match &card.content {
        CardContent::Cloze { text } => text,
        CardContent::Basic { .. } => panic!("expected a cloze card, got {:?}", card),
    }
}

/// Cloze numbers in order of appearance.
pub fn cloze_numbers(text: &str) -> Vec<u32> {
    CLOZE_NUMBER
        .captures_iter(text)
        .map(|caps| caps[1].parse().unwrap())
        .collect()
}
