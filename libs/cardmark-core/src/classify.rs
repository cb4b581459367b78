//! Symbol and tag classification of a card region.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::TokenSequence;
use crate::types::CardRegion;

static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\w/][\w/-]*\w)").expect("hashtag pattern is valid"));

/// Card kind resolved from what follows the separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardShape {
    /// Content follows the separator on the same line.
    Inline,
    /// Only tags follow the separator; the back is the nested list.
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub shape: CardShape,
    pub tags: BTreeSet<String>,
    /// Carrier child text before the glyph.
    pub left: String,
    /// Carrier child text after the glyph.
    pub right: String,
}

/// Hashtags in `text`, without the leading `#`.
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    HASHTAG
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

pub fn strip_tags(text: &str) -> String {
    HASHTAG.replace_all(text, "").into_owned()
}

/// Classify a region produced by the scanner over the same `tokens`.
pub fn classify(tokens: &TokenSequence, region: &CardRegion) -> Classification {
    let inline = &tokens[region.inline_index];
    let child = &inline.children[region.symbol_child_index];
    let glyph = region.direction.glyph();

    let (left, right) = child
        .content
        .split_once(glyph)
        .unwrap_or((child.content.as_str(), ""));
    let after = inline
        .content
        .split_once(glyph)
        .map(|(_, after)| after)
        .unwrap_or_default();

    let shape = if strip_tags(after).trim().is_empty() {
        CardShape::List
    } else {
        CardShape::Inline
    };

    Classification {
        shape,
        tags: extract_tags(after),
        left: left.to_string(),
        right: right.to_string(),
    }
}
