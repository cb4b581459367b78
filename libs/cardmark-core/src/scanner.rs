//! Region scanner.
//!
//! One pass over the token sequence locating separator cards and `~~cloze~~`
//! spans. Anchors are list items and top-level paragraphs; regions only
//! record indices into the sequence.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::token::{TokenKind, TokenSequence};
use crate::tokenizer::Tokenizer;
use crate::types::{CardRegion, ClozeRegion, Direction};

/// Non-whitespace required just inside both delimiters.
static CLOZE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"~~(\S(?:.*?\S)?)~~").expect("cloze pattern is valid"));

static CLOZE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{c(0)::").expect("placeholder pattern is valid"));

/// Candidates found in one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Regions {
    pub cards: Vec<CardRegion>,
    pub clozes: Vec<ClozeRegion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    ListItem,
    Paragraph,
}

impl Anchor {
    fn leaves_scope(self, kind: TokenKind) -> bool {
        match self {
            Self::ListItem => matches!(
                kind,
                TokenKind::ListItemClose | TokenKind::BulletListOpen | TokenKind::OrderedListOpen
            ),
            Self::Paragraph => kind == TokenKind::ParagraphClose,
        }
    }

    fn close_kind(self) -> TokenKind {
        match self {
            Self::ListItem => TokenKind::ListItemClose,
            Self::Paragraph => TokenKind::ParagraphClose,
        }
    }
}

/// Scan a document for card and cloze candidates.
pub fn scan_regions(tokens: &TokenSequence, tokenizer: &Tokenizer) -> Regions {
    let mut regions = Regions::default();
    let mut item_depth = 0usize;

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::ListItemOpen => {
                item_depth += 1;
                scan_anchor(tokens, index, Anchor::ListItem, tokenizer, &mut regions);
            }
            TokenKind::ListItemClose => item_depth = item_depth.saturating_sub(1),
            TokenKind::ParagraphOpen if item_depth == 0 => {
                scan_anchor(tokens, index, Anchor::Paragraph, tokenizer, &mut regions);
            }
            _ => {}
        }
    }

    trace!(
        cards = regions.cards.len(),
        clozes = regions.clozes.len(),
        "scanned regions"
    );
    regions
}

fn scan_anchor(
    tokens: &TokenSequence,
    open_index: usize,
    anchor: Anchor,
    tokenizer: &Tokenizer,
    regions: &mut Regions,
) {
    for inline_index in open_index + 1..tokens.len() {
        let token = &tokens[inline_index];
        if anchor.leaves_scope(token.kind) {
            break;
        }
        if token.kind != TokenKind::Inline {
            continue;
        }

        if let Some(region) = find_card(tokens, open_index, inline_index, anchor) {
            regions.cards.push(region);
        }
        if let Some(text) = cloze_text(&token.content) {
            let mut replacement = tokenizer.parse_inline(&text);
            replacement.level = token.level;
            regions.clozes.push(ClozeRegion {
                open_index,
                inline_index,
                replacement,
            });
        }
    }
}

fn find_card(
    tokens: &TokenSequence,
    open_index: usize,
    inline_index: usize,
    anchor: Anchor,
) -> Option<CardRegion> {
    let (symbol_child_index, direction) = tokens[inline_index]
        .children
        .iter()
        .enumerate()
        .filter(|(_, child)| child.kind == TokenKind::Text && child.level == 0)
        .find_map(|(k, child)| Direction::detect(&child.content).map(|d| (k, d)))?;

    let level = tokens[open_index].level;
    let close_kind = anchor.close_kind();
    let Some(close_index) = (inline_index + 1..tokens.len())
        .find(|&l| tokens[l].kind == close_kind && tokens[l].level == level)
    else {
        trace!(open_index, "separator without a matching close");
        return None;
    };

    Some(CardRegion {
        open_index,
        inline_index,
        symbol_child_index,
        direction,
        close_index,
    })
}

/// Rewrite every `~~span~~` into a numbered cloze, left to right from 1.
/// Returns `None` when the text holds no valid span.
pub fn cloze_text(content: &str) -> Option<String> {
    if !CLOZE_SPAN.is_match(content) {
        return None;
    }

    let mut text = CLOZE_SPAN
        .replace_all(content, "{{c0:: ${1} }}")
        .into_owned();

    let mut number = 1u32;
    while let Some(range) = CLOZE_PLACEHOLDER
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.range())
    {
        text.replace_range(range, &number.to_string());
        number += 1;
    }

    Some(text)
}
