//! Card synthesis: front/back token sequences and cloze injection.
//!
//! All output tokens are copies; the document sequence is only read.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::classify::{CardShape, Classification};
use crate::error::{ExtractError, Result};
use crate::token::{Token, TokenKind, TokenSequence};
use crate::tokenizer::Tokenizer;
use crate::types::{CardRegion, Direction};

/// Delimiter line of file cards.
static FILE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^---\r?\n").expect("file split pattern is valid"));

/// Front matter open, front matter close, front/back separator.
pub const FILE_DELIMITERS: usize = 3;

/// Delimiters consumed by the front matter before the body.
const FRONT_MATTER_DELIMITERS: usize = 2;

/// Front and back of a card before cloze injection.
#[derive(Debug, Clone, PartialEq)]
pub struct Sides {
    pub front: Vec<Token>,
    pub back: Vec<Token>,
}

/// Leading space of an opening cloze marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClozeSpacing {
    Inline,
    ListItem,
}

/// Build an inline card by splitting the carrier at the glyph.
///
/// The glyph stays on the front. Returns `None` when both sides are empty.
pub fn synthesize_inline(
    tokens: &TokenSequence,
    region: &CardRegion,
    class: &Classification,
) -> Option<Sides> {
    let inline = &tokens[region.inline_index];
    let k = region.symbol_child_index;
    let child = &inline.children[k];

    let mut left = child.clone();
    left.content = format!("{}{}", class.left, region.direction.glyph());
    let mut front_children = inline.children[..k].to_vec();
    front_children.push(left);

    let mut back_children = Vec::new();
    if !class.right.trim().is_empty() {
        let mut right = child.clone();
        right.content = class.right.clone();
        back_children.push(right);
    }
    back_children.extend(inline.children[k + 1..].iter().cloned());

    let front_empty = k == 0 && class.left.trim().is_empty();
    let back_empty = is_blank(&back_children);
    if front_empty && back_empty {
        debug!(open_index = region.open_index, "dropping inline card with no content");
        return None;
    }

    let mut front = tokens[region.open_index..region.inline_index].to_vec();
    front.push(with_children(inline, front_children));
    let back = if back_empty {
        Vec::new()
    } else {
        vec![with_children(inline, back_children)]
    };

    Some(Sides { front, back })
}

/// Build a list card: the carrier line is the front, the nested subtree the
/// back. Returns `None` without a nested bullet list.
pub fn synthesize_list(tokens: &TokenSequence, region: &CardRegion) -> Option<Sides> {
    if !has_nested_list(tokens, region) {
        debug!(open_index = region.open_index, "dropping list card without nested list");
        return None;
    }

    Some(Sides {
        front: tokens[region.open_index..=region.inline_index].to_vec(),
        back: tokens[region.inline_index + 1..=region.close_index].to_vec(),
    })
}

/// Whether a bullet list opens between the carrier and the region close.
pub fn has_nested_list(tokens: &TokenSequence, region: &CardRegion) -> bool {
    tokens[region.inline_index + 1..region.close_index]
        .iter()
        .any(|token| token.kind == TokenKind::BulletListOpen)
}

/// Wrap the answer side in cloze markers and join front and back.
///
/// Forward and bidirectional cards hide the back; backward cards hide the
/// front. Cloze output has a single ordering, so bidirectional behaves as
/// forward.
pub fn cloze_sides(sides: Sides, direction: Direction, shape: CardShape, incremental: bool) -> Vec<Token> {
    let Sides {
        mut front,
        mut back,
    } = sides;

    match direction {
        Direction::Backward => {
            // The carrier is the last inline of the front.
            if let Some(carrier) = front.iter_mut().rev().find(|t| t.kind == TokenKind::Inline) {
                inject_cloze(carrier, 1, ClozeSpacing::Inline);
            }
        }
        Direction::Forward | Direction::Bidirectional => match shape {
            CardShape::Inline => {
                if let Some(answer) = back.iter_mut().find(|t| t.kind == TokenKind::Inline) {
                    inject_cloze(answer, 1, ClozeSpacing::Inline);
                }
            }
            CardShape::List => number_list_clozes(&mut back, incremental),
        },
    }

    front.extend(back);
    front
}

/// Cloze every inline inside list items.
///
/// Without `incremental` every cloze is number 1. With it, each completed
/// top-level item advances the number, so nested content shares its
/// top-level item's number.
pub fn number_list_clozes(tokens: &mut [Token], incremental: bool) {
    let mut nesting = 0isize;
    let mut number = 1u32;

    for token in tokens.iter_mut() {
        match token.kind {
            TokenKind::ListItemOpen => nesting += 1,
            TokenKind::ListItemClose => {
                nesting -= 1;
                if nesting == 0 && incremental {
                    number += 1;
                }
            }
            TokenKind::Inline if nesting > 0 => {
                inject_cloze(token, number, ClozeSpacing::ListItem)
            }
            _ => {}
        }
    }
}

/// Prepend `{{cN:: ` and append ` }}` to an inline token's children.
pub fn inject_cloze(token: &mut Token, number: u32, spacing: ClozeSpacing) {
    if token.kind != TokenKind::Inline {
        return;
    }

    let lead = match spacing {
        ClozeSpacing::Inline => " ",
        ClozeSpacing::ListItem => "",
    };
    token
        .children
        .insert(0, Token::text(format!("{}{{{{c{}:: ", lead, number), 0));
    token.children.push(Token::text(" }}", 0));
}

/// Split the body of a file card, front matter already removed, into front
/// and back text at the first delimiter line.
pub fn split_file_card(body: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = FILE_SPLIT.splitn(body, 2).collect();
    match parts.as_slice() {
        [front, back] => Ok((front, back)),
        _ => Err(ExtractError::ContentShape {
            found: FRONT_MATTER_DELIMITERS + parts.len() - 1,
            required: FILE_DELIMITERS,
        }),
    }
}

/// Tokenize both halves of a file card body.
pub fn synthesize_file(body: &str, tokenizer: &Tokenizer) -> Result<Sides> {
    let (front, back) = split_file_card(body)?;
    Ok(Sides {
        front: tokenizer.parse(front).into_inner(),
        back: tokenizer.parse(back).into_inner(),
    })
}

fn with_children(inline: &Token, children: Vec<Token>) -> Token {
    let mut token = Token::new(inline.kind, inline.tag, inline.nesting, inline.level);
    token.content = inline.content.clone();
    token.children = children;
    token
}

fn is_blank(children: &[Token]) -> bool {
    children.iter().all(|child| match child.kind {
        TokenKind::Text => child.content.trim().is_empty(),
        TokenKind::Softbreak | TokenKind::Hardbreak => true,
        _ => false,
    })
}
