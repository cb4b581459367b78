//! Flat, level-annotated token model.
//!
//! A document is a single `TokenSequence`. Block structure is not a tree:
//! every token records its depth in `level`, and open/close pairs are
//! matched by level alone.

use std::ops::Deref;

/// Closed set of token kinds produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Block level
    BulletListOpen,
    BulletListClose,
    OrderedListOpen,
    OrderedListClose,
    ListItemOpen,
    ListItemClose,
    ParagraphOpen,
    ParagraphClose,
    HeadingOpen,
    HeadingClose,
    BlockquoteOpen,
    BlockquoteClose,
    Inline,
    Fence,
    CodeBlock,
    HtmlBlock,
    Hr,

    // Inline level, only found in `Token::children`
    Text,
    Softbreak,
    Hardbreak,
    CodeInline,
    EmOpen,
    EmClose,
    StrongOpen,
    StrongClose,
    StrikethroughOpen,
    StrikethroughClose,
    LinkOpen,
    LinkClose,
    Image,
    HtmlInline,
    MathInline,
    MathDisplay,
}

impl TokenKind {
    /// Whether this kind is a block-level token.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::BulletListOpen
                | Self::BulletListClose
                | Self::OrderedListOpen
                | Self::OrderedListClose
                | Self::ListItemOpen
                | Self::ListItemClose
                | Self::ParagraphOpen
                | Self::ParagraphClose
                | Self::HeadingOpen
                | Self::HeadingClose
                | Self::BlockquoteOpen
                | Self::BlockquoteClose
                | Self::Inline
                | Self::Fence
                | Self::CodeBlock
                | Self::HtmlBlock
                | Self::Hr
        )
    }

    /// Closing token of any list container (item, bullet list, ordered list).
    pub fn is_list_close(self) -> bool {
        matches!(
            self,
            Self::ListItemClose | Self::BulletListClose | Self::OrderedListClose
        )
    }
}

/// Open/close role of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Open,
    SelfClosing,
    Close,
}

/// A single parse unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub level: usize,
    pub nesting: Nesting,
    /// Output HTML tag name, empty when the kind renders no tag.
    pub tag: &'static str,
    /// Raw source text for `Inline`; literal text for inline-level kinds;
    /// body for code and html blocks.
    pub content: String,
    /// Inline sub-tokens, populated only for `TokenKind::Inline`.
    pub children: Vec<Token>,
    /// Paragraphs of tight lists are hidden and render no tags.
    pub hidden: bool,
    /// Fence info string (language).
    pub info: String,
    pub attrs: Vec<(String, String)>,
}

impl Token {
    pub fn new(kind: TokenKind, tag: &'static str, nesting: Nesting, level: usize) -> Self {
        Self {
            kind,
            level,
            nesting,
            tag,
            content: String::new(),
            children: Vec::new(),
            hidden: false,
            info: String::new(),
            attrs: Vec::new(),
        }
    }

    /// Literal text child at the given inline level.
    pub fn text(content: impl Into<String>, level: usize) -> Self {
        let mut token = Self::new(TokenKind::Text, "", Nesting::SelfClosing, level);
        token.content = content.into();
        token
    }

    /// Heading depth parsed from the tag (`h2` -> 2).
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            TokenKind::HeadingOpen | TokenKind::HeadingClose => {
                self.tag.strip_prefix('h').and_then(|n| n.parse().ok())
            }
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Immutable, index-addressable token list for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSequence(Vec<Token>);

impl TokenSequence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }

    pub fn into_inner(self) -> Vec<Token> {
        self.0
    }
}

impl Deref for TokenSequence {
    type Target = [Token];

    fn deref(&self) -> &[Token] {
        &self.0
    }
}

impl From<Vec<Token>> for TokenSequence {
    fn from(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_level_from_tag() {
        let open = Token::new(TokenKind::HeadingOpen, "h3", Nesting::Open, 0);
        assert_eq!(open.heading_level(), Some(3));

        let para = Token::new(TokenKind::ParagraphOpen, "p", Nesting::Open, 0);
        assert_eq!(para.heading_level(), None);
    }

    #[test]
    fn list_close_kinds() {
        assert!(TokenKind::ListItemClose.is_list_close());
        assert!(TokenKind::OrderedListClose.is_list_close());
        assert!(!TokenKind::ParagraphClose.is_list_close());
    }

    #[test]
    fn sequence_indexes_like_a_slice() {
        let seq = TokenSequence::new(vec![
            Token::new(TokenKind::ParagraphOpen, "p", Nesting::Open, 0),
            Token::new(TokenKind::ParagraphClose, "p", Nesting::Close, 0),
        ]);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[1].kind, TokenKind::ParagraphClose);
        assert_eq!(seq[1].nesting, Nesting::Close);
    }
}
