//! Markdown tokenizer.
//!
//! Adapts the `pulldown-cmark` event stream into a flat `TokenSequence`:
//! every start/end event becomes an open/close token carrying its depth,
//! and each run of inline events is gathered into a single `Inline` token
//! whose `content` is the raw source of that run.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::token::{Nesting, Token, TokenKind, TokenSequence};

/// Markdown tokenizer with a fixed extension set (CommonMark plus `$` math).
///
/// Strikethrough stays disabled so `~~` spans reach the
/// scanner as literal text.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    options: Options,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_MATH);
        Self { options }
    }

    /// Tokenize a whole document body.
    pub fn parse(&self, text: &str) -> TokenSequence {
        let mut builder = SequenceBuilder::new(text);
        for (event, range) in Parser::new_ext(text, self.options).into_offset_iter() {
            builder.push(event, range);
        }
        builder.finish()
    }

    /// Tokenize text at inline granularity, returning one `Inline` token.
    pub fn parse_inline(&self, text: &str) -> Token {
        let mut inline = Token::new(TokenKind::Inline, "", Nesting::SelfClosing, 0);
        inline.content = text.to_string();

        for token in self.parse(text).iter().filter(|t| t.kind == TokenKind::Inline) {
            if !inline.children.is_empty() {
                inline
                    .children
                    .push(Token::new(TokenKind::Softbreak, "br", Nesting::SelfClosing, 0));
            }
            inline.children.extend(token.children.iter().cloned());
        }

        inline
    }
}

fn is_comment(html: &str) -> bool {
    html.trim_start().starts_with("<!--")
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

/// Continuation lines lose their indentation, as in the block's own text.
fn normalize_source(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (n, line) in raw.lines().enumerate() {
        if n > 0 {
            out.push('\n');
            out.push_str(line.trim_start());
        } else {
            out.push_str(line);
        }
    }
    out.trim_end().to_string()
}

struct InlineRun {
    children: Vec<Token>,
    depth: usize,
    span: Range<usize>,
    hidden_paragraph: bool,
}

struct SequenceBuilder<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    level: usize,
    blocks: Vec<TokenKind>,
    inline: Option<InlineRun>,
    raw_block: Option<Token>,
    image: Option<Token>,
}

impl<'a> SequenceBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            level: 0,
            blocks: Vec::new(),
            inline: None,
            raw_block: None,
            image: None,
        }
    }

    fn finish(mut self) -> TokenSequence {
        self.flush_inline();
        TokenSequence::new(self.tokens)
    }

    fn push(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(block) = self.raw_block.as_mut() {
                    block.content.push_str(&text);
                } else if let Some(image) = self.image.as_mut() {
                    image.content.push_str(&text);
                } else {
                    self.push_text(&text, range);
                }
            }
            Event::Code(code) => self.push_leaf(TokenKind::CodeInline, "code", &code, range),
            Event::InlineMath(math) => self.push_leaf(TokenKind::MathInline, "", &math, range),
            Event::DisplayMath(math) => self.push_leaf(TokenKind::MathDisplay, "", &math, range),
            Event::Html(html) => {
                if let Some(block) = self.raw_block.as_mut() {
                    block.content.push_str(&html);
                }
            }
            Event::InlineHtml(html) => {
                if !is_comment(&html) {
                    self.push_leaf(TokenKind::HtmlInline, "", &html, range);
                }
            }
            Event::SoftBreak => self.push_leaf(TokenKind::Softbreak, "br", "", range),
            Event::HardBreak => self.push_leaf(TokenKind::Hardbreak, "br", "", range),
            Event::Rule => {
                self.flush_inline();
                self.tokens
                    .push(Token::new(TokenKind::Hr, "hr", Nesting::SelfClosing, self.level));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        match tag {
            Tag::Paragraph => self.open(TokenKind::ParagraphOpen, "p", Vec::new()),
            Tag::Heading { level, .. } => {
                self.open(TokenKind::HeadingOpen, heading_tag(level), Vec::new())
            }
            Tag::BlockQuote { .. } => self.open(TokenKind::BlockquoteOpen, "blockquote", Vec::new()),
            Tag::List(Some(start)) => {
                let attrs = if start == 1 {
                    Vec::new()
                } else {
                    vec![("start".to_string(), start.to_string())]
                };
                self.open(TokenKind::OrderedListOpen, "ol", attrs)
            }
            Tag::List(None) => self.open(TokenKind::BulletListOpen, "ul", Vec::new()),
            Tag::Item => self.open(TokenKind::ListItemOpen, "li", Vec::new()),
            Tag::CodeBlock(kind) => {
                self.flush_inline();
                let block = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let mut fence =
                            Token::new(TokenKind::Fence, "code", Nesting::SelfClosing, self.level);
                        fence.info = info.trim().to_string();
                        fence
                    }
                    CodeBlockKind::Indented => {
                        Token::new(TokenKind::CodeBlock, "code", Nesting::SelfClosing, self.level)
                    }
                };
                self.raw_block = Some(block);
            }
            Tag::HtmlBlock => {
                self.flush_inline();
                self.raw_block = Some(Token::new(
                    TokenKind::HtmlBlock,
                    "",
                    Nesting::SelfClosing,
                    self.level,
                ));
            }
            Tag::Emphasis => self.open_child(TokenKind::EmOpen, "em", Vec::new(), range),
            Tag::Strong => self.open_child(TokenKind::StrongOpen, "strong", Vec::new(), range),
            Tag::Strikethrough => {
                self.open_child(TokenKind::StrikethroughOpen, "s", Vec::new(), range)
            }
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut attrs = vec![("href".to_string(), dest_url.to_string())];
                if !title.is_empty() {
                    attrs.push(("title".to_string(), title.to_string()));
                }
                self.open_child(TokenKind::LinkOpen, "a", attrs, range);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let depth = self.inline_run(&range).depth;
                let mut image = Token::new(TokenKind::Image, "img", Nesting::SelfClosing, depth);
                image.attrs.push(("src".to_string(), dest_url.to_string()));
                if !title.is_empty() {
                    image.attrs.push(("title".to_string(), title.to_string()));
                }
                self.image = Some(image);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.close(TokenKind::ParagraphClose, "p"),
            TagEnd::Heading(level) => self.close(TokenKind::HeadingClose, heading_tag(level)),
            TagEnd::BlockQuote { .. } => self.close(TokenKind::BlockquoteClose, "blockquote"),
            TagEnd::List(true) => self.close(TokenKind::OrderedListClose, "ol"),
            TagEnd::List(false) => self.close(TokenKind::BulletListClose, "ul"),
            TagEnd::Item => self.close(TokenKind::ListItemClose, "li"),
            TagEnd::CodeBlock | TagEnd::HtmlBlock => {
                if let Some(block) = self.raw_block.take() {
                    if !(block.kind == TokenKind::HtmlBlock && is_comment(&block.content)) {
                        self.tokens.push(block);
                    }
                }
            }
            TagEnd::Emphasis => self.close_child(TokenKind::EmClose, "em"),
            TagEnd::Strong => self.close_child(TokenKind::StrongClose, "strong"),
            TagEnd::Strikethrough => self.close_child(TokenKind::StrikethroughClose, "s"),
            TagEnd::Link => self.close_child(TokenKind::LinkClose, "a"),
            TagEnd::Image => {
                if let (Some(image), Some(run)) = (self.image.take(), self.inline.as_mut()) {
                    run.children.push(image);
                }
            }
            _ => {}
        }
    }

    fn open(&mut self, kind: TokenKind, tag: &'static str, attrs: Vec<(String, String)>) {
        self.flush_inline();
        let mut token = Token::new(kind, tag, Nesting::Open, self.level);
        token.attrs = attrs;
        self.tokens.push(token);
        self.level += 1;
        self.blocks.push(kind);
    }

    fn close(&mut self, kind: TokenKind, tag: &'static str) {
        self.flush_inline();
        self.level = self.level.saturating_sub(1);
        self.blocks.pop();
        self.tokens
            .push(Token::new(kind, tag, Nesting::Close, self.level));
    }

    /// Current inline run, started on demand. Text directly inside a list
    /// item belongs to a tight list and gets a hidden paragraph.
    fn inline_run(&mut self, range: &Range<usize>) -> &mut InlineRun {
        let hidden = self.inline.is_none() && self.blocks.last() == Some(&TokenKind::ListItemOpen);
        if hidden {
            let mut paragraph = Token::new(TokenKind::ParagraphOpen, "p", Nesting::Open, self.level);
            paragraph.hidden = true;
            self.tokens.push(paragraph);
            self.level += 1;
        }

        let run = self.inline.get_or_insert_with(|| InlineRun {
            children: Vec::new(),
            depth: 0,
            span: range.clone(),
            hidden_paragraph: hidden,
        });
        run.span.start = run.span.start.min(range.start);
        run.span.end = run.span.end.max(range.end);
        run
    }

    fn push_text(&mut self, text: &str, range: Range<usize>) {
        let run = self.inline_run(&range);
        if let Some(last) = run.children.last_mut() {
            if last.kind == TokenKind::Text && last.level == run.depth {
                last.content.push_str(text);
                return;
            }
        }
        run.children.push(Token::text(text, run.depth));
    }

    fn push_leaf(&mut self, kind: TokenKind, tag: &'static str, content: &str, range: Range<usize>) {
        let run = self.inline_run(&range);
        let mut token = Token::new(kind, tag, Nesting::SelfClosing, run.depth);
        token.content = content.to_string();
        run.children.push(token);
    }

    fn open_child(
        &mut self,
        kind: TokenKind,
        tag: &'static str,
        attrs: Vec<(String, String)>,
        range: Range<usize>,
    ) {
        let run = self.inline_run(&range);
        let mut token = Token::new(kind, tag, Nesting::Open, run.depth);
        token.attrs = attrs;
        run.children.push(token);
        run.depth += 1;
    }

    fn close_child(&mut self, kind: TokenKind, tag: &'static str) {
        if let Some(run) = self.inline.as_mut() {
            run.depth = run.depth.saturating_sub(1);
            run.children
                .push(Token::new(kind, tag, Nesting::Close, run.depth));
        }
    }

    fn flush_inline(&mut self) {
        let Some(run) = self.inline.take() else {
            return;
        };

        let mut inline = Token::new(TokenKind::Inline, "", Nesting::SelfClosing, self.level);
        inline.content = normalize_source(self.source.get(run.span).unwrap_or_default());
        inline.children = run.children;
        self.tokens.push(inline);

        if run.hidden_paragraph {
            self.level = self.level.saturating_sub(1);
            let mut paragraph = Token::new(TokenKind::ParagraphClose, "p", Nesting::Close, self.level);
            paragraph.hidden = true;
            self.tokens.push(paragraph);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &TokenSequence) -> Vec<(TokenKind, usize)> {
        tokens.iter().map(|t| (t.kind, t.level)).collect()
    }

    #[test]
    fn paragraph_levels() {
        let tokens = Tokenizer::new().parse("Hello world\n");
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::ParagraphOpen, 0),
                (TokenKind::Inline, 1),
                (TokenKind::ParagraphClose, 0),
            ]
        );
        assert_eq!(tokens[1].content, "Hello world");
        assert_eq!(tokens[1].children.len(), 1);
        assert_eq!(tokens[1].children[0].content, "Hello world");
    }

    #[test]
    fn tight_list_gets_hidden_paragraphs() {
        let tokens = Tokenizer::new().parse("- one\n- two\n");
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::BulletListOpen, 0),
                (TokenKind::ListItemOpen, 1),
                (TokenKind::ParagraphOpen, 2),
                (TokenKind::Inline, 3),
                (TokenKind::ParagraphClose, 2),
                (TokenKind::ListItemClose, 1),
                (TokenKind::ListItemOpen, 1),
                (TokenKind::ParagraphOpen, 2),
                (TokenKind::Inline, 3),
                (TokenKind::ParagraphClose, 2),
                (TokenKind::ListItemClose, 1),
                (TokenKind::BulletListClose, 0),
            ]
        );
        assert!(tokens[2].hidden);
        assert!(tokens[4].hidden);
    }

    #[test]
    fn nested_list_levels_match() {
        let tokens = Tokenizer::new().parse("- parent\n  - child\n");
        let opens: Vec<usize> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::ListItemOpen)
            .map(|t| t.level)
            .collect();
        let closes: Vec<usize> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::ListItemClose)
            .map(|t| t.level)
            .collect();
        assert_eq!(opens, vec![1, 3]);
        assert_eq!(closes, vec![3, 1]);
    }

    #[test]
    fn adjacent_text_is_merged() {
        let tokens = Tokenizer::new().parse("a <== b\n");
        let inline = &tokens[1];
        assert_eq!(inline.children.len(), 1);
        assert_eq!(inline.children[0].content, "a <== b");
    }

    #[test]
    fn emphasis_children_are_nested() {
        let tokens = Tokenizer::new().parse("plain *loud* tail\n");
        let children = &tokens[1].children;
        let shape: Vec<(TokenKind, usize)> = children.iter().map(|c| (c.kind, c.level)).collect();
        assert_eq!(
            shape,
            vec![
                (TokenKind::Text, 0),
                (TokenKind::EmOpen, 0),
                (TokenKind::Text, 1),
                (TokenKind::EmClose, 0),
                (TokenKind::Text, 0),
            ]
        );
        assert_eq!(tokens[1].content, "plain *loud* tail");
    }

    #[test]
    fn tildes_stay_literal() {
        let tokens = Tokenizer::new().parse("a ~~b~~ c\n");
        assert_eq!(tokens[1].children.len(), 1);
        assert_eq!(tokens[1].children[0].content, "a ~~b~~ c");
    }

    #[test]
    fn math_is_its_own_child() {
        let tokens = Tokenizer::new().parse("see $x ==> y$ here\n");
        let children = &tokens[1].children;
        assert!(children
            .iter()
            .any(|c| c.kind == TokenKind::MathInline && c.content == "x ==> y"));
        assert!(children
            .iter()
            .filter(|c| c.kind == TokenKind::Text)
            .all(|c| !c.content.contains("==>")));
    }

    #[test]
    fn html_comments_are_dropped() {
        let tokens = Tokenizer::new().parse("<!-- hidden -->\n\ntext\n");
        assert!(tokens.iter().all(|t| t.kind != TokenKind::HtmlBlock));
    }

    #[test]
    fn headings_carry_tag() {
        let tokens = Tokenizer::new().parse("## Title\n");
        assert_eq!(tokens[0].kind, TokenKind::HeadingOpen);
        assert_eq!(tokens[0].heading_level(), Some(2));
        assert_eq!(tokens[1].content, "Title");
    }

    #[test]
    fn parse_inline_returns_single_inline() {
        let inline = Tokenizer::new().parse_inline("a {{c1:: b }} c");
        assert_eq!(inline.kind, TokenKind::Inline);
        assert_eq!(inline.children[0].content, "a {{c1:: b }} c");
    }
}
