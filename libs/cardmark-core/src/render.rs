//! HTML rendering of token slices.
//!
//! Output follows CommonMark reference rendering. Slices cut out of a larger
//! sequence are balanced on the way out: closers without an opener in the
//! slice are dropped and openers left dangling are closed at the end.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::{Nesting, Token, TokenKind};

/// Direction glyphs (already escaped) and hashtags inside text runs.
static FORMATTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&lt;==&gt;|==&gt;|&lt;==|#[\w/][\w/-]*\w").expect("formatting pattern is valid")
});

/// Pure token-to-HTML renderer.
#[derive(Debug, Clone, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a token slice, wrapped in a leading and trailing newline.
    pub fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut open: Vec<&'static str> = Vec::new();

        for (idx, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Inline => out.push_str(&self.render_inline(&token.children)),
                TokenKind::Fence | TokenKind::CodeBlock => {
                    let lang = token.info.split_whitespace().next().unwrap_or_default();
                    let class = if lang.is_empty() {
                        String::new()
                    } else {
                        format!(" class=\"language-{}\"", escape_html(lang))
                    };
                    out.push_str(&format!(
                        "<pre><code{}>{}</code></pre>\n",
                        class,
                        escape_html(&token.content)
                    ));
                }
                TokenKind::HtmlBlock => out.push_str(&token.content),
                _ => match token.nesting {
                    Nesting::Open => {
                        if !token.hidden {
                            open.push(token.tag);
                        }
                        out.push_str(&render_tag(tokens, idx));
                    }
                    Nesting::Close if token.hidden => {}
                    Nesting::Close => {
                        let Some(pos) = open.iter().rposition(|tag| *tag == token.tag) else {
                            continue;
                        };
                        for tag in open.drain(pos + 1..).rev() {
                            out.push_str(&format!("</{}>\n", tag));
                        }
                        open.pop();
                        out.push_str(&render_tag(tokens, idx));
                    }
                    Nesting::SelfClosing => out.push_str(&render_tag(tokens, idx)),
                },
            }
        }

        for tag in open.into_iter().rev() {
            out.push_str(&format!("</{}>\n", tag));
        }

        format!("\n{}\n", out)
    }

    /// Render the children of an inline token.
    pub fn render_inline(&self, children: &[Token]) -> String {
        let mut out = String::new();

        for child in children {
            match child.kind {
                TokenKind::Text => out.push_str(&decorate(&escape_html(&child.content))),
                TokenKind::Softbreak => out.push('\n'),
                TokenKind::Hardbreak => out.push_str("<br>\n"),
                TokenKind::CodeInline => {
                    out.push_str(&format!("<code>{}</code>", escape_html(&child.content)))
                }
                TokenKind::HtmlInline => out.push_str(&child.content),
                TokenKind::MathInline => out.push_str(&format!(
                    "<span class=\"math inline\">\\( {} \\)</span>",
                    escape_html(&child.content)
                )),
                TokenKind::MathDisplay => out.push_str(&format!(
                    "<div class=\"math block\">\\[ {} \\]</div>",
                    escape_html(&child.content)
                )),
                TokenKind::Image => {
                    out.push_str(&format!(
                        "<img src=\"{}\" alt=\"{}\"",
                        escape_html(child.attr("src").unwrap_or_default()),
                        escape_html(&child.content)
                    ));
                    if let Some(title) = child.attr("title") {
                        out.push_str(&format!(" title=\"{}\"", escape_html(title)));
                    }
                    out.push('>');
                }
                _ => match child.nesting {
                    Nesting::Close => out.push_str(&format!("</{}>", child.tag)),
                    _ => out.push_str(&format!("<{}{}>", child.tag, render_attrs(child))),
                },
            }
        }

        out
    }
}

fn render_tag(tokens: &[Token], idx: usize) -> String {
    let token = &tokens[idx];
    if token.hidden {
        return String::new();
    }

    let mut result = String::new();
    let block = token.kind.is_block();

    // Newline between a hidden paragraph and the next opening block tag.
    if block && token.nesting != Nesting::Close && idx > 0 && tokens[idx - 1].hidden {
        result.push('\n');
    }

    result.push_str(if token.nesting == Nesting::Close { "</" } else { "<" });
    result.push_str(token.tag);
    result.push_str(&render_attrs(token));

    let mut need_lf = block;
    if block && token.nesting == Nesting::Open {
        if let Some(next) = tokens.get(idx + 1) {
            if next.kind == TokenKind::Inline || next.hidden {
                need_lf = false;
            } else if next.nesting == Nesting::Close && next.tag == token.tag {
                need_lf = false;
            }
        }
    }

    result.push_str(if need_lf { ">\n" } else { ">" });
    result
}

fn render_attrs(token: &Token) -> String {
    token
        .attrs
        .iter()
        .map(|(key, value)| format!(" {}=\"{}\"", key, escape_html(value)))
        .collect()
}

fn decorate(escaped: &str) -> String {
    FORMATTING
        .replace_all(escaped, "<span class=\"formatting\">$0</span>")
        .into_owned()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
