//! Breadcrumb context: enclosing headings and container ancestors of an anchor.
//!
//! The walk runs backward from the anchor using levels only. Closed sibling
//! subtrees are pruned by skipping until the level drops back under the
//! sibling's parent, so no explicit stack is kept.

use crate::render::Renderer;
use crate::token::{Nesting, Token, TokenKind};

/// Larger than any heading level.
const NO_HEADING: u8 = 7;

/// Indices of the context tokens for the anchor at `open_index`, in
/// document order: headings outermost first, then list ancestors.
pub fn ancestor_context(tokens: &[Token], open_index: usize) -> Vec<usize> {
    let mut context = Vec::new();
    let Some(anchor) = tokens.get(open_index) else {
        return context;
    };

    // Top-level anchors have no list ancestry.
    let mut list_search = anchor.level > 0;
    let mut min_level = anchor.level as isize - 1;
    let mut skipping = false;

    let mut min_heading = NO_HEADING;
    let mut in_heading = false;

    for index in (0..open_index).rev() {
        let token = &tokens[index];
        let level = token.level as isize;

        if list_search {
            // Closers nested inside a subtree being skipped belong to it.
            if !skipping && closes_sibling(tokens, index) {
                min_level = level - 1;
                skipping = true;
            }
            if skipping {
                if level <= min_level {
                    skipping = false;
                } else {
                    continue;
                }
            }

            context.push(index);
            if token.level == 0 {
                list_search = false;
            }
        } else {
            if token.kind == TokenKind::HeadingClose {
                if let Some(heading) = token.heading_level() {
                    if heading < min_heading {
                        in_heading = true;
                        min_heading = heading;
                    }
                }
            }
            if in_heading {
                context.push(index);
            }
            if token.kind == TokenKind::HeadingOpen {
                in_heading = false;
            }
        }
    }

    context.reverse();
    context
}

/// Whether the token at `index` ends a subtree that precedes the anchor
/// without enclosing it. Content of an enclosing list item is kept.
fn closes_sibling(tokens: &[Token], index: usize) -> bool {
    let token = &tokens[index];
    if token.kind.is_list_close() {
        return true;
    }
    let ends_block = match token.nesting {
        Nesting::Close => !token.hidden,
        Nesting::SelfClosing => token.kind != TokenKind::Inline,
        Nesting::Open => false,
    };
    if !ends_block {
        return false;
    }

    !tokens[..index]
        .iter()
        .rev()
        .find(|t| t.level < token.level)
        .is_some_and(|container| container.kind == TokenKind::ListItemOpen)
}

/// Render context tokens, trimming the closers the renderer adds for the
/// containers left open.
pub fn render_breadcrumb(renderer: &Renderer, tokens: &[Token], indices: &[usize]) -> String {
    if indices.is_empty() {
        return String::new();
    }

    let slice: Vec<Token> = indices
        .iter()
        .filter_map(|&index| tokens.get(index).cloned())
        .collect();
    strip_trailing_closers(&renderer.render(&slice))
}

fn strip_trailing_closers(html: &str) -> String {
    let mut html = html.trim();
    while let Some(rest) = ["</ul>", "</ol>", "</li>", "</blockquote>"]
        .iter()
        .find_map(|closer| html.strip_suffix(closer))
    {
        html = rest.trim_end();
    }
    html.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenSequence;
    use crate::tokenizer::Tokenizer;
    use pretty_assertions::assert_eq;

    fn anchor_of(tokens: &TokenSequence, content: &str) -> usize {
        let inline = tokens
            .iter()
            .position(|t| t.kind == TokenKind::Inline && t.content == content)
            .unwrap();
        (0..inline)
            .rev()
            .find(|&i| tokens[i].kind == TokenKind::ListItemOpen)
            .unwrap()
    }

    fn breadcrumb(markdown: &str, content: &str) -> String {
        let tokens = Tokenizer::new().parse(markdown);
        let anchor = anchor_of(&tokens, content);
        let indices = ancestor_context(&tokens, anchor);
        render_breadcrumb(&Renderer::new(), &tokens, &indices)
    }

    #[test]
    fn top_level_item_keeps_list_open() {
        assert_eq!(breadcrumb("- a ==> b\n", "a ==> b"), "<ul>");
    }

    #[test]
    fn nested_item_keeps_parent() {
        assert_eq!(
            breadcrumb("- Parent\n  - Child ==> x\n", "Child ==> x"),
            "<ul>\n<li>Parent\n<ul>"
        );
    }

    #[test]
    fn closed_siblings_are_pruned() {
        let markdown = "- Parent\n  - Sibling\n    - deep\n  - Child ==> x\n";
        assert_eq!(breadcrumb(markdown, "Child ==> x"), "<ul>\n<li>Parent\n<ul>");
    }

    #[test]
    fn headings_outermost_first() {
        let markdown = "# Top\n\n## Section\n\n- item ==> x\n";
        assert_eq!(
            breadcrumb(markdown, "item ==> x"),
            "<h1>Top</h1>\n<h2>Section</h2>\n<ul>"
        );
    }

    #[test]
    fn sibling_headings_are_skipped() {
        let markdown = "# Top\n\n## Old\n\n## Current\n\n### Sub\n\n- item ==> x\n";
        assert_eq!(
            breadcrumb(markdown, "item ==> x"),
            "<h1>Top</h1>\n<h2>Current</h2>\n<h3>Sub</h3>\n<ul>"
        );
    }

    #[test]
    fn sixth_level_heading_is_kept() {
        let markdown = "###### Deep\n\n- item ==> x\n";
        assert_eq!(breadcrumb(markdown, "item ==> x"), "<h6>Deep</h6>\n<ul>");
    }

    #[test]
    fn top_level_paragraph_gets_headings_only() {
        let tokens = Tokenizer::new().parse("# Title\n\nSome ~~text~~\n");
        let paragraph = tokens
            .iter()
            .position(|t| t.kind == TokenKind::ParagraphOpen)
            .unwrap();
        let indices = ancestor_context(&tokens, paragraph);
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn context_is_in_document_order() {
        let tokens = Tokenizer::new().parse("# T\n\n- a\n  - b ==> c\n");
        let anchor = anchor_of(&tokens, "b ==> c");
        let indices = ancestor_context(&tokens, anchor);
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert!(indices.iter().all(|&i| i < anchor));
    }

    #[test]
    fn quoted_paragraph_keeps_only_the_quote() {
        let tokens = Tokenizer::new().parse("> earlier\n>\n> b ~~c~~\n");
        let anchor = tokens
            .iter()
            .rposition(|t| t.kind == TokenKind::ParagraphOpen)
            .unwrap();
        let indices = ancestor_context(&tokens, anchor);
        assert_eq!(indices, vec![0]);
        assert_eq!(
            render_breadcrumb(&Renderer::new(), &tokens, &indices),
            "<blockquote>"
        );
    }

    #[test]
    fn quoted_list_item_keeps_quote_and_list() {
        assert_eq!(
            breadcrumb("> intro\n>\n> - a ==> b\n", "a ==> b"),
            "<blockquote>\n<ul>"
        );
    }

    #[test]
    fn quoted_code_block_is_not_context() {
        let tokens = Tokenizer::new().parse("> ```\n> code\n> ```\n>\n> b ~~c~~\n");
        let anchor = tokens
            .iter()
            .position(|t| t.kind == TokenKind::ParagraphOpen)
            .unwrap();
        assert_eq!(ancestor_context(&tokens, anchor), vec![0]);
    }

    #[test]
    fn loose_parent_item_keeps_its_paragraphs() {
        assert_eq!(
            breadcrumb("- Parent\n\n  more\n\n  - Child ==> x\n", "Child ==> x"),
            "<ul>\n<li>\n<p>Parent</p>\n<p>more</p>\n<ul>"
        );
    }

    #[test]
    fn out_of_bounds_anchor_is_empty() {
        let tokens = Tokenizer::new().parse("text\n");
        assert!(ancestor_context(&tokens, 99).is_empty());
    }
}
