//! Per-document extraction: scanner, classifier, context and synthesis wired
//! together.

use std::collections::BTreeSet;

use tracing::debug;

use crate::classify::{classify, extract_tags, CardShape};
use crate::context::{ancestor_context, render_breadcrumb};
use crate::document::Document;
use crate::error::Result;
use crate::note::Note;
use crate::render::Renderer;
use crate::scanner::scan_regions;
use crate::synth::{cloze_sides, synthesize_file, synthesize_inline, synthesize_list};
use crate::types::{Card, CardContent, CardRegion, ClozeRegion, Direction, ExtractSettings};
use crate::tokenizer::Tokenizer;

/// Turns documents into cards.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    tokenizer: Tokenizer,
    renderer: Renderer,
    settings: ExtractSettings,
}

impl Extractor {
    pub fn new(tokenizer: Tokenizer, settings: ExtractSettings) -> Self {
        Self {
            tokenizer,
            renderer: Renderer::new(),
            settings,
        }
    }

    pub fn parse(&self, text: impl Into<String>) -> Result<Document> {
        Document::parse(text, &self.tokenizer)
    }

    /// Extract every card of a document.
    ///
    /// The file card comes first, then separator cards, then cloze spans,
    /// each in document order.
    pub fn extract(&self, document: &Document, file_path: &str) -> Result<Vec<Card>> {
        let mut cards = Vec::new();
        let mut file_front = None;

        if document.has_tag(&self.settings.file_card_tag) {
            let (card, front) = self.file_card(document, file_path)?;
            cards.push(card);
            file_front = Some(front);
        }

        let regions = scan_regions(&document.tokens, &self.tokenizer);
        for region in &regions.cards {
            if let Some(card) = self.separator_card(document, region, file_path, file_front.as_deref()) {
                cards.push(card);
            }
        }
        for region in &regions.clozes {
            cards.push(self.cloze_card(document, region, file_path, file_front.as_deref()));
        }

        debug!(file_path, cards = cards.len(), "extracted cards");
        Ok(cards)
    }

    pub fn extract_text(&self, text: impl Into<String>, file_path: &str) -> Result<Vec<Card>> {
        let document = self.parse(text)?;
        self.extract(&document, file_path)
    }

    pub fn extract_notes(&self, text: impl Into<String>, file_path: &str) -> Result<Vec<Note>> {
        Ok(self
            .extract_text(text, file_path)?
            .iter()
            .map(Note::assemble)
            .collect())
    }

    /// Whole-file card and its rendered front.
    fn file_card(&self, document: &Document, file_path: &str) -> Result<(Card, String)> {
        let sides = synthesize_file(document.body(), &self.tokenizer)?;
        let front = self.renderer.render(&sides.front);

        let content = if document.has_tag(&self.settings.incremental_tag) {
            let tokens = cloze_sides(sides, Direction::Forward, CardShape::List, true);
            CardContent::Cloze {
                text: self.renderer.render(&tokens),
            }
        } else {
            CardContent::Basic {
                front: front.clone(),
                back: self.renderer.render(&sides.back),
            }
        };

        let card = Card {
            content,
            tags: document.tags.clone(),
            file_path: file_path.to_string(),
        };
        Ok((card, front))
    }

    fn separator_card(
        &self,
        document: &Document,
        region: &CardRegion,
        file_path: &str,
        file_front: Option<&str>,
    ) -> Option<Card> {
        let tokens = &document.tokens;
        let class = classify(tokens, region);
        let sides = match class.shape {
            CardShape::Inline => synthesize_inline(tokens, region, &class)?,
            CardShape::List => synthesize_list(tokens, region)?,
        };

        let tags: BTreeSet<String> = document.tags.union(&class.tags).cloned().collect();
        let incremental = tags.contains(&self.settings.incremental_tag);
        let body = cloze_sides(sides, region.direction, class.shape, incremental);

        let mut text = self.context(document, region.open_index, file_front);
        text.push_str(&self.renderer.render(&body));

        Some(Card {
            content: CardContent::Cloze { text },
            tags,
            file_path: file_path.to_string(),
        })
    }

    fn cloze_card(
        &self,
        document: &Document,
        region: &ClozeRegion,
        file_path: &str,
        file_front: Option<&str>,
    ) -> Card {
        let mut body = document.tokens[region.open_index..region.inline_index].to_vec();
        body.push(region.replacement.clone());

        let mut text = self.context(document, region.open_index, file_front);
        text.push_str(&self.renderer.render(&body));

        let tags = document
            .tags
            .union(&extract_tags(&region.replacement.content))
            .cloned()
            .collect();

        Card {
            content: CardContent::Cloze { text },
            tags,
            file_path: file_path.to_string(),
        }
    }

    /// Breadcrumb for the anchor at `open_index`, followed by the file front
    /// when the document is a file card.
    fn context(&self, document: &Document, open_index: usize, file_front: Option<&str>) -> String {
        let indices = ancestor_context(&document.tokens, open_index);
        let mut context = render_breadcrumb(&self.renderer, &document.tokens, &indices);
        if let Some(front) = file_front {
            context.push_str(front);
        }
        context
    }
}
