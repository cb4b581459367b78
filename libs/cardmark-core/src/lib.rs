//! Flashcard extraction from markdown notes.
//!
//! Provides:
//! - Tokenizer adapter producing a flat, level-annotated token sequence
//! - HTML renderer for token slices
//! - Region scanner for `==>`/`<==`/`<==>` cards and `~~cloze~~` spans
//! - Breadcrumb context builder (headings and list ancestors)
//! - Card synthesis with cloze injection and numbering
//! - Note assembly into the "Basic with Context" and "Cloze with Context" models

pub mod classify;
pub mod context;
pub mod document;
pub mod error;
pub mod extract;
pub mod note;
pub mod render;
pub mod scanner;
pub mod synth;
pub mod token;
pub mod tokenizer;
pub mod types;

pub use classify::{classify, extract_tags, CardShape, Classification};
pub use document::Document;
pub use error::{ExtractError, Result};
pub use extract::Extractor;
pub use note::{CardModel, Field, Note};
pub use render::Renderer;
pub use scanner::{scan_regions, Regions};
pub use token::{Nesting, Token, TokenKind, TokenSequence};
pub use tokenizer::Tokenizer;
pub use types::{Card, CardContent, CardRegion, ClozeRegion, Direction, ExtractSettings};
