//! Document loading: front matter, tags, and the body token sequence.
//!
//! # Format
//! ```markdown
//! ---
//! tags: [card, biology]
//! ---
//!
//! Body text.
//! ```

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::Result;
use crate::token::TokenSequence;
use crate::tokenizer::Tokenizer;

/// A parsed markdown document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Full source text, front matter included.
    pub text: String,
    /// Tokens of the body after the front matter.
    pub tokens: TokenSequence,
    /// Tags declared in the front matter.
    pub tags: BTreeSet<String>,
    body_start: usize,
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    /// A scalar or a list of scalars.
    #[serde(default)]
    tags: Option<Value>,
}

impl Document {
    pub fn parse(text: impl Into<String>, tokenizer: &Tokenizer) -> Result<Self> {
        let text = text.into();
        let (yaml, body_start) = match split_front_matter(&text) {
            Some((yaml, body_start)) => (Some(yaml), body_start),
            None => (None, 0),
        };

        let tags = match yaml {
            Some(yaml) => parse_tags(yaml)?,
            None => BTreeSet::new(),
        };
        let tokens = tokenizer.parse(&text[body_start..]);

        Ok(Self {
            text,
            tokens,
            tags,
            body_start,
        })
    }

    /// Source text after the front matter.
    pub fn body(&self) -> &str {
        &self.text[self.body_start..]
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

fn parse_tags(yaml: &str) -> Result<BTreeSet<String>> {
    if yaml.trim().is_empty() {
        return Ok(BTreeSet::new());
    }

    let front_matter: Option<FrontMatter> = serde_yaml::from_str(yaml)?;
    let tags: Vec<String> = match front_matter.unwrap_or_default().tags {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(value) => scalar_text(&value).into_iter().collect(),
        None => Vec::new(),
    };
    Ok(tags
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Returns the YAML between the opening `---` line and the closing `---` or
/// `...` line, and the byte offset where the body starts.
fn split_front_matter(text: &str) -> Option<(&str, usize)> {
    let first_end = text.find('\n')?;
    if text[..first_end].trim_end() != "---" {
        return None;
    }

    let yaml_start = first_end + 1;
    let mut offset = yaml_start;
    for line in text[yaml_start..].split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((&text[yaml_start..offset], offset + line.len()));
        }
        offset += line.len();
    }

    None
}
