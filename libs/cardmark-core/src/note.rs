//! Card assembly into model-ordered notes.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{Card, CardContent};

/// Note field names known to the models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    FilePath,
    Context,
    Front,
    Back,
    Text,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Self::FilePath => "FilePath",
            Self::Context => "Context",
            Self::Front => "Front",
            Self::Back => "Back",
            Self::Text => "Text",
        }
    }
}

/// Note models with a fixed identity and field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardModel {
    BasicWithContext,
    ClozeWithContext,
}

impl CardModel {
    pub fn id(self) -> u64 {
        match self {
            Self::BasicWithContext => 1874134123,
            Self::ClozeWithContext => 1874134125,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::BasicWithContext => "Basic with Context",
            Self::ClozeWithContext => "Cloze with Context",
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            Self::BasicWithContext => &[Field::FilePath, Field::Context, Field::Front, Field::Back],
            Self::ClozeWithContext => &[Field::FilePath, Field::Context, Field::Text],
        }
    }

    pub fn for_content(content: &CardContent) -> Self {
        match content {
            CardContent::Basic { .. } => Self::BasicWithContext,
            CardContent::Cloze { .. } => Self::ClozeWithContext,
        }
    }
}

impl Card {
    /// Value of `field`, or `None` when this card does not carry it.
    pub fn field(&self, field: Field) -> Option<&str> {
        match (field, &self.content) {
            (Field::FilePath, _) => Some(&self.file_path),
            (Field::Front, CardContent::Basic { front, .. }) => Some(front),
            (Field::Back, CardContent::Basic { back, .. }) => Some(back),
            (Field::Text, CardContent::Cloze { text }) => Some(text),
            _ => None,
        }
    }
}

/// Note record handed to the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub model: CardModel,
    /// Values in `model.fields()` order.
    pub fields: Vec<String>,
    pub tags: BTreeSet<String>,
}

impl Note {
    /// Assemble a card into the model matching its content.
    pub fn assemble(card: &Card) -> Self {
        Self::assemble_as(card, CardModel::for_content(&card.content))
    }

    /// Assemble a card into `model`. Missing fields are empty; fields the
    /// model lacks are dropped.
    pub fn assemble_as(card: &Card, model: CardModel) -> Self {
        let fields = model
            .fields()
            .iter()
            .map(|&field| card.field(field).unwrap_or_default().to_string())
            .collect();

        Self {
            model,
            fields,
            tags: card.tags.clone(),
        }
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.model
            .fields()
            .iter()
            .position(|&f| f == field)
            .and_then(|index| self.fields.get(index))
            .map(String::as_str)
    }

    /// Stable identifier derived from the model and field values.
    pub fn guid(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.model.id().to_le_bytes());
        for value in &self.fields {
            hasher.update(value.as_bytes());
            hasher.update([0x1f]);
        }

        hasher.finalize()[..8]
            .iter()
            .fold(String::with_capacity(16), |mut hex, byte| {
                let _ = write!(hex, "{:02x}", byte);
                hex
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn basic() -> Card {
        Card {
            content: CardContent::Basic {
                front: "<p>A</p>".to_string(),
                back: "<p>B</p>".to_string(),
            },
            tags: ["card".to_string()].into_iter().collect(),
            file_path: "deck/file.md".to_string(),
        }
    }

    fn cloze() -> Card {
        Card {
            content: CardContent::Cloze {
                text: "{{c1:: x }}".to_string(),
            },
            tags: BTreeSet::new(),
            file_path: "file.md".to_string(),
        }
    }

    #[test]
    fn basic_fields_in_model_order() {
        let note = Note::assemble(&basic());
        assert_eq!(note.model, CardModel::BasicWithContext);
        assert_eq!(note.fields, vec!["deck/file.md", "", "<p>A</p>", "<p>B</p>"]);
        assert!(note.tags.contains("card"));
    }

    #[test]
    fn cloze_fields_in_model_order() {
        let note = Note::assemble(&cloze());
        assert_eq!(note.model, CardModel::ClozeWithContext);
        assert_eq!(note.fields, vec!["file.md", "", "{{c1:: x }}"]);
        assert_eq!(note.field(Field::Text), Some("{{c1:: x }}"));
        assert_eq!(note.field(Field::Front), None);
    }

    #[test]
    fn fields_missing_from_model_are_dropped() {
        let note = Note::assemble_as(&basic(), CardModel::ClozeWithContext);
        assert_eq!(note.fields, vec!["deck/file.md", "", ""]);
    }

    #[test]
    fn model_identity() {
        assert_eq!(CardModel::BasicWithContext.id(), 1874134123);
        assert_eq!(CardModel::ClozeWithContext.name(), "Cloze with Context");
        assert_eq!(Field::FilePath.name(), "FilePath");
    }

    #[test]
    fn guid_is_stable_and_content_sensitive() {
        let first = Note::assemble(&cloze());
        let second = Note::assemble(&cloze());
        assert_eq!(first.guid(), second.guid());
        assert_eq!(first.guid().len(), 16);

        let mut other = cloze();
        other.file_path = "other.md".to_string();
        assert_ne!(first.guid(), Note::assemble(&other).guid());
    }
}
