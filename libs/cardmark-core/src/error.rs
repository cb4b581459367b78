//! Error types for cardmark-core.

use thiserror::Error;

/// Result type alias using ExtractError.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Per-file failures. Dropped candidates are not errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file card needs {required} `---` delimiter lines, found {found}")]
    ContentShape { found: usize, required: usize },

    #[error("invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_shape_display() {
        let error = ExtractError::ContentShape {
            found: 2,
            required: 3,
        };
        assert_eq!(
            error.to_string(),
            "file card needs 3 `---` delimiter lines, found 2"
        );
    }
}
