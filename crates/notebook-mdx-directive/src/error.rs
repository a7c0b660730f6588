//! Error types for directive processing
//!
//! Unlike rendering, a directive that cannot be expanded fails the whole
//! document: a page that silently drops a notebook is worse than a failed
//! build.

use notebook_mdx_model::NotebookError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for `::notebook` directive processing
#[derive(Error, Debug)]
pub enum DirectiveError {
    /// `:notebook` was used inline
    #[error("Unexpected `:notebook` text directive at line {line}, use two colons for a leaf directive or three colons for a container directive")]
    TextDirective { line: usize },

    /// The directive has no `file` attribute (or an empty one)
    #[error("Unexpected missing `file` attribute on `notebook` directive at line {line}")]
    MissingFile { line: usize },

    /// The attribute list could not be parsed
    #[error("Malformed `notebook` directive at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// A `:::notebook` container was never closed
    #[error("Unclosed `notebook` container directive opened at line {line}")]
    UnclosedContainer { line: usize },

    /// The referenced notebook could not be read or is not valid JSON
    #[error("Failed to process notebook file \"{}\": {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: NotebookError,
    },

    /// Pre-rendering the notebook could not settle its deferred slots
    #[error("Failed to render notebook file \"{}\": {reason}", path.display())]
    Render { path: PathBuf, reason: String },
}

impl DirectiveError {
    /// One-based source line the error refers to, when there is one
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::TextDirective { line }
            | Self::MissingFile { line }
            | Self::Malformed { line, .. }
            | Self::UnclosedContainer { line } => Some(*line),
            Self::Load { .. } | Self::Render { .. } => None,
        }
    }
}

/// Result type alias for directive operations
pub type Result<T> = std::result::Result<T, DirectiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_names_path_and_cause() {
        let err = DirectiveError::Load {
            path: PathBuf::from("/docs/missing.ipynb"),
            source: NotebookError::ValidationError("`cells` must be an array".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to process notebook file \"/docs/missing.ipynb\": Invalid notebook format: `cells` must be an array"
        );
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_text_directive_message() {
        let err = DirectiveError::TextDirective { line: 3 };
        let message = err.to_string();
        assert!(message.contains("`:notebook` text directive"), "{message}");
        assert!(message.contains("use two colons"), "{message}");
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_missing_file_message() {
        let err = DirectiveError::MissingFile { line: 7 };
        assert!(err
            .to_string()
            .starts_with("Unexpected missing `file` attribute on `notebook` directive"));
    }
}
