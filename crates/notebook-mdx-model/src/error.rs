//! Error types for notebook parsing

use thiserror::Error;

/// Error type for notebook parsing operations
#[derive(Error, Debug)]
pub enum NotebookError {
    /// I/O error when reading notebook file
    #[error("Failed to read notebook file: {0}")]
    IoError(#[from] std::io::Error),

    /// The document text is not valid JSON
    #[error("Failed to parse notebook JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The JSON parsed but is not shaped like a notebook
    /// (not an object, or `cells` missing or not an array)
    #[error("Invalid notebook format: {0}")]
    ValidationError(String),
}

impl NotebookError {
    /// Short machine-friendly label for the error family
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::IoError(_) => "io",
            Self::ParseError(_) => "parse",
            Self::ValidationError(_) => "validation",
        }
    }
}

/// Result type alias for notebook operations
pub type Result<T> = std::result::Result<T, NotebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let nb_err: NotebookError = err.into();
        assert!(matches!(nb_err, NotebookError::ParseError(_)));
        assert_eq!(nb_err.kind(), "parse");
        assert!(
            nb_err.to_string().starts_with("Failed to parse notebook JSON"),
            "unexpected message: {nb_err}"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = NotebookError::ValidationError("`cells` must be an array".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid notebook format: `cells` must be an array"
        );
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let nb_err: NotebookError = io_err.into();
        match nb_err {
            NotebookError::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("Expected IoError variant, got {other:?}"),
        }
    }
}
