//! Error types for the rendering pipeline.
//!
//! Rendering a parsed notebook never fails as a whole. Individual outputs can
//! still go wrong (an unknown MIME bundle, broken base64, LaTeX the converter
//! rejects, a chart engine that is not available); those are reported as
//! [`Degradation`] values next to the rendered tree, and the output shows a
//! visible fallback instead.

use serde::Serialize;
use thiserror::Error;

/// A non-fatal, per-output render failure.
///
/// Every degradation has a visible fallback in the rendered tree. They are
/// logged with `log::warn!` when recorded and collected on
/// [`RenderedNotebook::degradations`](crate::RenderedNotebook::degradations).
///
/// # Examples
///
/// ```
/// use notebook_mdx_core::Degradation;
///
/// let d = Degradation::Math("unknown command \\foo".to_string());
/// assert_eq!(d.kind(), "math");
/// assert!(d.to_string().contains("\\foo"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum Degradation {
    /// The output bundle had data but no representation this renderer can show
    #[error("No renderable representation among: {}", mime_types.join(", "))]
    UnrenderableOutput { mime_types: Vec<String> },

    /// Syntax highlighting failed; plain text was rendered instead
    #[error("Highlighting failed for {language}: {reason}")]
    Highlight { language: String, reason: String },

    /// LaTeX could not be converted to MathML
    #[error("Math rendering failed: {0}")]
    Math(String),

    /// The chart engine could not render a chart spec
    #[error("Chart rendering failed: {0}")]
    Chart(String),

    /// An image payload could not be decoded
    #[error("Invalid {mime} image data: {reason}")]
    Image { mime: String, reason: String },

    /// A JSON payload could not be pretty-printed
    #[error("JSON output could not be formatted: {0}")]
    Json(String),
}

impl Degradation {
    /// Short category name, stable across versions
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnrenderableOutput { .. } => "unrenderableOutput",
            Self::Highlight { .. } => "highlight",
            Self::Math(_) => "math",
            Self::Chart(_) => "chart",
            Self::Image { .. } => "image",
            Self::Json(_) => "json",
        }
    }
}

/// Errors raised by a [`HighlightEngine`](crate::highlight::HighlightEngine)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    /// The engine has not finished loading its grammars
    #[error("Highlighter is not ready")]
    NotReady,

    /// The engine failed while tokenizing
    #[error("Highlighting failed: {0}")]
    Failed(String),
}

/// Errors raised by a [`ChartEngine`](crate::render::chart::ChartEngine)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    /// No chart engine is installed or the engine failed to load
    #[error("Chart engine unavailable: {0}")]
    Unavailable(String),

    /// The payload is not a usable chart spec
    #[error("Invalid chart spec: {0}")]
    InvalidSpec(String),

    /// The render was abandoned before completion
    #[error("Chart render cancelled")]
    Cancelled,
}

/// Errors raised when starting hydration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HydrateError {
    /// Hydration tasks need a Tokio runtime to run on
    #[error("Hydration requires a running Tokio runtime")]
    NoRuntime,
}

impl From<ChartError> for Degradation {
    fn from(err: ChartError) -> Self {
        Self::Chart(err.to_string())
    }
}
