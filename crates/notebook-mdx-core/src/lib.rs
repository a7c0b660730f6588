//! # notebook-mdx-core
//!
//! Rendering pipeline that turns a parsed Jupyter notebook into markup for
//! MDX documentation pages.
//!
//! ## Quick Start
//!
//! ```rust
//! use notebook_mdx_core::{render_notebook_json, RenderOptions};
//!
//! let json = r##"{
//!     "metadata": {"kernelspec": {"language": "python"}},
//!     "cells": [
//!         {"cell_type": "markdown", "source": "# Hi"},
//!         {"cell_type": "code", "source": "print(1)", "execution_count": 1,
//!          "outputs": [{"output_type": "execute_result", "execution_count": 1,
//!                       "data": {"text/plain": "1"}}]}
//!     ]
//! }"##;
//!
//! let rendered = render_notebook_json(json, &RenderOptions::default());
//! let html = rendered.to_html();
//! assert!(html.contains("<h1>Hi</h1>"));
//! assert!(html.contains("In [1]:"));
//! assert!(html.contains("Out[1]:"));
//! ```
//!
//! ## Pipeline
//!
//! - [`walker`] iterates cells in stored order and resolves each cell's
//!   language (cell metadata, then the kernel language)
//! - [`mime`] picks exactly one representation per rich output
//! - [`render`] converts that representation into a [`Node`]; failures are
//!   recorded as [`Degradation`]s with a visible fallback
//! - [`hydrate`] resolves slots left for asynchronous capabilities (chart
//!   engine, a highlighter that is still loading)
//! - [`styles`] registers the notebook stylesheet once per [`RenderTarget`]
//!
//! ## Output
//!
//! The [`Node`] tree serializes to an HTML fragment with
//! [`Node::to_html`] and to JSON with `serde`.

/// Error and degradation types
pub mod error;
/// Syntax highlighting
pub mod highlight;
/// Deferred slot hydration
pub mod hydrate;
/// Minimal markdown transform
pub mod markdown;
/// MIME representation selection
pub mod mime;
/// Content tree
pub mod node;
/// Render options
pub mod options;
/// Per-representation output renderers
pub mod render;
/// Stylesheet registration
pub mod styles;
/// Cell walker and render entry points
pub mod walker;

pub use error::{ChartError, Degradation, HighlightError, HydrateError};
pub use highlight::{HighlightEngine, Highlighting, SyntectHighlighter};
pub use hydrate::{DeferredJob, DeferredRender, RenderedNotebook, RenderedView};
pub use mime::{MimeKind, Payload, RenderHints, Representation};
pub use node::{Element, Node, SlotId};
pub use options::RenderOptions;
pub use render::chart::{ChartEngine, ChartSpec, PlotlyEmbedEngine};
pub use render::{HtmlSanitizer, DEFAULT_ID_PREFIX};
pub use styles::{RenderTarget, STYLESHEET_ID};
pub use walker::{
    detect_cell_language, error_block, render_notebook, render_notebook_json, NotebookRenderer,
};

// Re-export the document model so callers need only one dependency
pub use notebook_mdx_model as model;
