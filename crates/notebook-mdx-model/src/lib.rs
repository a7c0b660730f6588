//! # notebook-mdx-model
//!
//! Jupyter Notebook (.ipynb) document model for notebook-mdx.
//!
//! This crate turns notebook JSON (nbformat 4.x) into a closed, typed model:
//! - Markdown, code and raw cells (plus an `Unknown` variant for anything else)
//! - Cell outputs (stream, display data, execute results, errors, `Unknown`)
//! - MIME bundles with their per-type render hints
//! - Notebook metadata (kernel language fallback, opaque extras)
//!
//! Parsing is deliberately lenient below the top level: only unparsable JSON
//! and a missing or non-array `cells` field are errors.
//!
//! ## Example
//!
//! ```no_run
//! use notebook_mdx_model::parse_notebook;
//!
//! let notebook = parse_notebook("example.ipynb")?;
//! for cell in &notebook.cells {
//!     println!("{:?}: {:?}", cell.kind(), cell.source());
//! }
//! # Ok::<(), notebook_mdx_model::NotebookError>(())
//! ```

/// Error types for notebook parsing
pub mod error;
/// Jupyter notebook (ipynb) document model and parser
pub mod ipynb;

pub use error::{NotebookError, Result};
pub use ipynb::{
    join_multiline, parse_notebook, parse_notebook_from_str, parse_notebook_value, Cell,
    CellKind, CellMetadata, CodeCell, ErrorOutput, ExecuteResult, MimeBundle, NotebookDocument,
    NotebookMetadata, Output, OutputKind, RichOutput, StreamName, StreamOutput, TextCell,
};
