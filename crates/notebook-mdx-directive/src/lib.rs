//! # notebook-mdx-directive
//!
//! Expands `notebook` directives in MDX documents.
//!
//! ```markdown
//! ::notebook{file="./analysis.ipynb" hideCode}
//!
//! :::notebook{file="./training.ipynb" interactive=false}
//! Training loss per epoch.
//! :::
//! ```
//!
//! A leaf directive becomes a component element carrying the notebook JSON;
//! a container directive also passes its content as the `caption` prop.
//! The inline form `:notebook[...]` is rejected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notebook_mdx_directive::{process_document, DirectiveOptions, EmitMode};
//! use std::path::Path;
//!
//! let source = std::fs::read_to_string("docs/guide.mdx")?;
//! let options = DirectiveOptions::default().with_emit(EmitMode::Component);
//! let processed = process_document(&source, Some(Path::new("docs/guide.mdx")), &options)?;
//! for dependency in &processed.dependencies {
//!     println!("depends on {}", dependency.display());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Attributes
//!
//! - `file` (required): notebook path, relative to the base directory
//! - `hideCode`, `showOutputs`, `showCellNumbers`, `showLanguageIndicators`,
//!   `interactive`: boolean props; bare or `"true"` is true, anything else
//!   is false
//! - anything else is passed through as a string prop (`.class` becomes
//!   `className`)

pub mod attributes;
pub mod error;
pub mod loader;
pub mod syntax;

pub use attributes::Attributes;
pub use error::{DirectiveError, Result};
pub use loader::{
    component_props, normalize_path, parse_bool_attribute, process_document, render_options,
    DirectiveOptions, DirectiveProcessor, EmitMode, ProcessedDocument, PropValue,
    BOOLEAN_OPTIONS, DEFAULT_COMPONENT_NAME,
};
pub use syntax::{scan, Directive, DirectiveKind, Segment, DIRECTIVE_NAME};
