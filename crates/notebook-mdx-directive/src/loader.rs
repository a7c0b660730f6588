//! Expanding `notebook` directives into MDX
//!
//! Each directive names a notebook file. The file is read once, checked to be
//! JSON, and replaced by either a component element that receives the JSON
//! as a prop, or by markup pre-rendered with [`NotebookRenderer`].

use crate::error::{DirectiveError, Result};
use crate::syntax::{scan, Directive, DirectiveKind, Segment};
use notebook_mdx_core::markdown::markdown_to_html;
use notebook_mdx_core::{NotebookRenderer, RenderOptions, RenderTarget, RenderedNotebook, STYLESHEET_ID};
use notebook_mdx_model::NotebookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Component name used when none is configured
pub const DEFAULT_COMPONENT_NAME: &str = "NotebookLoader";

/// Attributes converted to boolean props
pub const BOOLEAN_OPTIONS: [&str; 5] = [
    "hideCode",
    "showOutputs",
    "showCellNumbers",
    "showLanguageIndicators",
    "interactive",
];

/// What a directive is replaced with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// `<NotebookLoader notebookDataJson={...} />`, rendered at page runtime
    #[default]
    Component,
    /// Pre-rendered markup via `dangerouslySetInnerHTML`.
    ///
    /// Injected markup never runs scripts, so charts always use their static
    /// view here regardless of `interactive`.
    Html,
}

impl fmt::Display for EmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::Html => write!(f, "html"),
        }
    }
}

impl FromStr for EmitMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "component" => Ok(Self::Component),
            "html" => Ok(Self::Html),
            other => Err(format!(
                "unknown emit mode '{other}' (expected 'component' or 'html')"
            )),
        }
    }
}

/// Configuration for directive expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveOptions {
    /// Directory `file` attributes are resolved against. Defaults to the
    /// referencing document's directory, else the working directory.
    pub base_dir: Option<PathBuf>,
    /// Element name emitted in [`EmitMode::Component`]
    pub component_name: String,
    pub emit: EmitMode,
    /// Base options for [`EmitMode::Html`]; directive attributes override them
    pub render: RenderOptions,
    /// Emit the notebook stylesheet before the first pre-rendered notebook
    pub include_styles: bool,
}

impl Default for DirectiveOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            component_name: DEFAULT_COMPONENT_NAME.to_string(),
            emit: EmitMode::Component,
            render: RenderOptions::default(),
            include_styles: true,
        }
    }
}

impl DirectiveOptions {
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    #[must_use]
    pub fn with_component_name(mut self, name: impl Into<String>) -> Self {
        self.component_name = name.into();
        self
    }

    #[must_use]
    pub const fn with_emit(mut self, emit: EmitMode) -> Self {
        self.emit = emit;
        self
    }

    #[must_use]
    pub const fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    #[must_use]
    pub const fn with_styles(mut self, include_styles: bool) -> Self {
        self.include_styles = include_styles;
        self
    }
}

/// A prop value on the emitted component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropValue {
    Str(String),
    Bool(bool),
}

impl PropValue {
    /// JSX attribute value, e.g. `{"text"}` or `{true}`
    fn to_jsx(&self) -> String {
        match self {
            Self::Str(s) => format!("{{{}}}", js_string(s)),
            Self::Bool(b) => format!("{{{b}}}"),
        }
    }
}

/// Interpret a boolean directive attribute: bare or `"true"` means true
#[inline]
#[must_use]
pub fn parse_bool_attribute(value: &str) -> bool {
    value.is_empty() || value == "true"
}

/// Result of expanding every directive in a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessedDocument {
    /// The MDX source with directives replaced
    pub content: String,
    /// Resolved notebook paths, deduplicated in first-seen order
    pub dependencies: Vec<PathBuf>,
    /// Number of directives expanded
    pub notebooks: usize,
}

/// Expand all `notebook` directives in `source`.
///
/// `document_path` is the path of the MDX file being processed, used to
/// resolve relative `file` attributes when no base directory is configured.
///
/// # Errors
///
/// Fails on the first directive that is malformed, has no `file`, names a
/// file that cannot be read, or whose content is not valid JSON.
///
/// # Examples
///
/// ```
/// use notebook_mdx_directive::{process_document, DirectiveOptions};
///
/// let processed = process_document("# No notebooks here\n", None, &DirectiveOptions::default())?;
/// assert_eq!(processed.content, "# No notebooks here\n");
/// assert!(processed.dependencies.is_empty());
/// # Ok::<(), notebook_mdx_directive::DirectiveError>(())
/// ```
pub fn process_document(
    source: &str,
    document_path: Option<&Path>,
    options: &DirectiveOptions,
) -> Result<ProcessedDocument> {
    DirectiveProcessor::new(options.clone()).process(source, document_path)
}

/// Expands directives with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct DirectiveProcessor {
    options: DirectiveOptions,
}

impl DirectiveProcessor {
    #[must_use]
    pub const fn new(options: DirectiveOptions) -> Self {
        Self { options }
    }

    #[inline]
    #[must_use]
    pub const fn options(&self) -> &DirectiveOptions {
        &self.options
    }

    /// Read an MDX file and expand its directives.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::Load`] if the MDX file itself cannot be
    /// read, otherwise as [`process_document`].
    pub fn process_file(&self, path: &Path) -> Result<ProcessedDocument> {
        let source = std::fs::read_to_string(path).map_err(|e| DirectiveError::Load {
            path: path.to_path_buf(),
            source: NotebookError::IoError(e),
        })?;
        self.process(&source, Some(path))
    }

    /// Expand directives in `source`; see [`process_document`].
    ///
    /// # Errors
    ///
    /// See [`process_document`].
    pub fn process(&self, source: &str, document_path: Option<&Path>) -> Result<ProcessedDocument> {
        let base_dir = self.base_dir(document_path)?;
        let mut processed = ProcessedDocument::default();
        let mut target = RenderTarget::new();

        for segment in scan(source)? {
            match segment {
                Segment::Text(text) => processed.content.push_str(&text),
                Segment::Directive(directive) => {
                    let path = resolve_file(&directive, &base_dir)?;
                    log::debug!(
                        "loading notebook {} (line {})",
                        path.display(),
                        directive.line
                    );
                    let json = load_json(&path)?;
                    let element = match self.options.emit {
                        EmitMode::Component => self.emit_component(&directive, &json),
                        EmitMode::Html => self.emit_html(
                            &directive,
                            processed.notebooks,
                            &path,
                            &json,
                            &mut target,
                        )?,
                    };
                    processed.content.push_str(&element);
                    processed.notebooks += 1;
                    if !processed.dependencies.contains(&path) {
                        processed.dependencies.push(path);
                    }
                }
            }
        }

        Ok(processed)
    }

    fn base_dir(&self, document_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = &self.options.base_dir {
            return Ok(dir.clone());
        }
        if let Some(parent) = document_path.and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                return Ok(parent.to_path_buf());
            }
        }
        std::env::current_dir().map_err(|e| DirectiveError::Load {
            path: PathBuf::from("."),
            source: NotebookError::IoError(e),
        })
    }

    fn emit_component(&self, directive: &Directive, json: &serde_json::Value) -> String {
        let props = component_props(directive, json);
        let mut element = format!("<{}", self.options.component_name);
        for (name, value) in &props {
            element.push(' ');
            element.push_str(name);
            element.push('=');
            element.push_str(&value.to_jsx());
        }
        element.push_str(" />\n");
        element
    }

    fn emit_html(
        &self,
        directive: &Directive,
        index: usize,
        path: &Path,
        json: &serde_json::Value,
        target: &mut RenderTarget,
    ) -> Result<String> {
        let options = render_options(directive, self.options.render).with_interactive(false);
        let rendered = NotebookRenderer::new(options)
            .with_id_prefix(format!("nb{index}-"))
            .render_json(&json.to_string());
        let rendered = settle_blocking(rendered).map_err(|reason| DirectiveError::Render {
            path: path.to_path_buf(),
            reason,
        })?;

        let mut out = String::new();
        if self.options.include_styles && target.ensure_notebook_styles() {
            let css = target.stylesheet(STYLESHEET_ID).unwrap_or_default();
            out.push_str(&format!(
                "<style id=\"{STYLESHEET_ID}\" dangerouslySetInnerHTML={{{{__html: {}}}}} />\n",
                js_string(css)
            ));
        }

        let mut wrapper_attrs = String::new();
        if let Some(id) = directive.attributes.get("id") {
            wrapper_attrs.push_str(&format!(" id={}", PropValue::Str(id.to_string()).to_jsx()));
        }
        let class = match directive.attributes.get("class") {
            Some(extra) => PropValue::Str(format!("notebook-mdx {extra}")).to_jsx(),
            None => PropValue::Str("notebook-mdx".to_string()).to_jsx(),
        };
        let body = format!(
            "dangerouslySetInnerHTML={{{{__html: {}}}}}",
            js_string(&rendered.to_html())
        );

        match caption(directive) {
            Some(text) => {
                out.push_str(&format!("<figure className={class}{wrapper_attrs}>\n"));
                out.push_str(&format!("<div {body} />\n"));
                out.push_str(&format!(
                    "<figcaption dangerouslySetInnerHTML={{{{__html: {}}}}} />\n",
                    js_string(&markdown_to_html(&text))
                ));
                out.push_str("</figure>\n");
            }
            None => out.push_str(&format!("<div className={class}{wrapper_attrs} {body} />\n")),
        }
        Ok(out)
    }
}

/// Props passed to the component: the notebook JSON, every attribute except
/// `file`, and the caption of a container directive.
#[must_use]
pub fn component_props(directive: &Directive, json: &serde_json::Value) -> Vec<(String, PropValue)> {
    let mut props = vec![(
        "notebookDataJson".to_string(),
        PropValue::Str(json.to_string()),
    )];
    for (name, value) in directive.attributes.iter() {
        if name == "file" {
            continue;
        }
        let value = if BOOLEAN_OPTIONS.contains(&name) {
            PropValue::Bool(parse_bool_attribute(value))
        } else {
            PropValue::Str(value.to_string())
        };
        let name = if name == "class" { "className" } else { name };
        props.push((name.to_string(), value));
    }
    if let Some(text) = caption(directive) {
        props.push(("caption".to_string(), PropValue::Str(text)));
    }
    props
}

/// Render options for one directive: `base` overridden by boolean attributes
#[must_use]
pub fn render_options(directive: &Directive, base: RenderOptions) -> RenderOptions {
    let mut options = base;
    for (name, value) in directive.attributes.iter() {
        let flag = parse_bool_attribute(value);
        options = match name {
            "hideCode" => options.with_hide_code(flag),
            "showOutputs" => options.with_show_outputs(flag),
            "showCellNumbers" => options.with_show_cell_numbers(flag),
            "showLanguageIndicators" => options.with_show_language_indicators(flag),
            "interactive" => options.with_interactive(flag),
            _ => options,
        };
    }
    options
}

fn caption(directive: &Directive) -> Option<String> {
    if directive.kind != DirectiveKind::Container {
        return None;
    }
    let parts: Vec<&str> = [directive.label.as_deref(), directive.content.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

fn resolve_file(directive: &Directive, base_dir: &Path) -> Result<PathBuf> {
    let file = directive
        .attributes
        .get("file")
        .map(str::trim)
        .filter(|file| !file.is_empty())
        .ok_or(DirectiveError::MissingFile {
            line: directive.line,
        })?;
    Ok(normalize_path(&base_dir.join(file)))
}

fn load_json(path: &Path) -> Result<serde_json::Value> {
    let load_error = |source: NotebookError| DirectiveError::Load {
        path: path.to_path_buf(),
        source,
    };
    let text = std::fs::read_to_string(path).map_err(|e| load_error(e.into()))?;
    serde_json::from_str(&text).map_err(|e| load_error(e.into()))
}

/// Lexically resolve `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Hydrate any deferred slots before the markup is embedded.
///
/// Runs on a dedicated thread so this works whether or not the caller is
/// already inside a Tokio runtime.
fn settle_blocking(rendered: RenderedNotebook) -> std::result::Result<RenderedNotebook, String> {
    if rendered.is_settled() {
        return Ok(rendered);
    }
    let handle = std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| e.to_string())?;
        runtime
            .block_on(rendered.hydrated())
            .map_err(|e| e.to_string())
    });
    handle
        .join()
        .map_err(|_| "hydration thread panicked".to_string())?
}

/// Double-quoted JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;

    fn leaf(attrs: &str) -> Directive {
        Directive {
            kind: DirectiveKind::Leaf,
            line: 1,
            label: None,
            attributes: Attributes::parse(attrs).unwrap(),
            content: None,
        }
    }

    #[test]
    fn test_bool_attribute_rules() {
        assert!(parse_bool_attribute(""));
        assert!(parse_bool_attribute("true"));
        assert!(!parse_bool_attribute("false"));
        assert!(!parse_bool_attribute("yes"));
        assert!(!parse_bool_attribute("TRUE"));
    }

    #[test]
    fn test_component_props() {
        let directive = leaf(r#"file="a.ipynb" hideCode showOutputs=false title="Demo" .wide"#);
        let json = serde_json::json!({"cells": []});
        let props = component_props(&directive, &json);
        assert_eq!(
            props,
            vec![
                ("notebookDataJson".to_string(), PropValue::Str("{\"cells\":[]}".to_string())),
                ("hideCode".to_string(), PropValue::Bool(true)),
                ("showOutputs".to_string(), PropValue::Bool(false)),
                ("title".to_string(), PropValue::Str("Demo".to_string())),
                ("className".to_string(), PropValue::Str("wide".to_string())),
            ]
        );
    }

    #[test]
    fn test_container_caption_includes_label() {
        let directive = Directive {
            kind: DirectiveKind::Container,
            line: 1,
            label: Some("Figure 2".to_string()),
            attributes: Attributes::parse("file=a.ipynb").unwrap(),
            content: Some("Loss over *time*.\n".to_string()),
        };
        assert_eq!(
            caption(&directive).as_deref(),
            Some("Figure 2\n\nLoss over *time*.")
        );
        assert_eq!(caption(&leaf("file=a.ipynb")), None);
    }

    #[test]
    fn test_render_options_override() {
        let directive = leaf("file=a.ipynb hideCode interactive=false showCellNumbers=true");
        let options = render_options(&directive, RenderOptions::default().with_show_cell_numbers(false));
        assert!(options.hide_code);
        assert!(!options.interactive);
        assert!(options.show_cell_numbers);
        assert!(options.show_outputs, "absent attributes keep the base value");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/docs/guide/../notebooks/./a.ipynb")),
            PathBuf::from("/docs/notebooks/a.ipynb")
        );
        assert_eq!(normalize_path(Path::new("../a.ipynb")), PathBuf::from("../a.ipynb"));
        assert_eq!(normalize_path(Path::new("../../a.ipynb")), PathBuf::from("../../a.ipynb"));
    }

    #[test]
    fn test_missing_file_attribute() {
        let err = resolve_file(&leaf("hideCode"), Path::new("/docs")).unwrap_err();
        assert!(matches!(err, DirectiveError::MissingFile { line: 1 }));
        let err = resolve_file(&leaf("file=\"  \""), Path::new("/docs")).unwrap_err();
        assert!(matches!(err, DirectiveError::MissingFile { .. }));
    }

    #[test]
    fn test_emit_mode_parse() {
        assert_eq!("HTML".parse::<EmitMode>().unwrap(), EmitMode::Html);
        assert_eq!(EmitMode::Component.to_string(), "component");
        assert!("xml".parse::<EmitMode>().is_err());
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("a \"b\"\n"), r#""a \"b\"\n""#);
    }
}
