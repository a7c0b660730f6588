//! Notebook walker: cells in document order to a content tree.

use crate::highlight::{normalize_language, Highlighting};
use crate::hydrate::RenderedNotebook;
use crate::markdown::markdown_to_html;
use crate::mime::MIME_TEXT_MARKDOWN;
use crate::node::{Element, Node};
use crate::options::RenderOptions;
use crate::render::chart::{ChartEngine, PlotlyEmbedEngine};
use crate::render::{render_output, HtmlSanitizer, RenderContext, DEFAULT_ID_PREFIX};
use crate::styles::RenderTarget;
use notebook_mdx_model::{
    parse_notebook_from_str, Cell, CodeCell, NotebookDocument, Output, TextCell,
};
use std::sync::Arc;

/// Message shown for absent or empty notebook input
pub const NO_DATA_MESSAGE: &str = "No notebook data available";

/// Renders notebooks with a fixed set of options and capabilities.
///
/// # Examples
///
/// ```
/// use notebook_mdx_core::{NotebookRenderer, RenderOptions};
/// use notebook_mdx_core::highlight::Highlighting;
///
/// let renderer = NotebookRenderer::new(RenderOptions::default())
///     .with_highlighting(Highlighting::Disabled);
/// let rendered = renderer.render_json(r##"{"cells": [
///     {"cell_type": "markdown", "source": "# Title"}
/// ]}"##);
/// assert!(rendered.to_html().contains("<h1>Title</h1>"));
/// ```
#[derive(Clone)]
pub struct NotebookRenderer {
    options: RenderOptions,
    highlighting: Highlighting,
    sanitizer: Option<Arc<dyn HtmlSanitizer>>,
    chart_engine: Option<Arc<dyn ChartEngine>>,
    id_prefix: String,
}

impl NotebookRenderer {
    /// Renderer with syntect highlighting and the Plotly embed chart engine.
    ///
    /// Syntax definitions are loaded by the first render that highlights
    /// code, not here.
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            highlighting: Highlighting::Syntect,
            sanitizer: None,
            chart_engine: Some(Arc::new(PlotlyEmbedEngine::default())),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }

    /// Set how code is highlighted
    #[must_use]
    pub fn with_highlighting(mut self, highlighting: Highlighting) -> Self {
        self.highlighting = highlighting;
        self
    }

    /// Install a sanitizer for HTML, SVG and markdown
    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    /// Replace (or remove, with `None`) the chart engine
    #[must_use]
    pub fn with_chart_engine(mut self, engine: Option<Arc<dyn ChartEngine>>) -> Self {
        self.chart_engine = engine;
        self
    }

    /// Prefix for generated element ids such as chart containers
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Options used by this renderer
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a parsed notebook
    #[must_use]
    pub fn render(&self, notebook: &NotebookDocument) -> RenderedNotebook {
        log::debug!(
            "Rendering notebook: {} cells, kernel language {:?}",
            notebook.cells.len(),
            notebook.metadata.kernel_language
        );
        let mut ctx = RenderContext::new(
            &self.options,
            &self.highlighting,
            self.sanitizer.as_deref(),
            self.chart_engine.as_ref(),
        )
        .with_id_prefix(&self.id_prefix);
        let kernel_language = notebook.metadata.kernel_language.as_deref();

        let cells: Vec<Node> = notebook
            .cells
            .iter()
            .filter_map(|cell| render_cell(&mut ctx, cell, kernel_language))
            .collect();

        let (deferred, degradations) = ctx.finish();
        RenderedNotebook {
            root: Element::new("div").class("jp-notebook").children(cells).into(),
            deferred,
            degradations,
        }
    }

    /// Parse and render notebook JSON. Absent, empty or malformed input
    /// renders as a single error block.
    #[must_use]
    pub fn render_json(&self, json: &str) -> RenderedNotebook {
        if json.trim().is_empty() {
            return error_rendering(NO_DATA_MESSAGE);
        }
        match parse_notebook_from_str(json) {
            Ok(notebook) => self.render(&notebook),
            Err(e) => {
                log::warn!("Cannot render notebook: {e}");
                error_rendering(&format!("Error: {e}"))
            }
        }
    }

    /// Render into `target`, registering the notebook stylesheet once
    #[must_use]
    pub fn render_into(
        &self,
        target: &mut RenderTarget,
        notebook: &NotebookDocument,
    ) -> RenderedNotebook {
        target.ensure_notebook_styles();
        self.render(notebook)
    }
}

impl std::fmt::Debug for NotebookRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotebookRenderer")
            .field("options", &self.options)
            .field("highlighting", &self.highlighting)
            .field("id_prefix", &self.id_prefix)
            .field("sanitizer", &self.sanitizer.is_some())
            .field(
                "chart_engine",
                &self.chart_engine.as_ref().map(|engine| engine.name().to_string()),
            )
            .finish()
    }
}

/// Render a parsed notebook with the default renderer
#[must_use]
pub fn render_notebook(notebook: &NotebookDocument, options: &RenderOptions) -> RenderedNotebook {
    NotebookRenderer::new(*options).render(notebook)
}

/// Parse and render notebook JSON with the default renderer
#[must_use]
pub fn render_notebook_json(json: &str, options: &RenderOptions) -> RenderedNotebook {
    NotebookRenderer::new(*options).render_json(json)
}

/// `<div class="jp-notebook-error">message</div>`
#[must_use]
pub fn error_block(message: &str) -> Node {
    Element::new("div")
        .class("jp-notebook-error")
        .child(Node::text(message))
        .into()
}

fn error_rendering(message: &str) -> RenderedNotebook {
    RenderedNotebook {
        root: error_block(message),
        deferred: Vec::new(),
        degradations: Vec::new(),
    }
}

/// Language of a cell, before normalization.
///
/// Raw cells are always `"raw"`. Code cells use `metadata.vscode.languageId`,
/// `metadata.languageId`, `metadata.language`, then the kernel language.
/// Other cells have none.
#[must_use]
pub fn detect_cell_language(cell: &Cell, kernel_language: Option<&str>) -> Option<String> {
    match cell {
        Cell::Raw(_) => Some("raw".to_string()),
        Cell::Code(code) => code
            .metadata
            .language_hint()
            .or(kernel_language)
            .map(str::to_string),
        Cell::Markdown(_) | Cell::Unknown { .. } => None,
    }
}

fn render_cell(
    ctx: &mut RenderContext<'_>,
    cell: &Cell,
    kernel_language: Option<&str>,
) -> Option<Node> {
    let language = detect_cell_language(cell, kernel_language);
    match cell {
        Cell::Markdown(text) => Some(render_markdown_cell(ctx, text)),
        Cell::Code(code) => Some(render_code_cell(ctx, code, language.as_deref())),
        Cell::Raw(raw) => Some(render_raw_cell(ctx, raw)),
        Cell::Unknown { cell_type } => {
            log::debug!("Skipping cell of unknown type {cell_type:?}");
            None
        }
    }
}

fn render_markdown_cell(ctx: &mut RenderContext<'_>, cell: &TextCell) -> Node {
    let html = ctx.sanitize(&markdown_to_html(&cell.source), MIME_TEXT_MARKDOWN);
    let content = Element::new("div")
        .class("jp-markdown-content")
        .child(Element::new("div").child(Node::raw(html)));
    Element::new("div")
        .class("jp-notebook-cell jp-markdown-cell")
        .child(input_wrapper(Element::new("div").class("jp-cell-input-prompt"), content))
        .into()
}

fn render_code_cell(ctx: &mut RenderContext<'_>, cell: &CodeCell, language: Option<&str>) -> Node {
    let options = *ctx.options();
    let mut element = Element::new("div").class("jp-notebook-cell jp-code-cell");

    if !options.hide_code {
        let normalized = language.and_then(normalize_language);
        let body = match normalized.as_deref() {
            Some(lang) => ctx.highlight(&cell.source, Some(lang)),
            None => Node::text(&cell.source),
        };
        let prompt = input_prompt(&options, cell.execution_count);
        element = element.child(code_input(
            &options,
            prompt,
            &cell.source,
            body,
            language,
            normalized.as_deref(),
        ));
    }

    if options.show_outputs {
        let outputs: Vec<Node> = cell
            .outputs
            .iter()
            .filter_map(|output| render_output_wrapper(ctx, output))
            .collect();
        if !outputs.is_empty() {
            element = element.child(Element::new("div").class("jp-cell-outputs").children(outputs));
        }
    }
    element.into()
}

fn render_raw_cell(ctx: &mut RenderContext<'_>, cell: &TextCell) -> Node {
    let options = *ctx.options();
    let mut element = Element::new("div").class("jp-notebook-cell jp-code-cell jp-raw-cell");
    if !options.hide_code {
        let prompt = input_prompt(&options, None);
        element = element.child(code_input(
            &options,
            prompt,
            &cell.source,
            Node::text(&cell.source),
            Some("raw"),
            None,
        ));
    }
    element.into()
}

fn input_prompt(options: &RenderOptions, execution_count: Option<i64>) -> Element {
    let prompt = Element::new("div").class("jp-cell-input-prompt");
    if !options.show_cell_numbers {
        return prompt;
    }
    let inner = match execution_count.filter(|n| *n > 0) {
        Some(n) => Element::new("div")
            .class("jp-input-prompt jp-input-execute-count")
            .child(Node::text(format!("In [{n}]:"))),
        None => Element::new("div")
            .class("jp-input-prompt")
            .child(Node::text("In [ ]:")),
    };
    prompt.child(inner)
}

fn code_input(
    options: &RenderOptions,
    prompt: Element,
    source: &str,
    body: Node,
    language: Option<&str>,
    normalized: Option<&str>,
) -> Element {
    let code = match normalized {
        Some(lang) => Element::new("code").class(&format!("language-{lang}")),
        None => Element::new("code"),
    }
    .child(body);

    let pre = if options.show_line_numbers {
        let line_count = source.lines().count().max(1);
        let numbers: Vec<String> = (1..=line_count).map(|n| n.to_string()).collect();
        Element::new("pre")
            .class("jp-code-source jp-line-numbers")
            .child(
                Element::new("span")
                    .class("jp-line-gutter")
                    .attr("aria-hidden", "true")
                    .child(Node::text(numbers.join("\n"))),
            )
            .child(code)
    } else {
        Element::new("pre").class("jp-code-source").child(code)
    };

    let indicator = language
        .filter(|_| options.show_language_indicators)
        .map(|lang| {
            Element::new("div")
                .class("jp-language-indicator")
                .child(Node::text(lang))
        });
    let copy_button = options.show_copy_button.then(|| {
        Element::new("button")
            .class("jp-copy-button")
            .attr("type", "button")
            .attr("data-clipboard-text", source)
            .child(Node::text("Copy"))
    });

    let content = Element::new("div")
        .class("jp-cell-input-content")
        .child(pre)
        .maybe_child(indicator)
        .maybe_child(copy_button);
    input_wrapper(prompt, content)
}

fn input_wrapper(prompt: Element, content: Element) -> Element {
    Element::new("div")
        .class("jp-cell-input-wrapper")
        .child(prompt)
        .child(Element::new("div").class("jp-cell-input-area").child(content))
}

fn render_output_wrapper(ctx: &mut RenderContext<'_>, output: &Output) -> Option<Node> {
    let content = render_output(ctx, output)?;
    let mut prompt = Element::new("div").class("jp-cell-output-prompt");
    if let Output::ExecuteResult(result) = output {
        if ctx.options().show_cell_numbers {
            let label = match result.execution_count.filter(|n| *n > 0) {
                Some(n) => format!("Out[{n}]:"),
                None => "Out[ ]:".to_string(),
            };
            prompt = prompt.child(
                Element::new("div")
                    .class("jp-output-prompt jp-output-execute-count")
                    .child(Node::text(label)),
            );
        }
    }
    Some(
        Element::new("div")
            .class("jp-cell-output-wrapper")
            .child(prompt)
            .child(
                Element::new("div").class("jp-cell-output-area").child(
                    Element::new("div")
                        .class("jp-cell-output-content")
                        .child(content),
                ),
            )
            .into(),
    )
}
