//! Output renderers.
//!
//! One renderer per representation kind, each turning a normalized payload
//! into a [`Node`]. Renderers never fail: internal errors are recorded as
//! [`Degradation`]s on the [`RenderContext`] and a visible fallback is
//! returned instead, so one broken output cannot affect its neighbours.

pub mod chart;
pub mod math;
pub mod media;
pub mod text;

use crate::error::Degradation;
use crate::highlight::{HighlightEngine, Highlighting, SyntectHighlighter};
use crate::hydrate::{DeferredJob, DeferredRender};
use crate::mime::{self, MimeKind, Payload, Representation};
use crate::node::{Element, Node, SlotId};
use crate::options::RenderOptions;
use chart::ChartEngine;
use notebook_mdx_model::{Output, RichOutput};
use std::sync::Arc;

/// Hook for rewriting trusted markup before it is injected.
///
/// Applied to `text/html`, `image/svg+xml` and `text/markdown` outputs.
/// Nothing is sanitized unless a sanitizer is installed.
pub trait HtmlSanitizer: Send + Sync {
    /// Return the markup to inject in place of `html`
    fn sanitize(&self, html: &str, mime: &str) -> String;
}

/// Prefix of element ids generated for deferred content
pub const DEFAULT_ID_PREFIX: &str = "nb-";

/// Per-render state shared by all renderers of one document
pub struct RenderContext<'a> {
    options: &'a RenderOptions,
    highlighting: &'a Highlighting,
    id_prefix: &'a str,
    sanitizer: Option<&'a dyn HtmlSanitizer>,
    chart_engine: Option<&'a Arc<dyn ChartEngine>>,
    next_slot: u32,
    deferred: Vec<DeferredRender>,
    degradations: Vec<Degradation>,
}

impl<'a> RenderContext<'a> {
    /// Create a context for one document render
    #[must_use]
    pub fn new(
        options: &'a RenderOptions,
        highlighting: &'a Highlighting,
        sanitizer: Option<&'a dyn HtmlSanitizer>,
        chart_engine: Option<&'a Arc<dyn ChartEngine>>,
    ) -> Self {
        Self {
            options,
            highlighting,
            id_prefix: DEFAULT_ID_PREFIX,
            sanitizer,
            chart_engine,
            next_slot: 0,
            deferred: Vec::new(),
            degradations: Vec::new(),
        }
    }

    /// Prefix generated element ids with `prefix`.
    ///
    /// Documents embedding several notebooks give each render its own
    /// prefix so ids stay unique on the page.
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: &'a str) -> Self {
        self.id_prefix = prefix;
        self
    }

    #[inline]
    #[must_use]
    pub const fn id_prefix(&self) -> &str {
        self.id_prefix
    }

    /// Options of the current render
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        self.options
    }

    /// Chart engine, if one is installed
    #[inline]
    #[must_use]
    pub fn chart_engine(&self) -> Option<&Arc<dyn ChartEngine>> {
        self.chart_engine
    }

    /// Record a non-fatal failure
    pub fn degrade(&mut self, degradation: Degradation) {
        log::warn!("{degradation}");
        self.degradations.push(degradation);
    }

    /// Allocate the next slot id
    pub fn next_slot(&mut self) -> SlotId {
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        id
    }

    /// Wrap `fallback` in a new slot and record `job` to fill it later
    pub fn defer(&mut self, inline: bool, fallback: Node, job: DeferredJob) -> Node {
        let slot = self.next_slot();
        log::trace!("Deferring {} into slot {slot}", job.kind());
        self.deferred.push(DeferredRender { slot, job });
        Node::slot(slot, inline, fallback)
    }

    /// Highlight `code` as inline content of a `<code>` or `<pre>` element.
    ///
    /// `language` must already be normalized; `None` asks the engine to
    /// detect one from the first line.
    pub fn highlight(&mut self, code: &str, language: Option<&str>) -> Node {
        let highlighting: &'a Highlighting = self.highlighting;
        match highlighting {
            Highlighting::Disabled => Node::text(code),
            Highlighting::Deferred => self.defer(
                true,
                Node::text(code),
                DeferredJob::Highlight {
                    code: code.to_string(),
                    language: language.map(str::to_string),
                },
            ),
            Highlighting::Ready(engine) => self.highlight_with(engine.as_ref(), code, language),
            Highlighting::Syntect => {
                let engine = SyntectHighlighter::shared();
                self.highlight_with(engine.as_ref(), code, language)
            }
        }
    }

    fn highlight_with(
        &mut self,
        engine: &dyn HighlightEngine,
        code: &str,
        language: Option<&str>,
    ) -> Node {
        match engine.highlight(code, language) {
            Ok(Some(html)) => Node::raw(html),
            Ok(None) => Node::text(code),
            Err(e) => {
                self.degrade(Degradation::Highlight {
                    language: language.unwrap_or("auto").to_string(),
                    reason: e.to_string(),
                });
                Node::text(code)
            }
        }
    }

    /// Run the installed sanitizer over trusted markup
    #[must_use]
    pub fn sanitize(&self, html: &str, mime: &str) -> String {
        match self.sanitizer {
            Some(sanitizer) => sanitizer.sanitize(html, mime),
            None => html.to_string(),
        }
    }

    /// Consume the context, returning deferred jobs and degradations
    #[must_use]
    pub fn finish(self) -> (Vec<DeferredRender>, Vec<Degradation>) {
        (self.deferred, self.degradations)
    }
}

/// Render one cell output. Unknown output kinds and bundles with nothing
/// renderable produce `None`.
pub fn render_output(ctx: &mut RenderContext<'_>, output: &Output) -> Option<Node> {
    match output {
        Output::Stream(stream) => Some(text::render_stream(stream)),
        Output::Error(error) => Some(text::render_error(error)),
        Output::DisplayData(rich) => render_rich(ctx, rich),
        Output::ExecuteResult(result) => render_rich(ctx, &result.rich),
        Output::Unknown { output_type } => {
            log::debug!("Skipping output of unknown type {output_type:?}");
            None
        }
    }
}

/// Render the chosen representation of a rich output
pub fn render_rich(ctx: &mut RenderContext<'_>, output: &RichOutput) -> Option<Node> {
    let Some(representation) = mime::resolve(output) else {
        if !output.data.is_empty() {
            ctx.degrade(Degradation::UnrenderableOutput {
                mime_types: output.data.keys().cloned().collect(),
            });
        }
        return None;
    };
    Some(render_representation(ctx, &representation))
}

/// Dispatch a resolved representation to its renderer
pub fn render_representation(ctx: &mut RenderContext<'_>, rep: &Representation) -> Node {
    match (&rep.kind, &rep.payload) {
        (MimeKind::Chart, Payload::Json(spec)) => chart::render_chart(ctx, spec),
        (MimeKind::Json, Payload::Json(value)) => text::render_json(ctx, value),
        (MimeKind::RasterImage, Payload::DataUri(uri)) => {
            media::render_raster(ctx, &rep.mime, uri, &rep.hints)
        }
        (MimeKind::Svg, Payload::Text(svg)) => media::render_svg(ctx, svg, &rep.hints),
        (MimeKind::Html, Payload::Text(html)) => media::render_html(ctx, html),
        (MimeKind::Markdown, Payload::Text(source)) => text::render_markdown(ctx, source),
        (MimeKind::Latex, Payload::Text(source)) => math::render_latex(ctx, source),
        (MimeKind::PlainText, Payload::Text(content)) => text::render_plain(ctx, content),
        (_, payload) => text::render_other(payload),
    }
}

/// `<div class="jp-output-degraded-note">message</div>`
pub(crate) fn degraded_note(message: &str) -> Node {
    Element::new("div")
        .class("jp-output-degraded-note")
        .child(Node::text(message))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HighlightError;
    use notebook_mdx_model::{ExecuteResult, StreamName, StreamOutput};
    use serde_json::json;

    fn rich(data: serde_json::Value) -> RichOutput {
        RichOutput {
            data: data.as_object().cloned().unwrap_or_default(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_unknown_output_renders_nothing() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let output = Output::Unknown {
            output_type: "widget".to_string(),
        };
        assert!(render_output(&mut ctx, &output).is_none());
        let (deferred, degradations) = ctx.finish();
        assert!(deferred.is_empty());
        assert!(degradations.is_empty(), "unknown kinds are silent");
    }

    #[test]
    fn test_unrenderable_bundle_degrades() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let output = Output::DisplayData(rich(json!({
            "application/vnd.jupyter.widget-view+json": {"model_id": "abc"}
        })));
        assert!(render_output(&mut ctx, &output).is_none());
        let (_, degradations) = ctx.finish();
        assert_eq!(degradations.len(), 1);
        assert_eq!(degradations[0].kind(), "unrenderableOutput");
    }

    #[test]
    fn test_execute_result_plain_text() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let output = Output::ExecuteResult(ExecuteResult {
            execution_count: Some(1),
            rich: rich(json!({"text/plain": ["1"]})),
        });
        let node = render_output(&mut ctx, &output).unwrap();
        assert_eq!(node.text_content(), "1");
        assert_eq!(node.find_by_class("notebook-output-text").len(), 1);
    }

    #[test]
    fn test_deferred_highlight_allocates_slots() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Deferred;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let first = ctx.highlight("print(1)", Some("python"));
        let second = ctx.highlight("x", None);
        assert_eq!(first.slot_ids(), vec![SlotId(0)]);
        assert_eq!(second.slot_ids(), vec![SlotId(1)]);
        assert_eq!(first.text_content(), "print(1)", "fallback is the plain source");
        let (deferred, _) = ctx.finish();
        assert_eq!(deferred.len(), 2);
    }

    #[test]
    fn test_sanitizer_applies() {
        struct StripScripts;
        impl HtmlSanitizer for StripScripts {
            fn sanitize(&self, html: &str, _mime: &str) -> String {
                html.replace("<script>", "").replace("</script>", "")
            }
        }

        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let sanitizer = StripScripts;
        let mut ctx = RenderContext::new(&options, &highlighting, Some(&sanitizer), None);
        let node = render_rich(
            &mut ctx,
            &rich(json!({"text/html": "<b>ok</b><script>alert(1)</script>"})),
        )
        .unwrap();
        assert!(!node.to_html().contains("<script>"));
        assert!(node.to_html().contains("<b>ok</b>"));
    }

    #[test]
    fn test_stream_output() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let output = Output::Stream(StreamOutput {
            name: StreamName::Stdout,
            text: "a\nb\n".to_string(),
        });
        let node = render_output(&mut ctx, &output).unwrap();
        assert_eq!(node.text_content(), "a\nb\n");
    }

    struct Failing;

    impl HighlightEngine for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn highlight(
            &self,
            _code: &str,
            _language: Option<&str>,
        ) -> Result<Option<String>, HighlightError> {
            Err(HighlightError::Failed("grammar exploded".to_string()))
        }
    }

    #[test]
    fn test_failed_highlight_falls_back_to_escaped_source() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Ready(Arc::new(Failing));
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let node = ctx.highlight("if a < b: pass", Some("python"));
        assert_eq!(node.to_html(), "if a &lt; b: pass");

        let (deferred, degradations) = ctx.finish();
        assert!(deferred.is_empty());
        assert_eq!(degradations.len(), 1);
        assert_eq!(degradations[0].kind(), "highlight");
        assert!(degradations[0].to_string().contains("grammar exploded"));
    }

    #[test]
    fn test_shared_syntect_highlights_on_first_use() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Syntect;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let node = ctx.highlight("x = 1", Some("python"));
        assert!(node.to_html().contains("hl-"), "{}", node.to_html());
        assert_eq!(node.text_content(), "x = 1");
        let (_, degradations) = ctx.finish();
        assert!(degradations.is_empty());
    }

    #[test]
    fn test_default_id_prefix() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let ctx = RenderContext::new(&options, &highlighting, None, None);
        assert_eq!(ctx.id_prefix(), DEFAULT_ID_PREFIX);
        assert_eq!(ctx.with_id_prefix("doc-3-").id_prefix(), "doc-3-");
    }
}
