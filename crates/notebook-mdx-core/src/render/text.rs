//! Text-like outputs: streams, errors, plain text, JSON and markdown.

use super::RenderContext;
use crate::error::Degradation;
use crate::markdown::markdown_to_html;
use crate::mime::{Payload, MIME_TEXT_MARKDOWN};
use crate::node::{Element, Node};
use notebook_mdx_model::{ErrorOutput, StreamName, StreamOutput};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// CSI sequences (colors, cursor movement) and OSC sequences (titles, links)
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
        .expect("valid ANSI escape regex")
});

/// Remove terminal escape sequences from kernel text.
///
/// # Examples
///
/// ```
/// use notebook_mdx_core::render::text::strip_ansi;
///
/// assert_eq!(strip_ansi("\x1b[0;31mValueError\x1b[0m: bad"), "ValueError: bad");
/// ```
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// `stream` output: fixed-width block, stderr marked with a modifier class
#[must_use]
pub fn render_stream(stream: &StreamOutput) -> Node {
    let class = match stream.name {
        StreamName::Stderr => "jp-output-stream jp-output-stderr",
        StreamName::Stdout | StreamName::Other(_) => "jp-output-stream",
    };
    Element::new("div")
        .class(class)
        .child(Element::new("pre").child(Node::text(strip_ansi(&stream.text))))
        .into()
}

/// `error` output: `ename: evalue` header followed by the traceback
#[must_use]
pub fn render_error(error: &ErrorOutput) -> Node {
    let header = Element::new("div")
        .class("jp-output-error-name")
        .child(Node::text(format!(
            "{}: {}",
            strip_ansi(&error.ename),
            strip_ansi(&error.evalue)
        )));
    let traceback = (!error.traceback.is_empty()).then(|| {
        Element::new("pre")
            .class("jp-output-traceback")
            .child(Node::text(strip_ansi(&error.traceback.join("\n"))))
    });
    Element::new("div")
        .class("jp-output-error")
        .child(header)
        .maybe_child(traceback)
        .into()
}

/// `text/plain`: fixed-width block, highlighted when a language is detected
pub fn render_plain(ctx: &mut RenderContext<'_>, content: &str) -> Node {
    let body = ctx.highlight(content, None);
    Element::new("div")
        .class("notebook-output-text")
        .child(Element::new("pre").child(body))
        .into()
}

/// `application/json`: pretty-printed with two-space indentation
pub fn render_json(ctx: &mut RenderContext<'_>, value: &Value) -> Node {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        ctx.degrade(Degradation::Json(e.to_string()));
        value.to_string()
    });
    Element::new("div")
        .class("notebook-output-json")
        .child(Element::new("pre").child(Node::text(pretty)))
        .into()
}

/// `text/markdown`: the minimal markdown transform
pub fn render_markdown(ctx: &mut RenderContext<'_>, source: &str) -> Node {
    let html = ctx.sanitize(&markdown_to_html(source), MIME_TEXT_MARKDOWN);
    Element::new("div")
        .class("notebook-output-markdown jp-markdown-content")
        .child(Node::raw(html))
        .into()
}

/// Any other textual representation, shown verbatim
#[must_use]
pub fn render_other(payload: &Payload) -> Node {
    let text = match payload {
        Payload::Text(text) | Payload::DataUri(text) => text.clone(),
        Payload::Json(value) => value.to_string(),
    };
    Element::new("div")
        .class("notebook-output-text")
        .child(Element::new("pre").child(Node::text(text)))
        .into()
}
