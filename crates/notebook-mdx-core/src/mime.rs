//! MIME representation selection for rich outputs.
//!
//! A `display_data` or `execute_result` output carries a bundle of competing
//! representations of one value. [`resolve`] picks exactly one of them:
//!
//! 1. Images first: the first present entry of [`IMAGE_PRIORITY`] wins over
//!    every non-image representation.
//! 2. Otherwise the first present entry of [`MIME_PRIORITY`].
//! 3. Otherwise any remaining textual key, in lexicographic order.
//!
//! A key only counts as present when its payload is non-empty and can be
//! normalized for its kind.

use notebook_mdx_model::{join_multiline, RichOutput};
use serde::Serialize;
use serde_json::{Map, Value};

/// Plotly chart spec
pub const MIME_PLOTLY: &str = "application/vnd.plotly.v1+json";
/// HTML markup
pub const MIME_TEXT_HTML: &str = "text/html";
/// SVG markup
pub const MIME_IMAGE_SVG: &str = "image/svg+xml";
/// Base64 PNG
pub const MIME_IMAGE_PNG: &str = "image/png";
/// Base64 JPEG
pub const MIME_IMAGE_JPEG: &str = "image/jpeg";
/// Base64 GIF
pub const MIME_IMAGE_GIF: &str = "image/gif";
/// Markdown source
pub const MIME_TEXT_MARKDOWN: &str = "text/markdown";
/// LaTeX source
pub const MIME_TEXT_LATEX: &str = "text/latex";
/// Structured JSON
pub const MIME_APPLICATION_JSON: &str = "application/json";
/// Plain text
pub const MIME_TEXT_PLAIN: &str = "text/plain";

/// General representation priority, highest first
pub const MIME_PRIORITY: [&str; 10] = [
    MIME_PLOTLY,
    MIME_TEXT_HTML,
    MIME_IMAGE_SVG,
    MIME_IMAGE_PNG,
    MIME_IMAGE_JPEG,
    MIME_IMAGE_GIF,
    MIME_TEXT_MARKDOWN,
    MIME_TEXT_LATEX,
    MIME_APPLICATION_JSON,
    MIME_TEXT_PLAIN,
];

/// Image representations, checked before [`MIME_PRIORITY`]
pub const IMAGE_PRIORITY: [&str; 4] = [
    MIME_IMAGE_PNG,
    MIME_IMAGE_JPEG,
    MIME_IMAGE_GIF,
    MIME_IMAGE_SVG,
];

/// Which renderer handles a representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MimeKind {
    Chart,
    Html,
    Svg,
    RasterImage,
    Markdown,
    Latex,
    Json,
    PlainText,
    /// Any other textual MIME type, shown as plain text
    OtherText,
}

impl MimeKind {
    /// Classify a MIME type string
    #[must_use]
    pub fn of(mime: &str) -> Self {
        match mime {
            MIME_PLOTLY => Self::Chart,
            MIME_TEXT_HTML => Self::Html,
            MIME_IMAGE_SVG => Self::Svg,
            MIME_IMAGE_PNG | MIME_IMAGE_JPEG | MIME_IMAGE_GIF => Self::RasterImage,
            MIME_TEXT_MARKDOWN => Self::Markdown,
            MIME_TEXT_LATEX => Self::Latex,
            MIME_APPLICATION_JSON => Self::Json,
            MIME_TEXT_PLAIN => Self::PlainText,
            _ => Self::OtherText,
        }
    }

    /// Whether this kind is an image
    #[inline]
    #[must_use]
    pub const fn is_image(self) -> bool {
        matches!(self, Self::Svg | Self::RasterImage)
    }
}

/// A normalized payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Payload {
    /// Joined text or literal markup
    Text(String),
    /// `data:<mime>;base64,<payload>` URI
    DataUri(String),
    /// Structured value (JSON and chart specs)
    Json(Value),
}

impl Payload {
    /// Text form, if this payload is textual
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::DataUri(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

/// Per-representation display hints from the output's `metadata`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RenderHints {
    /// Width in pixels
    pub width: Option<f64>,
    /// Height in pixels
    pub height: Option<f64>,
}

impl RenderHints {
    /// Read `metadata[mime].width` and `metadata[mime].height`.
    ///
    /// Numbers and numeric strings are accepted; anything non-positive is
    /// ignored.
    #[must_use]
    pub fn from_metadata(metadata: &Map<String, Value>, mime: &str) -> Self {
        let Some(entry) = metadata.get(mime).and_then(Value::as_object) else {
            return Self::default();
        };
        let dimension = |key: &str| {
            entry
                .get(key)
                .and_then(|v| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok()))
                .filter(|v: &f64| v.is_finite() && *v > 0.0)
        };
        Self {
            width: dimension("width"),
            height: dimension("height"),
        }
    }
}

/// The single representation chosen for an output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Representation {
    pub mime: String,
    pub kind: MimeKind,
    pub payload: Payload,
    pub hints: RenderHints,
}

/// Choose the representation to render for a rich output.
///
/// Returns `None` when nothing in the bundle is renderable; the output then
/// renders as empty.
///
/// # Examples
///
/// ```
/// use notebook_mdx_core::mime::{resolve, MimeKind};
/// use notebook_mdx_model::RichOutput;
/// use serde_json::json;
///
/// let output = RichOutput {
///     data: json!({"text/html": "<b>x</b>", "image/png": "iVBOR"})
///         .as_object()
///         .cloned()
///         .unwrap(),
///     metadata: Default::default(),
/// };
/// let chosen = resolve(&output).unwrap();
/// assert_eq!(chosen.kind, MimeKind::RasterImage);
/// ```
#[must_use]
pub fn resolve(output: &RichOutput) -> Option<Representation> {
    let data = &output.data;
    if data.is_empty() {
        return None;
    }

    let ranked = IMAGE_PRIORITY.iter().chain(MIME_PRIORITY.iter()).copied();
    for mime in ranked {
        if let Some(representation) = candidate(output, mime) {
            return Some(representation);
        }
    }

    let mut others: Vec<&String> = data
        .keys()
        .filter(|mime| !MIME_PRIORITY.contains(&mime.as_str()) && !mime.starts_with("image/"))
        .collect();
    others.sort();
    others.into_iter().find_map(|mime| {
        candidate(output, mime).filter(|r| matches!(r.payload, Payload::Text(_)))
    })
}

fn candidate(output: &RichOutput, mime: &str) -> Option<Representation> {
    let value = output.data.get(mime)?;
    if !is_present(value) {
        return None;
    }
    let kind = MimeKind::of(mime);
    let payload = normalize(kind, mime, value)?;
    Some(Representation {
        mime: mime.to_string(),
        kind,
        payload,
        hints: RenderHints::from_metadata(&output.metadata, mime),
    })
}

/// A payload is present unless it is null, an empty string, or a line
/// sequence that joins to nothing.
#[must_use]
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => items.iter().any(|item| match item {
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            _ => true,
        }),
        _ => true,
    }
}

fn normalize(kind: MimeKind, mime: &str, value: &Value) -> Option<Payload> {
    match kind {
        MimeKind::Chart => match value {
            Value::Object(_) => Some(Payload::Json(value.clone())),
            Value::String(s) => serde_json::from_str::<Value>(s)
                .ok()
                .filter(Value::is_object)
                .map(Payload::Json),
            _ => None,
        },
        MimeKind::Json => Some(Payload::Json(value.clone())),
        MimeKind::RasterImage => {
            let encoded: String = join_multiline(value)?
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            (!encoded.is_empty()).then(|| Payload::DataUri(format!("data:{mime};base64,{encoded}")))
        }
        MimeKind::Html
        | MimeKind::Svg
        | MimeKind::Markdown
        | MimeKind::Latex
        | MimeKind::PlainText
        | MimeKind::OtherText => join_multiline(value)
            .filter(|text| !text.is_empty())
            .map(Payload::Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rich(data: Value) -> RichOutput {
        RichOutput {
            data: data.as_object().cloned().unwrap_or_default(),
            metadata: Map::new(),
        }
    }

    #[test]
    fn test_image_beats_html() {
        let chosen = resolve(&rich(json!({
            "text/html": ["<table></table>"],
            "image/jpeg": "/9j/4AAQ",
            "text/plain": "Figure"
        })))
        .unwrap();
        assert_eq!(chosen.mime, MIME_IMAGE_JPEG);
        assert_eq!(
            chosen.payload,
            Payload::DataUri("data:image/jpeg;base64,/9j/4AAQ".to_string())
        );
    }

    #[test]
    fn test_image_order_png_jpeg_gif_svg() {
        let chosen = resolve(&rich(json!({
            "image/svg+xml": "<svg/>",
            "image/gif": "R0lGOD",
            "image/png": "iVBOR"
        })))
        .unwrap();
        assert_eq!(chosen.mime, MIME_IMAGE_PNG, "png outranks gif and svg");

        let chosen = resolve(&rich(json!({
            "image/svg+xml": "<svg/>",
            "application/vnd.plotly.v1+json": {"data": []}
        })))
        .unwrap();
        assert_eq!(chosen.kind, MimeKind::Svg, "images win over charts");
    }

    #[test]
    fn test_plotly_beats_html() {
        let chosen = resolve(&rich(json!({
            "text/html": "<div>plot</div>",
            "application/vnd.plotly.v1+json": {"data": [], "layout": {}}
        })))
        .unwrap();
        assert_eq!(chosen.kind, MimeKind::Chart);
    }

    #[test]
    fn test_empty_payload_is_absent() {
        let chosen = resolve(&rich(json!({
            "text/html": "",
            "image/png": [],
            "text/plain": ["", "42"]
        })))
        .unwrap();
        assert_eq!(chosen.payload, Payload::Text("42".to_string()));
    }

    #[test]
    fn test_raster_whitespace_removed() {
        let chosen = resolve(&rich(json!({"image/png": ["iVBO\n", "Rw0K\n"]}))).unwrap();
        assert_eq!(
            chosen.payload,
            Payload::DataUri("data:image/png;base64,iVBORw0K".to_string())
        );
    }

    #[test]
    fn test_unknown_textual_mime_fallback_is_lexicographic() {
        let chosen = resolve(&rich(json!({
            "text/x-zzz": "last",
            "text/csv": "a,b",
            "application/vnd.jupyter.widget-view+json": {"model_id": "1"}
        })))
        .unwrap();
        assert_eq!(chosen.mime, "text/csv");
        assert_eq!(chosen.kind, MimeKind::OtherText);
    }

    #[test]
    fn test_nothing_renderable() {
        assert!(resolve(&rich(json!({}))).is_none());
        assert!(resolve(&rich(json!({
            "application/vnd.jupyter.widget-view+json": {"model_id": "1"},
            "image/bmp": "Qk0="
        })))
        .is_none());
    }

    #[test]
    fn test_chart_spec_from_string() {
        let chosen = resolve(&rich(json!({
            "application/vnd.plotly.v1+json": "{\"data\": [1]}"
        })))
        .unwrap();
        assert_eq!(chosen.payload, Payload::Json(json!({"data": [1]})));

        assert!(
            resolve(&rich(json!({"application/vnd.plotly.v1+json": "not json"}))).is_none(),
            "unparsable chart spec is not a candidate"
        );
    }

    #[test]
    fn test_hints() {
        let output = RichOutput {
            data: json!({"image/png": "iVBOR"}).as_object().cloned().unwrap(),
            metadata: json!({"image/png": {"width": 320, "height": "200"}})
                .as_object()
                .cloned()
                .unwrap(),
        };
        let chosen = resolve(&output).unwrap();
        assert_eq!(chosen.hints.width, Some(320.0));
        assert_eq!(chosen.hints.height, Some(200.0));
    }
}
