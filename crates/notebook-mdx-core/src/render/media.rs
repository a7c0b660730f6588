//! Images and literal markup.

use super::{degraded_note, RenderContext};
use crate::error::Degradation;
use crate::mime::{RenderHints, MIME_IMAGE_SVG, MIME_TEXT_HTML};
use crate::node::{Element, Node};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

/// Notebook writers are inconsistent about trailing `=` padding
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn size_style(hints: &RenderHints) -> String {
    let mut style = String::new();
    if let Some(width) = hints.width {
        style.push_str(&format!("width: {width}px; "));
    }
    if let Some(height) = hints.height {
        style.push_str(&format!("height: {height}px; "));
    }
    style
}

/// Raster image from a `data:` URI, sized by hints and capped at the
/// container width
pub fn render_raster(
    ctx: &mut RenderContext<'_>,
    mime: &str,
    data_uri: &str,
    hints: &RenderHints,
) -> Node {
    let encoded = data_uri.split_once(',').map_or("", |(_, data)| data);
    if let Err(e) = LENIENT_BASE64.decode(encoded) {
        ctx.degrade(Degradation::Image {
            mime: mime.to_string(),
            reason: e.to_string(),
        });
        return Element::new("div")
            .class("notebook-output-image jp-output-degraded")
            .child(degraded_note(&format!("Image could not be decoded ({mime})")))
            .into();
    }

    let style = format!(
        "{}max-width: 100%; display: block; margin: 0 auto;",
        size_style(hints)
    );
    Element::new("div")
        .class("notebook-output-image")
        .child(
            Element::new("img")
                .attr("src", data_uri)
                .attr("alt", "Notebook output")
                .attr("style", style),
        )
        .into()
}

/// SVG markup, injected as-is unless a sanitizer is installed
pub fn render_svg(ctx: &mut RenderContext<'_>, svg: &str, hints: &RenderHints) -> Node {
    let style = format!("{}max-width: 100%; text-align: center;", size_style(hints));
    Element::new("div")
        .class("notebook-output-image")
        .child(
            Element::new("div")
                .attr("style", style)
                .child(Node::raw(ctx.sanitize(svg, MIME_IMAGE_SVG))),
        )
        .into()
}

/// HTML markup, injected as-is unless a sanitizer is installed
pub fn render_html(ctx: &mut RenderContext<'_>, html: &str) -> Node {
    Element::new("div")
        .class("notebook-output-html")
        .child(Element::new("div").child(Node::raw(ctx.sanitize(html, MIME_TEXT_HTML))))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::Highlighting;
    use crate::options::RenderOptions;

    #[test]
    fn test_raster_with_hints() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let hints = RenderHints {
            width: Some(320.0),
            height: None,
        };
        let node = render_raster(
            &mut ctx,
            "image/png",
            "data:image/png;base64,iVBORw0KGgo=",
            &hints,
        );
        let html = node.to_html();
        assert!(html.contains("src=\"data:image/png;base64,iVBORw0KGgo=\""), "{html}");
        assert!(html.contains("width: 320px;"), "{html}");
        assert!(!html.contains("height:"), "absent hint keeps natural size: {html}");
        assert!(html.contains("max-width: 100%"));
        let (_, degradations) = ctx.finish();
        assert!(degradations.is_empty());
    }

    #[test]
    fn test_unpadded_base64_is_accepted() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let node = render_raster(
            &mut ctx,
            "image/gif",
            "data:image/gif;base64,R0lGODlh",
            &RenderHints::default(),
        );
        assert_eq!(node.find_by_class("jp-output-degraded").len(), 0);
    }

    #[test]
    fn test_invalid_base64_degrades_visibly() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let node = render_raster(
            &mut ctx,
            "image/png",
            "data:image/png;base64,not*base64!",
            &RenderHints::default(),
        );
        assert_eq!(node.find_by_class("jp-output-degraded").len(), 1);
        assert!(node.text_content().contains("could not be decoded"));
        let (_, degradations) = ctx.finish();
        assert_eq!(degradations.len(), 1);
        assert_eq!(degradations[0].kind(), "image");
    }

    #[test]
    fn test_svg_and_html_are_verbatim() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let svg = "<svg width=\"10\"><rect/></svg>";
        assert!(render_svg(&mut ctx, svg, &RenderHints::default())
            .to_html()
            .contains(svg));
        let html = "<table><tr><td>1</td></tr></table>";
        assert_eq!(
            render_html(&mut ctx, html).to_html(),
            format!("<div class=\"notebook-output-html\"><div>{html}</div></div>")
        );
    }
}
