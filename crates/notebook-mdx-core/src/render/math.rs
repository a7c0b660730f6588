//! `text/latex` outputs rendered to MathML.

use super::{degraded_note, RenderContext};
use crate::error::Degradation;
use crate::node::{Element, Node};
use latex2mathml::{latex_to_mathml, DisplayStyle};

/// Strip math delimiters and a leading `\displaystyle`.
///
/// `$$...$$`, `\[...\]` and undelimited input render as block math;
/// `$...$` and `\(...\)` render inline.
///
/// # Examples
///
/// ```
/// use notebook_mdx_core::render::math::strip_delimiters;
///
/// assert_eq!(strip_delimiters("$$x^2$$"), ("x^2", true));
/// assert_eq!(strip_delimiters("$\\displaystyle \\frac{1}{2}$"), ("\\frac{1}{2}", false));
/// ```
#[must_use]
pub fn strip_delimiters(source: &str) -> (&str, bool) {
    let trimmed = source.trim();
    let (inner, block) = if let Some(inner) = enclosed(trimmed, "$$", "$$") {
        (inner, true)
    } else if let Some(inner) = enclosed(trimmed, "\\[", "\\]") {
        (inner, true)
    } else if let Some(inner) = enclosed(trimmed, "$", "$") {
        (inner, false)
    } else if let Some(inner) = enclosed(trimmed, "\\(", "\\)") {
        (inner, false)
    } else {
        (trimmed, true)
    };
    let inner = inner.trim();
    let inner = inner
        .strip_prefix("\\displaystyle")
        .filter(|rest| !rest.starts_with(|c: char| c.is_ascii_alphabetic()))
        .map_or(inner, str::trim_start);
    (inner, block)
}

fn enclosed<'s>(text: &'s str, open: &str, close: &str) -> Option<&'s str> {
    if text.len() < open.len() + close.len() {
        return None;
    }
    text.strip_prefix(open)?.strip_suffix(close)
}

/// Render LaTeX as MathML; on failure show the source with an error note
pub fn render_latex(ctx: &mut RenderContext<'_>, source: &str) -> Node {
    let (latex, block) = strip_delimiters(source);
    let style = if block {
        DisplayStyle::Block
    } else {
        DisplayStyle::Inline
    };
    match latex_to_mathml(latex, style) {
        Ok(mathml) => Element::new("div")
            .class("notebook-output-latex")
            .child(Node::raw(mathml))
            .into(),
        Err(e) => {
            let degradation = Degradation::Math(e.to_string());
            let note = degraded_note(&degradation.to_string());
            ctx.degrade(degradation);
            Element::new("div")
                .class("notebook-output-latex jp-output-degraded")
                .child(Element::new("pre").child(Node::text(source)))
                .child(note)
                .into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::Highlighting;
    use crate::options::RenderOptions;

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("  $$ a + b $$ "), ("a + b", true));
        assert_eq!(strip_delimiters("$a$"), ("a", false));
        assert_eq!(strip_delimiters("\\[x\\]"), ("x", true));
        assert_eq!(strip_delimiters("\\(x\\)"), ("x", false));
        assert_eq!(strip_delimiters("x = 1"), ("x = 1", true));
        assert_eq!(
            strip_delimiters("\\displaystylex"),
            ("\\displaystylex", true),
            "only a whole \\displaystyle token is removed"
        );
        assert_eq!(strip_delimiters("$"), ("$", true), "lone dollar is not a delimiter pair");
    }

    #[test]
    fn test_render_latex_block() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let html = render_latex(&mut ctx, "$$\\displaystyle x^2 + 1$$").to_html();
        assert!(html.contains("<math"), "expected MathML: {html}");
        assert!(html.contains("display=\"block\""), "expected block display: {html}");
        let (_, degradations) = ctx.finish();
        assert!(degradations.is_empty());
    }

    #[test]
    fn test_render_latex_failure_shows_source() {
        let options = RenderOptions::default();
        let highlighting = Highlighting::Disabled;
        let mut ctx = RenderContext::new(&options, &highlighting, None, None);
        let node = render_latex(&mut ctx, "$\\frac{1}{$");
        assert_eq!(node.find_by_class("jp-output-degraded").len(), 1);
        assert!(node.text_content().contains("\\frac{1}{"));
        let (_, degradations) = ctx.finish();
        assert_eq!(degradations.len(), 1);
        assert_eq!(degradations[0].kind(), "math");
    }
}
