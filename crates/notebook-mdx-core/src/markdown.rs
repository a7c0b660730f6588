//! Minimal markdown to HTML transform for markdown cells and `text/markdown`
//! outputs.
//!
//! Supports headings `#` to `###`, `> ` blockquotes, bold, italic, inline code,
//! fenced code blocks, images, links, blank-line paragraph breaks and
//! single-newline line breaks. Code contents are escaped and shielded from the
//! inline rules; everything else passes through, so inline HTML in a cell
//! reaches the page untouched.

use crate::node::escape_html;
use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_+#.-]*)[ \t]*\n?(.*?)```").expect("valid fenced code regex")
});
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("valid inline code regex"));
static H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").expect("valid h3 regex"));
static H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").expect("valid h2 regex"));
static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").expect("valid h1 regex"));
static BLOCKQUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^> (.*)$").expect("valid blockquote regex"));
static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic regex"));
static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").expect("valid image regex"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("valid link regex"));
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").expect("valid placeholder regex"));

/// Convert markdown source to an HTML fragment wrapped in `<p>`.
///
/// # Examples
///
/// ```
/// use notebook_mdx_core::markdown::markdown_to_html;
///
/// assert_eq!(markdown_to_html("# Hi"), "<p><h1>Hi</h1></p>");
/// assert_eq!(
///     markdown_to_html("a **b** `<c>`"),
///     "<p>a <strong>b</strong> <code>&lt;c&gt;</code></p>"
/// );
/// ```
#[must_use]
pub fn markdown_to_html(source: &str) -> String {
    let normalized = source.replace("\r\n", "\n");
    let text = normalized.trim_end_matches('\n');

    let mut shielded: Vec<String> = Vec::new();
    let mut shield = |html: String| {
        shielded.push(html);
        format!("\u{E000}{}\u{E001}", shielded.len() - 1)
    };

    let text = FENCED_CODE.replace_all(text, |caps: &regex::Captures| {
        let language = &caps[1];
        let code = escape_html(caps[2].trim_end_matches('\n'));
        let html = if language.is_empty() {
            format!("<pre><code>{code}</code></pre>")
        } else {
            format!("<pre><code class=\"language-{language}\">{code}</code></pre>")
        };
        shield(html)
    });
    let text = INLINE_CODE.replace_all(&text, |caps: &regex::Captures| {
        shield(format!("<code>{}</code>", escape_html(&caps[1])))
    });

    let text = H3.replace_all(&text, "<h3>$1</h3>");
    let text = H2.replace_all(&text, "<h2>$1</h2>");
    let text = H1.replace_all(&text, "<h1>$1</h1>");
    let text = BLOCKQUOTE.replace_all(&text, "<blockquote>$1</blockquote>");
    let text = BOLD.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC.replace_all(&text, "<em>$1</em>");
    let text = IMAGE.replace_all(&text, "<img alt=\"$1\" src=\"$2\" />");
    let text = LINK.replace_all(&text, "<a href=\"$2\">$1</a>");
    let text = text.replace("\n\n", "</p><p>").replace('\n', "<br>");

    let text = PLACEHOLDER.replace_all(&text, |caps: &regex::Captures| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|index| shielded.get(index))
            .cloned()
            .unwrap_or_default()
    });

    format!("<p>{text}</p>")
}
