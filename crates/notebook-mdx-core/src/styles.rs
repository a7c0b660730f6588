//! Notebook stylesheet and per-target registration.
//!
//! Styles live outside the content tree: a [`RenderTarget`] (one page, one
//! MDX document) collects stylesheets by id, and inserting the same id twice
//! is a no-op. Cell markup never changes because styles were registered.

use crate::highlight::{HighlightEngine, SyntectHighlighter};
use crate::node::escape_html;

/// Stable id of the notebook stylesheet
pub const STYLESHEET_ID: &str = "jupyter-notebook-styles";

/// Jupyter-like layout and colors for the `jp-*` and `notebook-output-*`
/// classes
pub const NOTEBOOK_CSS: &str = r#":root {
  --jp-border-width: 1px;
  --jp-border-radius: 3px;
  --jp-code-font-family: 'SFMono-Regular', Consolas, 'Liberation Mono', Menlo, Courier, monospace;
  --jp-code-font-size: 13px;
  --jp-code-line-height: 1.3077;
  --jp-ui-font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --jp-ui-font-size0: 11px;
  --jp-ui-font-size1: 13px;
  --jp-ui-font-size2: 14px;
  --jp-cell-prompt-width: 64px;
  --jp-input-prompt-color: #307FC1;
  --jp-output-prompt-color: #D84315;
  --jp-error-color: #d32f2f;
}
.jp-notebook { font-family: var(--jp-ui-font-family); font-size: var(--jp-ui-font-size1); line-height: 1.5; }
.jp-notebook-cell { margin: 8px 0; padding-left: 5px; border-left: var(--jp-border-width) solid transparent; }
.jp-cell-input-wrapper, .jp-cell-output-wrapper { display: flex; align-items: flex-start; }
.jp-cell-input-prompt, .jp-cell-output-prompt {
  flex: 0 0 var(--jp-cell-prompt-width);
  font-family: var(--jp-code-font-family);
  font-size: var(--jp-code-font-size);
  line-height: var(--jp-code-line-height);
  padding: 4px 8px 4px 0;
  text-align: right;
  user-select: none;
}
.jp-input-prompt { color: var(--jp-input-prompt-color); }
.jp-output-prompt { color: var(--jp-output-prompt-color); font-weight: bold; }
.jp-cell-input-area, .jp-cell-output-area {
  flex: 1;
  min-width: 0;
  position: relative;
  border: 1px solid rgba(128, 128, 128, 0.2);
  border-radius: var(--jp-border-radius);
}
.jp-cell-input-content, .jp-cell-output-content { padding: 4px 8px; overflow-x: auto; }
.jp-code-source {
  margin: 0;
  font-family: var(--jp-code-font-family);
  font-size: var(--jp-code-font-size);
  line-height: var(--jp-code-line-height);
  background: transparent;
}
.jp-code-source.jp-line-numbers { display: flex; }
.jp-line-gutter {
  flex: 0 0 auto;
  margin-right: 1em;
  text-align: right;
  opacity: 0.5;
  user-select: none;
}
.jp-language-indicator {
  position: absolute;
  top: 4px;
  right: 8px;
  font-family: var(--jp-ui-font-family);
  font-size: var(--jp-ui-font-size0);
  opacity: 0.6;
  text-transform: lowercase;
}
.jp-copy-button {
  position: absolute;
  bottom: 4px;
  right: 8px;
  font-size: var(--jp-ui-font-size0);
  cursor: pointer;
}
.jp-markdown-content { font-size: var(--jp-ui-font-size2); line-height: 1.6; }
.jp-markdown-content code, .jp-markdown-content pre { font-family: var(--jp-code-font-family); }
.jp-markdown-content blockquote { margin: 0; padding-left: 1em; border-left: 3px solid rgba(128, 128, 128, 0.4); }
.jp-cell-outputs { margin-top: 4px; }
.jp-output-stream pre, .notebook-output-text pre {
  margin: 0;
  font-family: var(--jp-code-font-family);
  font-size: var(--jp-code-font-size);
  line-height: var(--jp-code-line-height);
  white-space: pre-wrap;
  word-wrap: break-word;
}
.jp-output-stderr pre { background: rgba(255, 221, 221, 0.5); }
.jp-output-error { color: var(--jp-error-color); font-family: var(--jp-code-font-family); font-size: var(--jp-code-font-size); }
.jp-output-error-name { font-weight: bold; margin-bottom: 4px; }
.jp-output-traceback {
  margin: 0;
  padding: 8px;
  white-space: pre-wrap;
  overflow-x: auto;
  background: rgba(211, 47, 47, 0.1);
  border: 1px solid rgba(211, 47, 47, 0.3);
  border-radius: var(--jp-border-radius);
}
.notebook-output-image { text-align: center; margin: 4px 0; padding: 4px; }
.notebook-output-image img { max-width: 100%; height: auto; }
.notebook-output-html { margin: 4px 0; font-size: var(--jp-ui-font-size2); line-height: 1.6; }
.notebook-output-json pre, .jp-chart-static pre {
  margin: 0;
  padding: 8px;
  font-family: var(--jp-code-font-family);
  font-size: var(--jp-code-font-size);
  white-space: pre-wrap;
  background: rgba(128, 128, 128, 0.05);
  border: 1px solid rgba(128, 128, 128, 0.2);
  border-radius: var(--jp-border-radius);
}
.notebook-output-latex { overflow-x: auto; }
.jp-chart-loading, .jp-chart-message { padding: 8px; font-style: italic; opacity: 0.7; }
.jp-output-degraded-note { color: var(--jp-error-color); font-size: var(--jp-ui-font-size0); font-style: italic; }
.jp-notebook-error {
  padding: 16px;
  text-align: center;
  font-style: italic;
  color: var(--jp-error-color);
  background: rgba(211, 47, 47, 0.1);
  border: 1px solid rgba(211, 47, 47, 0.3);
  border-radius: var(--jp-border-radius);
}
@media (max-width: 768px) {
  .jp-notebook { font-size: var(--jp-ui-font-size0); }
  .jp-cell-input-prompt, .jp-cell-output-prompt { flex: 0 0 48px; }
}
@media print {
  .jp-notebook-cell { break-inside: avoid; }
  .jp-copy-button { display: none; }
}
"#;

/// The full notebook stylesheet: layout plus highlight token colors
#[must_use]
pub fn notebook_stylesheet() -> String {
    let tokens = SyntectHighlighter::shared().stylesheet().unwrap_or_default();
    format!("{NOTEBOOK_CSS}{tokens}")
}

/// A page or document that collects stylesheets by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTarget {
    styles: Vec<(String, String)>,
}

impl RenderTarget {
    /// Empty target
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stylesheet under `id` unless one is already present.
    ///
    /// `css` is only evaluated when the stylesheet is inserted. Returns `true`
    /// if this call inserted it.
    pub fn ensure_stylesheet(&mut self, id: &str, css: impl FnOnce() -> String) -> bool {
        if self.has_stylesheet(id) {
            return false;
        }
        self.styles.push((id.to_string(), css()));
        true
    }

    /// Register the notebook stylesheet under [`STYLESHEET_ID`]
    pub fn ensure_notebook_styles(&mut self) -> bool {
        self.ensure_stylesheet(STYLESHEET_ID, notebook_stylesheet)
    }

    /// Whether a stylesheet with `id` is registered
    #[must_use]
    pub fn has_stylesheet(&self, id: &str) -> bool {
        self.styles.iter().any(|(existing, _)| existing == id)
    }

    /// CSS registered under `id`
    #[must_use]
    pub fn stylesheet(&self, id: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, css)| css.as_str())
    }

    /// Number of registered stylesheets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// `<style>` elements for every registered stylesheet, in insertion order
    #[must_use]
    pub fn head(&self) -> String {
        self.styles
            .iter()
            .map(|(id, css)| format!("<style id=\"{}\">\n{css}</style>\n", escape_html(id)))
            .collect()
    }

    /// Standalone HTML page around `body`
    #[must_use]
    pub fn to_html_page(&self, title: &str, body: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}</head>\n<body>\n{body}\n</body>\n</html>\n",
            escape_html(title),
            self.head()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_stylesheet_is_idempotent() {
        let mut target = RenderTarget::new();
        assert!(target.ensure_stylesheet("a", || "p {}".to_string()));
        assert!(!target.ensure_stylesheet("a", || panic!("css must not be rebuilt")));
        assert_eq!(target.len(), 1);
        assert_eq!(target.head(), "<style id=\"a\">\np {}</style>\n");
    }

    #[test]
    fn test_notebook_styles_registered_once() {
        let mut target = RenderTarget::new();
        assert!(target.ensure_notebook_styles());
        assert!(!target.ensure_notebook_styles());
        assert!(target.has_stylesheet(STYLESHEET_ID));
        let head = target.head();
        assert_eq!(head.matches("<style").count(), 1);
        assert!(head.contains(".jp-notebook"));
        assert!(head.contains(".hl-"), "highlight token styles are included");
    }

    #[test]
    fn test_html_page() {
        let target = RenderTarget::new();
        let page = target.to_html_page("a < b", "<p>x</p>");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>a &lt; b</title>"));
        assert!(page.contains("<body>\n<p>x</p>\n</body>"));
    }
}
