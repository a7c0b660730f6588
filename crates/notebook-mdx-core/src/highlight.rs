//! Syntax highlighting for code inputs and plain-text outputs.
//!
//! The default engine is [`SyntectHighlighter`], which emits class-based
//! markup (`hl-*` classes) so the matching theme CSS can be registered once
//! per page. Loading the syntax set takes a noticeable moment, so the shared
//! instance is built lazily and can be warmed up off the async runtime with
//! [`SyntectHighlighter::load`].
//!
//! Highlighted markup is always textually equivalent to the input: stripping
//! the tags and decoding entities gives back the source exactly.

use crate::error::HighlightError;
use std::sync::{Arc, OnceLock};
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Class prefix for highlighted tokens
pub const CLASS_PREFIX: &str = "hl-";

/// Theme used to generate the token stylesheet
const THEME_NAME: &str = "InspiredGitHub";

/// Map a cell language name to its canonical highlighter name.
///
/// Lookup is case-insensitive; unknown names pass through lowercased. Returns
/// `None` for empty input and for `raw`, which is never highlighted.
///
/// # Examples
///
/// ```
/// use notebook_mdx_core::highlight::normalize_language;
///
/// assert_eq!(normalize_language("py").as_deref(), Some("python"));
/// assert_eq!(normalize_language("Shell").as_deref(), Some("bash"));
/// assert_eq!(normalize_language("Haskell").as_deref(), Some("haskell"));
/// assert_eq!(normalize_language("raw"), None);
/// ```
#[must_use]
pub fn normalize_language(language: &str) -> Option<String> {
    let lower = language.trim().to_lowercase();
    let canonical = match lower.as_str() {
        "" | "raw" => return None,
        "py" | "python3" | "ipython" | "ipython3" => "python",
        "js" | "node" => "javascript",
        "ts" => "typescript",
        "sh" | "shell" | "shellscript" | "zsh" => "bash",
        "md" => "markdown",
        "tex" => "latex",
        "yml" => "yaml",
        "c++" => "cpp",
        "c#" | "cs" => "csharp",
        "golang" => "go",
        "rs" => "rust",
        "rb" => "ruby",
        "kt" => "kotlin",
        "docker" => "dockerfile",
        "make" => "makefile",
        _ => return Some(lower),
    };
    Some(canonical.to_string())
}

/// A syntax highlighter.
///
/// Implementations must return markup whose visible text equals `code`.
pub trait HighlightEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Highlight `code` as `language` (a normalized name).
    ///
    /// With `language = None` the engine may detect a language from the
    /// first line. Returns `Ok(None)` when no grammar applies.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError`] if the engine is not ready or fails while
    /// tokenizing.
    fn highlight(&self, code: &str, language: Option<&str>)
        -> Result<Option<String>, HighlightError>;

    /// CSS for the classes this engine emits
    fn stylesheet(&self) -> Option<String> {
        None
    }
}

/// Highlighting backed by syntect's bundled grammars
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
}

static SHARED: OnceLock<Arc<SyntectHighlighter>> = OnceLock::new();

impl SyntectHighlighter {
    /// Build a highlighter with syntect's default grammars (slow; prefer
    /// [`shared`](Self::shared))
    #[must_use]
    pub fn new() -> Self {
        log::debug!("Loading syntect syntax set");
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Process-wide instance, loaded on first use
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    /// Process-wide instance if it has already been loaded
    #[inline]
    #[must_use]
    pub fn try_shared() -> Option<Arc<Self>> {
        SHARED.get().cloned()
    }

    /// Load the process-wide instance on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError::NotReady`] if the loading task panicked or
    /// was cancelled.
    pub async fn load() -> Result<Arc<Self>, HighlightError> {
        if let Some(ready) = Self::try_shared() {
            return Ok(ready);
        }
        tokio::task::spawn_blocking(Self::shared)
            .await
            .map_err(|_| HighlightError::NotReady)
    }

    fn find_syntax(&self, language: &str) -> Option<&SyntaxReference> {
        let token = match language {
            "csharp" => "cs",
            "latex" => "tex",
            "markdown" => "md",
            "shell" => "sh",
            other => other,
        };
        self.syntaxes.find_syntax_by_token(token)
    }

    fn class_style() -> ClassStyle {
        ClassStyle::SpacedPrefixed {
            prefix: CLASS_PREFIX,
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyntectHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntectHighlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .finish()
    }
}

impl HighlightEngine for SyntectHighlighter {
    fn name(&self) -> &str {
        "syntect"
    }

    fn highlight(
        &self,
        code: &str,
        language: Option<&str>,
    ) -> Result<Option<String>, HighlightError> {
        let syntax = match language {
            Some(language) => self.find_syntax(language),
            None => code
                .lines()
                .next()
                .and_then(|first| self.syntaxes.find_syntax_by_first_line(first)),
        };
        let Some(syntax) = syntax else {
            return Ok(None);
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, Self::class_style());
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| HighlightError::Failed(e.to_string()))?;
        }
        Ok(Some(generator.finalize()))
    }

    fn stylesheet(&self) -> Option<String> {
        let themes = syntect::highlighting::ThemeSet::load_defaults();
        let theme = themes.themes.get(THEME_NAME)?;
        css_for_theme_with_class_style(theme, Self::class_style()).ok()
    }
}

/// How a renderer obtains syntax highlighting
#[derive(Clone)]
pub enum Highlighting {
    /// Highlight during the synchronous pass
    Ready(Arc<dyn HighlightEngine>),
    /// Highlight with the shared syntect instance, loading it on first use
    Syntect,
    /// Emit plain text in a slot and highlight during hydration
    Deferred,
    /// Never highlight
    Disabled,
}

impl Highlighting {
    /// Use the shared syntect instance if it is loaded, else defer
    #[must_use]
    pub fn auto() -> Self {
        match SyntectHighlighter::try_shared() {
            Some(engine) => Self::Ready(engine),
            None => Self::Deferred,
        }
    }
}

impl std::fmt::Debug for Highlighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(engine) => write!(f, "Ready({})", engine.name()),
            Self::Syntect => f.write_str("Syntect"),
            Self::Deferred => f.write_str("Deferred"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}
