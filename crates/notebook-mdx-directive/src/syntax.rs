//! Line scanner for `notebook` directives in MDX source
//!
//! The document is split into verbatim text and directive blocks. Fenced
//! code blocks are passed through untouched so documentation can show the
//! directive syntax itself. Directives with other names are left alone.

use crate::attributes::Attributes;
use crate::error::{DirectiveError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Name of the directive this crate expands
pub const DIRECTIVE_NAME: &str = "notebook";

/// `::notebook[label]{attrs}` or `:::notebook[label]{attrs}` alone on a line
static OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(:{2,})notebook(?:\[([^\]]*)\])?(?:\{(.*)\})?[ \t]*$")
        .expect("valid directive opener regex")
});

/// Any container opener, used to track nesting inside a container
static ANY_CONTAINER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(:{3,})[A-Za-z][\w-]*").expect("valid container opener regex")
});

static CLOSER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(:{3,})[ \t]*$").expect("valid container closer regex"));

/// `:notebook` used inline (not preceded by a colon or word character)
static TEXT_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^:\w]):notebook(?:[^\w-]|$)").expect("valid text directive regex")
});

static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`+[^`\n]*`+").expect("valid inline code regex"));

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").expect("valid code fence regex"));

/// Leaf or container form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `::notebook{...}`
    Leaf,
    /// `:::notebook{...}` ... `:::`
    Container,
}

/// One `notebook` directive found in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// One-based line of the opener
    pub line: usize,
    /// Text in `[...]` after the name
    pub label: Option<String>,
    pub attributes: Attributes,
    /// Lines between a container's opener and closer
    pub content: Option<String>,
}

/// A piece of the scanned document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Source passed through verbatim, line endings included
    Text(String),
    Directive(Directive),
}

/// Tracks whether the scanner is inside a fenced code block
#[derive(Debug, Default)]
struct FenceState {
    open: Option<(char, usize)>,
}

impl FenceState {
    /// Feed one line; returns `true` if the line belongs to a code block
    /// (including its fences).
    fn update(&mut self, line: &str) -> bool {
        let fence = FENCE.captures(line).map(|caps| {
            let run = &caps[1];
            (run.chars().next().unwrap_or('`'), run.len())
        });
        match (self.open, fence) {
            (Some((ch, len)), Some((fch, flen))) if ch == fch && flen >= len => {
                let rest = line.trim_start().trim_start_matches(ch);
                if rest.trim().is_empty() {
                    self.open = None;
                }
                true
            }
            (Some(_), _) => true,
            (None, Some(opened)) => {
                self.open = Some(opened);
                true
            }
            (None, None) => false,
        }
    }
}

/// Split `source` into text and `notebook` directives.
///
/// # Errors
///
/// - [`DirectiveError::TextDirective`] for an inline `:notebook`
/// - [`DirectiveError::Malformed`] for an attribute list that does not parse
/// - [`DirectiveError::UnclosedContainer`] when a container has no closer
pub fn scan(source: &str) -> Result<Vec<Segment>> {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut fences = FenceState::default();
    let mut index = 0;

    while index < lines.len() {
        let raw = lines[index];
        let line = strip_line_ending(raw);
        let line_no = index + 1;
        index += 1;

        if fences.update(line) {
            text.push_str(raw);
            continue;
        }

        let Some(caps) = OPENER.captures(line) else {
            let visible = INLINE_CODE.replace_all(line, "");
            if TEXT_DIRECTIVE.is_match(&visible) {
                return Err(DirectiveError::TextDirective { line: line_no });
            }
            text.push_str(raw);
            continue;
        };

        let colons = caps[1].len();
        let label = caps.get(2).map(|m| m.as_str().to_string());
        let attributes = match caps.get(3) {
            Some(m) => Attributes::parse(m.as_str()).map_err(|reason| {
                DirectiveError::Malformed {
                    line: line_no,
                    reason,
                }
            })?,
            None => Attributes::default(),
        };

        let (kind, content) = if colons == 2 {
            (DirectiveKind::Leaf, None)
        } else {
            let (content, next) = collect_container(&lines, index, colons)
                .ok_or(DirectiveError::UnclosedContainer { line: line_no })?;
            index = next;
            (DirectiveKind::Container, Some(content))
        };

        if !text.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut text)));
        }
        log::trace!("found {kind:?} notebook directive at line {line_no}");
        segments.push(Segment::Directive(Directive {
            kind,
            line: line_no,
            label,
            attributes,
            content,
        }));
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

/// Gather container content starting at `start`; returns the content and
/// the index of the line after the closer.
fn collect_container(lines: &[&str], start: usize, colons: usize) -> Option<(String, usize)> {
    let mut depth = 0usize;
    let mut fences = FenceState::default();
    let mut content = String::new();

    for (offset, raw) in lines[start..].iter().enumerate() {
        let line = strip_line_ending(raw);
        if fences.update(line) {
            content.push_str(raw);
            continue;
        }
        if let Some(caps) = CLOSER.captures(line) {
            if depth == 0 && caps[1].len() >= colons {
                return Some((content, start + offset + 1));
            }
            depth = depth.saturating_sub(1);
        } else if ANY_CONTAINER.is_match(line) {
            depth += 1;
        }
        content.push_str(raw);
    }
    None
}

fn strip_line_ending(raw: &str) -> &str {
    raw.strip_suffix('\n')
        .map_or(raw, |line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directives(source: &str) -> Vec<Directive> {
        scan(source)
            .unwrap()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Directive(d) => Some(d),
                Segment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_leaf_directive() {
        let found = directives("# Title\n\n::notebook{file=\"a.ipynb\" hideCode}\n\nAfter\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DirectiveKind::Leaf);
        assert_eq!(found[0].line, 3);
        assert_eq!(found[0].attributes.get("file"), Some("a.ipynb"));
        assert_eq!(found[0].content, None);
    }

    #[test]
    fn test_text_is_preserved_around_directive() {
        let segments = scan("before\n::notebook{file=a.ipynb}\nafter").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::Text("before\n".to_string()));
        assert_eq!(segments[2], Segment::Text("after".to_string()));
    }

    #[test]
    fn test_container_directive_with_nested_block() {
        let source = ":::notebook[Figure 1]{file=b.ipynb}\nSome *caption*.\n:::tip\nnested\n:::\n:::\ntail\n";
        let segments = scan(source).unwrap();
        let Segment::Directive(found) = &segments[0] else {
            panic!("expected a directive first, got {segments:?}");
        };
        assert_eq!(found.kind, DirectiveKind::Container);
        assert_eq!(found.label.as_deref(), Some("Figure 1"));
        assert_eq!(
            found.content.as_deref(),
            Some("Some *caption*.\n:::tip\nnested\n:::\n")
        );
        assert_eq!(segments[1], Segment::Text("tail\n".to_string()));
    }

    #[test]
    fn test_unclosed_container() {
        let err = scan("intro\n:::notebook{file=x.ipynb}\ncaption\n").unwrap_err();
        assert!(matches!(err, DirectiveError::UnclosedContainer { line: 2 }), "{err:?}");
    }

    #[test]
    fn test_text_directive_is_rejected() {
        let err = scan("See :notebook[demo]{file=x.ipynb} inline.\n").unwrap_err();
        assert!(matches!(err, DirectiveError::TextDirective { line: 1 }), "{err:?}");
    }

    #[test]
    fn test_inline_code_and_urls_are_not_directives() {
        let source = "Write `:notebook` as `::notebook{file=...}`.\nSee https:notebook.example\n";
        assert!(directives(source).is_empty());
    }

    #[test]
    fn test_fenced_code_is_skipped() {
        let source = "```md\n::notebook{file=\"x.ipynb\"}\n:notebook\n```\n";
        let segments = scan(source).unwrap();
        assert_eq!(segments, vec![Segment::Text(source.to_string())]);
    }

    #[test]
    fn test_other_directives_untouched() {
        let source = "::youtube{id=abc}\n:::note\nhello\n:::\n";
        assert!(directives(source).is_empty());
    }

    #[test]
    fn test_malformed_attributes() {
        let err = scan("::notebook{file=\"x.ipynb}\n").unwrap_err();
        assert!(matches!(err, DirectiveError::Malformed { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn test_crlf_line_endings() {
        let found = directives("intro\r\n::notebook{file=a.ipynb}\r\nrest\r\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].attributes.get("file"), Some("a.ipynb"));
    }
}
