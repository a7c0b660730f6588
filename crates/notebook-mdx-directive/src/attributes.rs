//! Directive attribute lists: `{file="a.ipynb" hideCode #intro .wide}`
//!
//! Supported forms:
//! - `key="value"`, `key='value'` and unquoted `key=value`
//! - bare `key` (value is the empty string)
//! - `#id` shorthand for `id="id"`
//! - `.name` shorthand, accumulated into a space-separated `class`
//!
//! A repeated key keeps its first position and takes the last value.

/// Parsed attributes in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Parse the text between the braces.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason for unterminated quotes, empty
    /// shorthands and stray characters.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut attrs = Self::default();
        let mut chars = input.chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }
            match c {
                '#' | '.' => {
                    chars.next();
                    let mut token = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_whitespace() || matches!(next, '#' | '.' | '=' | '"' | '\'') {
                            break;
                        }
                        token.push(next);
                        chars.next();
                    }
                    if token.is_empty() {
                        return Err(format!("expected a name after `{c}`"));
                    }
                    if c == '#' {
                        attrs.set("id", token);
                    } else {
                        attrs.push_class(&token);
                    }
                }
                c if is_name_start(c) => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if !is_name_char(next) {
                            break;
                        }
                        name.push(next);
                        chars.next();
                    }
                    skip_whitespace(&mut chars);
                    if chars.peek() != Some(&'=') {
                        attrs.set(&name, String::new());
                        continue;
                    }
                    chars.next();
                    skip_whitespace(&mut chars);
                    let value = match chars.peek().copied() {
                        Some(quote @ ('"' | '\'')) => {
                            chars.next();
                            let mut value = String::new();
                            loop {
                                match chars.next() {
                                    Some(ch) if ch == quote => break,
                                    Some(ch) => value.push(ch),
                                    None => {
                                        return Err(format!("unterminated quote in `{name}`"))
                                    }
                                }
                            }
                            value
                        }
                        _ => {
                            let mut value = String::new();
                            while let Some(&next) = chars.peek() {
                                if next.is_whitespace() || matches!(next, '"' | '\'' | '=' | '<' | '>' | '`') {
                                    break;
                                }
                                value.push(next);
                                chars.next();
                            }
                            if value.is_empty() {
                                return Err(format!("missing value for `{name}`"));
                            }
                            value
                        }
                    };
                    if name == "class" {
                        attrs.push_class(&value);
                    } else {
                        attrs.set(&name, value);
                    }
                }
                other => return Err(format!("unexpected character `{other}`")),
            }
        }

        Ok(attrs)
    }

    /// Value of `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in source order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct attributes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no attributes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set(&mut self, name: &str, value: String) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    fn push_class(&mut self, class: &str) {
        let class = class.trim();
        if class.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(key, _)| key == "class") {
            Some((_, existing)) if !existing.is_empty() => {
                existing.push(' ');
                existing.push_str(class);
            }
            Some((_, existing)) => class.clone_into(existing),
            None => self.entries.push(("class".to_string(), class.to_string())),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-')
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_bare_and_unquoted() {
        let attrs =
            Attributes::parse(r#"file="demo.ipynb" hideCode showOutputs=false title='A "quoted" title'"#)
                .unwrap();
        assert_eq!(attrs.get("file"), Some("demo.ipynb"));
        assert_eq!(attrs.get("hideCode"), Some(""));
        assert_eq!(attrs.get("showOutputs"), Some("false"));
        assert_eq!(attrs.get("title"), Some("A \"quoted\" title"));
        assert_eq!(attrs.len(), 4);
    }

    #[test]
    fn test_dot_ends_a_name() {
        let attrs = Attributes::parse("hideCode.compact file=a.ipynb").unwrap();
        assert_eq!(attrs.get("hideCode"), Some(""));
        assert_eq!(attrs.get("class"), Some("compact"));
        assert_eq!(attrs.get("file"), Some("a.ipynb"), "dots inside values are kept");
        assert!(attrs.iter().all(|(name, _)| !name.contains('.')));
    }

    #[test]
    fn test_shorthands() {
        let attrs = Attributes::parse("#intro .wide .dark class=extra").unwrap();
        assert_eq!(attrs.get("id"), Some("intro"));
        assert_eq!(attrs.get("class"), Some("wide dark extra"));
    }

    #[test]
    fn test_repeated_key_keeps_position_takes_last_value() {
        let attrs = Attributes::parse("a=1 b=2 a=3").unwrap();
        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_spaces_around_equals() {
        let attrs = Attributes::parse(r#"file = "x.ipynb""#).unwrap();
        assert_eq!(attrs.get("file"), Some("x.ipynb"));
    }

    #[test]
    fn test_errors() {
        assert!(Attributes::parse(r#"file="x.ipynb"#).unwrap_err().contains("unterminated"));
        assert!(Attributes::parse("file=").unwrap_err().contains("missing value"));
        assert!(Attributes::parse("# .").is_err());
        assert!(Attributes::parse("!bang").unwrap_err().contains("unexpected character"));
    }

    #[test]
    fn test_empty() {
        assert!(Attributes::parse("   ").unwrap().is_empty());
    }
}
