//! Renderable content tree.
//!
//! Every renderer produces [`Node`]s. The tree serializes to an HTML fragment
//! (for MDX embedding or standalone pages) and to JSON (for component props).
//! Literal markup from trusted notebook outputs travels as [`Node::Raw`] and is
//! written out verbatim; everything else is escaped on the way out.

use serde::Serialize;
use std::fmt::Write;

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// Identifier of a replaceable region of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl std::fmt::Display for SlotId {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An element with ordered attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    #[inline]
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    /// Add a `class` attribute
    #[inline]
    #[must_use]
    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Append a child only when present
    #[must_use]
    pub fn maybe_child(mut self, node: Option<impl Into<Node>>) -> Self {
        if let Some(node) = node {
            self.children.push(node.into());
        }
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    /// Value of an attribute, if set
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the `class` attribute contains `class`
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

/// A node of the content tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Element(Element),
    /// Plain text, escaped on output
    Text { value: String },
    /// Literal markup, written verbatim
    Raw { html: String },
    /// Replaceable region; holds a complete fallback until hydrated.
    /// Inline slots render as `<span>`, block slots as `<div>`.
    Slot {
        id: SlotId,
        inline: bool,
        content: Box<Node>,
    },
    /// Sequence of siblings without a wrapper element
    Fragment { children: Vec<Node> },
}

impl From<Element> for Node {
    #[inline]
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl Node {
    /// Text node
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Literal markup node
    #[inline]
    #[must_use]
    pub fn raw(html: impl Into<String>) -> Self {
        Self::Raw { html: html.into() }
    }

    /// Slot node
    #[inline]
    #[must_use]
    pub fn slot(id: SlotId, inline: bool, content: Self) -> Self {
        Self::Slot {
            id,
            inline,
            content: Box::new(content),
        }
    }

    /// Fragment node
    #[inline]
    #[must_use]
    pub fn fragment(children: Vec<Node>) -> Self {
        Self::Fragment { children }
    }

    /// Serialize as an HTML fragment
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Append the HTML form of this node to `out`
    pub fn write_html(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attrs {
                    let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    return;
                }
                for child in &element.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", element.tag);
            }
            Self::Text { value } => out.push_str(&escape_html(value)),
            Self::Raw { html } => out.push_str(html),
            Self::Slot {
                id,
                inline,
                content,
            } => {
                let tag = if *inline { "span" } else { "div" };
                let _ = write!(out, "<{tag} data-nb-slot=\"{id}\">");
                content.write_html(out);
                let _ = write!(out, "</{tag}>");
            }
            Self::Fragment { children } => {
                for child in children {
                    child.write_html(out);
                }
            }
        }
    }

    /// Visible text of the subtree. Markup inside raw nodes is stripped and
    /// entities are decoded, so highlighted and plain renderings of the same
    /// source compare equal.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Self::Text { value } => out.push_str(value),
            Self::Raw { html } => out.push_str(&strip_markup(html)),
            Self::Slot { content, .. } => content.collect_text(out),
            Self::Fragment { children } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Replace the content of slot `id`. Returns `false` if no such slot.
    pub fn replace_slot(&mut self, id: SlotId, replacement: Self) -> bool {
        match self.find_slot_mut(id) {
            Some(content) => {
                *content = replacement;
                true
            }
            None => false,
        }
    }

    fn find_slot_mut(&mut self, target: SlotId) -> Option<&mut Self> {
        match self {
            Self::Slot { id, content, .. } => {
                if *id == target {
                    Some(content.as_mut())
                } else {
                    content.find_slot_mut(target)
                }
            }
            Self::Element(Element { children, .. }) | Self::Fragment { children } => children
                .iter_mut()
                .find_map(|child| child.find_slot_mut(target)),
            Self::Text { .. } | Self::Raw { .. } => None,
        }
    }

    /// Ids of all slots in document order
    #[must_use]
    pub fn slot_ids(&self) -> Vec<SlotId> {
        let mut ids = Vec::new();
        self.visit(&mut |node| {
            if let Self::Slot { id, .. } = node {
                ids.push(*id);
            }
        });
        ids
    }

    /// All elements carrying `class`, in document order
    #[must_use]
    pub fn find_by_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_by_class(class, &mut found);
        found
    }

    fn collect_by_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        match self {
            Self::Element(element) => {
                if element.has_class(class) {
                    found.push(element);
                }
                for child in &element.children {
                    child.collect_by_class(class, found);
                }
            }
            Self::Slot { content, .. } => content.collect_by_class(class, found),
            Self::Fragment { children } => {
                for child in children {
                    child.collect_by_class(class, found);
                }
            }
            Self::Text { .. } | Self::Raw { .. } => {}
        }
    }

    fn visit(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        match self {
            Self::Element(Element { children, .. }) | Self::Fragment { children } => {
                for child in children {
                    child.visit(f);
                }
            }
            Self::Slot { content, .. } => content.visit(f),
            Self::Text { .. } | Self::Raw { .. } => {}
        }
    }
}

/// Escape text content (`&`, `<`, `>`)
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Escape an attribute value (text escapes plus quotes)
#[must_use]
pub fn escape_attr(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Drop tags and decode the basic entities
fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_html() {
        let node: Node = Element::new("div")
            .class("jp-output")
            .attr("title", "a \"quoted\" <value>")
            .child(Node::text("1 < 2 & 3"))
            .into();
        assert_eq!(
            node.to_html(),
            "<div class=\"jp-output\" title=\"a &quot;quoted&quot; &lt;value&gt;\">1 &lt; 2 &amp; 3</div>"
        );
    }

    #[test]
    fn test_void_element_has_no_closing_tag() {
        let node: Node = Element::new("img").attr("src", "x.png").into();
        assert_eq!(node.to_html(), "<img src=\"x.png\">");
    }

    #[test]
    fn test_raw_is_verbatim() {
        let node = Node::raw("<b>bold</b>");
        assert_eq!(node.to_html(), "<b>bold</b>");
        assert_eq!(node.text_content(), "bold");
    }

    #[test]
    fn test_text_content_decodes_entities() {
        let node = Node::raw("<span class=\"k\">if</span> a &lt; b &amp;&amp; c");
        assert_eq!(node.text_content(), "if a < b && c");
    }

    #[test]
    fn test_replace_slot_only_touches_target() {
        let mut root: Node = Element::new("div")
            .child(Node::slot(SlotId(0), false, Node::text("loading")))
            .child(Node::slot(SlotId(1), true, Node::text("sibling")))
            .into();

        assert!(root.replace_slot(SlotId(0), Node::text("done")));
        assert!(!root.replace_slot(SlotId(9), Node::text("nope")));
        assert_eq!(root.text_content(), "donesibling");
        assert_eq!(root.slot_ids(), vec![SlotId(0), SlotId(1)]);
        assert_eq!(
            root.to_html(),
            "<div><div data-nb-slot=\"0\">done</div><span data-nb-slot=\"1\">sibling</span></div>"
        );
    }

    #[test]
    fn test_find_by_class() {
        let root: Node = Element::new("div")
            .class("outer")
            .child(Element::new("span").class("a b"))
            .child(Node::fragment(vec![Element::new("p").class("b").into()]))
            .into();
        let found = root.find_by_class("b");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].tag, "span");
        assert_eq!(found[1].tag, "p");
    }

    #[test]
    fn test_json_shape() {
        let node: Node = Element::new("pre").child(Node::text("x")).into();
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "element");
        assert_eq!(json["tag"], "pre");
        assert_eq!(json["children"][0]["type"], "text");
        assert_eq!(json["children"][0]["value"], "x");
    }
}
