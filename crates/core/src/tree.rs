//! Markup tree model and HTML serialization.
//!
//! A closed set of node kinds produced by a
//! [`MarkupParser`](crate::parser::MarkupParser) and consumed by the walker.
//! Rendering lives here so every component agrees on how a tag or text run
//! is written out and how many codepoints it costs.

use std::borrow::Cow;

use crate::fragment::codepoint_len;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text content is written out without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "noscript",
    "plaintext",
];

/// Elements inside which whitespace is significant. A parser discards one
/// newline right after their start tag.
const PREFORMATTED_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

pub fn is_preformatted_element(name: &str) -> bool {
    PREFORMATTED_ELEMENTS.contains(&name) || is_raw_text_element(name)
}

/// Escape `&`, `<` and `>` in text content.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Escape `&` and `"` in a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '"']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An element name with its attributes, pre-rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    name: String,
    attributes: Vec<Attribute>,
    opening: String,
    closing: String,
    opening_length: usize,
    closing_length: usize,
}

impl Tag {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        let name = name.into();
        let mut opening = format!("<{name}");
        for attribute in &attributes {
            opening.push(' ');
            opening.push_str(&attribute.name);
            if !attribute.value.is_empty() {
                opening.push_str("=\"");
                opening.push_str(&escape_attribute(&attribute.value));
                opening.push('"');
            }
        }
        opening.push('>');
        if PREFORMATTED_ELEMENTS.contains(&name.as_str()) {
            // Consumed on reparse, so a leading newline in the content survives.
            opening.push('\n');
        }
        let closing = format!("</{name}>");

        Self {
            opening_length: codepoint_len(&opening),
            closing_length: codepoint_len(&closing),
            name,
            attributes,
            opening,
            closing,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn opening(&self) -> &str {
        &self.opening
    }

    pub fn closing(&self) -> &str {
        &self.closing
    }

    pub fn opening_length(&self) -> usize {
        self.opening_length
    }

    pub fn closing_length(&self) -> usize {
        self.closing_length
    }

    /// Codepoints spent on the opening plus the closing tag.
    pub fn overhead(&self) -> usize {
        self.opening_length + self.closing_length
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.name)
    }

    pub fn is_raw_text(&self) -> bool {
        is_raw_text_element(&self.name)
    }
}

/// Ordered chain of open tags from the root to the current position.
///
/// Only ever grows and shrinks at the end, so it is always a valid
/// ancestor chain and closes in reverse-open order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPath {
    tags: Vec<Tag>,
    opening_length: usize,
    closing_length: usize,
}

impl TagPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: Tag) {
        self.opening_length += tag.opening_length();
        self.closing_length += tag.closing_length();
        self.tags.push(tag);
    }

    pub fn pop(&mut self) -> Option<Tag> {
        let tag = self.tags.pop()?;
        self.opening_length -= tag.opening_length();
        self.closing_length -= tag.closing_length();
        Some(tag)
    }

    pub fn depth(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn last(&self) -> Option<&Tag> {
        self.tags.last()
    }

    /// Opening tags in forward-open order.
    pub fn opening_tags(&self) -> String {
        self.tags.iter().map(Tag::opening).collect()
    }

    /// Closing tags for the first `depth` entries, innermost first.
    pub fn closing_tags_to(&self, depth: usize) -> String {
        self.tags[..depth.min(self.tags.len())]
            .iter()
            .rev()
            .map(Tag::closing)
            .collect()
    }

    /// Closing tags for the whole path, innermost first.
    pub fn closing_tags(&self) -> String {
        self.closing_tags_to(self.tags.len())
    }

    pub fn opening_length(&self) -> usize {
        self.opening_length
    }

    pub fn closing_length(&self) -> usize {
        self.closing_length
    }

    /// Codepoints needed to reopen and close the whole path.
    pub fn overhead(&self) -> usize {
        self.opening_length + self.closing_length
    }

    /// Names of the open tags, e.g. `table > tbody > tr`.
    pub fn describe(&self) -> String {
        self.tags
            .iter()
            .map(Tag::name)
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Decoded text content.
    Text(String),
    Element { tag: Tag, children: Vec<Node> },
    Void(Tag),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn element(name: &str, attributes: Vec<Attribute>, children: Vec<Node>) -> Self {
        Self::Element {
            tag: Tag::new(name, attributes),
            children,
        }
    }

    pub fn void(name: &str, attributes: Vec<Attribute>) -> Self {
        Self::Void(Tag::new(name, attributes))
    }

    fn render_into(&self, out: &mut String, raw: bool) {
        match self {
            Self::Text(text) if raw => out.push_str(text),
            Self::Text(text) => out.push_str(&escape_text(text)),
            Self::Void(tag) => out.push_str(tag.opening()),
            Self::Element { tag, children } => {
                out.push_str(tag.opening());
                for child in children {
                    child.render_into(out, tag.is_raw_text());
                }
                out.push_str(tag.closing());
            }
        }
    }

    fn text_into(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Void(_) => {}
            Self::Element { children, .. } => children.iter().for_each(|c| c.text_into(out)),
        }
    }

    fn element_count(&self) -> usize {
        match self {
            Self::Text(_) => 0,
            Self::Void(_) => 1,
            Self::Element { children, .. } => {
                1 + children.iter().map(Node::element_count).sum::<usize>()
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Self::Text(_) => 0,
            Self::Void(_) => 1,
            Self::Element { children, .. } => {
                1 + children.iter().map(Node::depth).max().unwrap_or(0)
            }
        }
    }
}

/// A parsed document fragment: an ordered list of top-level nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTree {
    nodes: Vec<Node>,
}

impl TagTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// True when at least one element (void or not) is present.
    pub fn has_elements(&self) -> bool {
        self.nodes.iter().any(|n| !matches!(n, Node::Text(_)))
    }

    pub fn element_count(&self) -> usize {
        self.nodes.iter().map(Node::element_count).sum()
    }

    /// Deepest element nesting level.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Serialize back to HTML.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.render_into(&mut out, false);
        }
        out
    }

    /// Concatenated decoded text of every text node, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.text_into(&mut out);
        }
        out
    }
}
