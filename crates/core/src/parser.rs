//! MarkupParser trait and the html5ever-backed implementation.
//!
//! A parser turns raw input into a [`TagTree`]. Any failure is reported as a
//! [`ParseError`] and the caller falls back to plain-text splitting, so
//! implementations never need to be lenient on our behalf.

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::debug;

use crate::error::ParseError;
use crate::tree::{Attribute, Node, TagTree, is_preformatted_element, is_void_element};

/// Deepest element nesting accepted before the input is rejected.
pub const DEFAULT_MAX_DEPTH: usize = 256;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parses raw input into a markup tree.
///
/// Implementations: [`Html5everParser`]. Tests substitute stubs.
pub trait MarkupParser: Send + Sync {
    /// The parser name (e.g., "html5ever").
    fn name(&self) -> &str;

    /// Parse `raw` into a tree of top-level nodes.
    fn parse(&self, raw: &str) -> Result<TagTree, ParseError>;
}

/// HTML5 fragment parser using the browser-grade html5ever tokenizer.
///
/// Input is parsed as the content of a `<body>` element. Comments, doctypes
/// and processing instructions are dropped. Whitespace-only text between
/// elements collapses to a single space, except inside preformatted
/// elements, and is removed entirely at the top level.
#[derive(Debug, Clone)]
pub struct Html5everParser {
    max_depth: usize,
}

impl Html5everParser {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn convert_children(
        &self,
        handle: &Handle,
        depth: usize,
        preformatted: bool,
    ) -> Result<Vec<Node>, ParseError> {
        let mut nodes: Vec<Node> = Vec::new();

        for child in handle.children.borrow().iter() {
            match &child.data {
                NodeData::Text { contents } => {
                    let text = contents.borrow().to_string();
                    // Dropped comments can leave neighbouring text nodes.
                    if let Some(Node::Text(previous)) = nodes.last_mut() {
                        previous.push_str(&text);
                    } else {
                        nodes.push(Node::Text(text));
                    }
                }
                NodeData::Element { name, attrs, .. } => {
                    if depth >= self.max_depth {
                        return Err(ParseError::TooDeep {
                            limit: self.max_depth,
                        });
                    }

                    let tag_name = name.local.to_string();
                    let attributes = attrs
                        .borrow()
                        .iter()
                        .map(|attr| {
                            let name = match &attr.name.prefix {
                                Some(prefix) => format!("{prefix}:{}", attr.name.local),
                                None => attr.name.local.to_string(),
                            };
                            Attribute::new(name, attr.value.to_string())
                        })
                        .collect();

                    if is_void_element(&tag_name) {
                        nodes.push(Node::void(&tag_name, attributes));
                    } else {
                        let children = self.convert_children(
                            child,
                            depth + 1,
                            preformatted || is_preformatted_element(&tag_name),
                        )?;
                        nodes.push(Node::element(&tag_name, attributes, children));
                    }
                }
                NodeData::Comment { .. }
                | NodeData::Doctype { .. }
                | NodeData::ProcessingInstruction { .. } => {}
                NodeData::Document => {
                    return Err(ParseError::Malformed("nested document node".into()));
                }
            }
        }

        if !preformatted {
            collapse_blank_text(&mut nodes, depth == 0);
        }
        Ok(nodes)
    }
}

impl Default for Html5everParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Whitespace-only text nodes become a single space, or vanish at the top
/// level and when they end up empty.
fn collapse_blank_text(nodes: &mut Vec<Node>, top_level: bool) {
    nodes.retain_mut(|node| match node {
        Node::Text(text) if text.chars().all(|c| c.is_ascii_whitespace()) => {
            if top_level || text.is_empty() {
                false
            } else {
                *text = " ".to_string();
                true
            }
        }
        _ => true,
    });
}

impl MarkupParser for Html5everParser {
    fn name(&self) -> &str {
        "html5ever"
    }

    fn parse(&self, raw: &str) -> Result<TagTree, ParseError> {
        let context = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from("body"),
        );
        let dom: RcDom =
            parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(raw);

        // Fragment parsing wraps the result in a synthetic <html> element.
        let root = dom
            .document
            .children
            .borrow()
            .first()
            .cloned()
            .ok_or(ParseError::MissingRoot)?;
        let nodes = self.convert_children(&root, 0, false)?;
        let tree = TagTree::new(nodes);

        debug!(
            elements = tree.element_count(),
            depth = tree.depth(),
            "Parsed markup"
        );
        Ok(tree)
    }
}
