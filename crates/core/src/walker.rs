//! Markup Tree Walker: depth-first, order-preserving step sequence.
//!
//! Every element produces an `Enter` and a matching `Exit`; everything the
//! packer may place is a `Leaf(Unit)`. Concatenating the rendered form of
//! all steps reproduces [`TagTree::render`] exactly.

use crate::fragment::codepoint_len;
use crate::segmenter::{LongWordPolicy, grapheme_runs, sentence_spans, word_spans};
use crate::tree::{Node, Tag, TagPath, TagTree, escape_text};

/// What a [`Unit`] was cut from, which decides whether it can be refined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Sentence,
    Word,
    /// A run of whole grapheme clusters cut from an over-long word.
    Grapheme,
    /// Whitespace-only text; dropped at fragment boundaries.
    Space,
    Void,
    /// The unescaped body of a `script`, `style` or similar element.
    RawText,
}

/// An atomic piece of content considered by the packer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    kind: UnitKind,
    text: String,
    rendered: String,
    path: TagPath,
    length: usize,
}

impl Unit {
    pub(crate) fn from_text(kind: UnitKind, text: &str, path: &TagPath) -> Self {
        let rendered = escape_text(text).into_owned();
        Self::build(kind, text.to_string(), rendered, path)
    }

    pub(crate) fn raw(text: &str, path: &TagPath) -> Self {
        Self::build(UnitKind::RawText, text.to_string(), text.to_string(), path)
    }

    pub(crate) fn void(tag: &Tag, path: &TagPath) -> Self {
        Self::build(UnitKind::Void, String::new(), tag.opening().to_string(), path)
    }

    fn build(kind: UnitKind, text: String, rendered: String, path: &TagPath) -> Self {
        Self {
            length: codepoint_len(&rendered),
            kind,
            text,
            rendered,
            path: path.clone(),
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Decoded text; empty for void elements.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Serialized form as it will appear in a fragment.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Open tags enclosing this unit, root first.
    pub fn path(&self) -> &TagPath {
        &self.path
    }

    /// Codepoint length of the rendered form.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Break this unit into smaller ones: a sentence into words, a word into
    /// grapheme runs of at most `capacity` rendered codepoints when
    /// `long_words` is [`LongWordPolicy::Split`]. Returns an empty list when
    /// the unit is indivisible.
    pub fn refine(&self, long_words: LongWordPolicy, capacity: usize) -> Vec<Unit> {
        match self.kind {
            UnitKind::Sentence => {
                let spans = word_spans(&self.text);
                if spans.len() > 1 {
                    return spans
                        .into_iter()
                        .map(|span| Unit::from_text(UnitKind::Word, span, &self.path))
                        .collect();
                }
                self.split_graphemes(long_words, capacity)
            }
            UnitKind::Word => self.split_graphemes(long_words, capacity),
            UnitKind::Grapheme | UnitKind::Space | UnitKind::Void | UnitKind::RawText => {
                Vec::new()
            }
        }
    }

    fn split_graphemes(&self, long_words: LongWordPolicy, capacity: usize) -> Vec<Unit> {
        if long_words == LongWordPolicy::Keep {
            return Vec::new();
        }
        let runs = grapheme_runs(&self.text, capacity, |g| codepoint_len(&escape_text(g)));
        if runs.len() < 2 {
            return Vec::new();
        }
        runs.into_iter()
            .map(|run| {
                // A word's leading gap can fill whole runs on its own.
                let kind = if run.chars().all(|c| c.is_ascii_whitespace()) {
                    UnitKind::Space
                } else {
                    UnitKind::Grapheme
                };
                Unit::from_text(kind, run, &self.path)
            })
            .collect()
    }
}

/// One step of the depth-first traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Enter {
        tag: Tag,
        /// Index of the matching `Exit`.
        end: usize,
        /// Codepoint length of the element's full serialization.
        outer_length: usize,
    },
    Leaf(Unit),
    Exit {
        tag: Tag,
    },
}

impl Step {
    /// The text this step contributes to a fragment when placed as-is.
    pub fn rendered(&self) -> &str {
        match self {
            Self::Enter { tag, .. } => tag.opening(),
            Self::Leaf(unit) => unit.rendered(),
            Self::Exit { tag } => tag.closing(),
        }
    }
}

/// Walk `tree` depth-first into an ordered list of steps.
pub fn walk(tree: &TagTree) -> Vec<Step> {
    let mut walker = Walker::default();
    for node in tree.nodes() {
        walker.visit(node);
    }
    walker.steps
}

#[derive(Default)]
struct Walker {
    steps: Vec<Step>,
    path: TagPath,
    rendered: usize,
}

impl Walker {
    fn leaf(&mut self, unit: Unit) {
        self.rendered += unit.length();
        self.steps.push(Step::Leaf(unit));
    }

    fn visit(&mut self, node: &Node) {
        match node {
            Node::Text(text) => self.text(text),
            Node::Void(tag) => self.leaf(Unit::void(tag, &self.path)),
            Node::Element { tag, children } => self.element(tag, children),
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if text.chars().all(|c| c.is_ascii_whitespace()) {
            self.leaf(Unit::from_text(UnitKind::Space, text, &self.path));
            return;
        }
        let spans = sentence_spans(text);
        if spans.is_empty() {
            // Only non-ASCII whitespace such as U+00A0: still content.
            self.leaf(Unit::from_text(UnitKind::Sentence, text, &self.path));
            return;
        }
        for span in spans {
            self.leaf(Unit::from_text(UnitKind::Sentence, span, &self.path));
        }
    }

    fn element(&mut self, tag: &Tag, children: &[Node]) {
        let start = self.steps.len();
        let rendered_before = self.rendered;

        self.steps.push(Step::Enter {
            tag: tag.clone(),
            end: start,
            outer_length: 0,
        });
        self.rendered += tag.opening_length();
        self.path.push(tag.clone());

        if tag.is_raw_text() {
            let body: String = children
                .iter()
                .filter_map(|child| match child {
                    Node::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            if !body.is_empty() {
                self.leaf(Unit::raw(&body, &self.path));
            }
        } else {
            for child in children {
                self.visit(child);
            }
        }

        self.path.pop();
        self.rendered += tag.closing_length();
        let end = self.steps.len();
        self.steps.push(Step::Exit { tag: tag.clone() });

        let total = self.rendered - rendered_before;
        if let Some(Step::Enter {
            end: matching,
            outer_length,
            ..
        }) = self.steps.get_mut(start)
        {
            *matching = end;
            *outer_length = total;
        }
    }
}
