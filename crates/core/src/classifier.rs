//! Content Classifier: routes input to the markup or plain-text pipeline.

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::fragment::ContentKind;
use crate::parser::MarkupParser;
use crate::tree::TagTree;

/// Outcome of classifying raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Markup(TagTree),
    /// Split as plain text. `fallback` holds the parse failure when the
    /// input looked like markup but could not be parsed.
    PlainText { fallback: Option<ParseError> },
}

impl Classification {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Markup(_) => ContentKind::Markup,
            Self::PlainText { .. } => ContentKind::PlainText,
        }
    }
}

/// Decide how `input` should be split. Never fails: a parse error degrades
/// to plain text.
pub fn classify(input: &str, parser: &dyn MarkupParser) -> Classification {
    if !input.contains('<') {
        debug!("No tag delimiters, treating input as plain text");
        return Classification::PlainText { fallback: None };
    }

    match parser.parse(input) {
        Ok(tree) if tree.has_elements() => {
            debug!(
                parser = parser.name(),
                elements = tree.element_count(),
                "Classified input as markup"
            );
            Classification::Markup(tree)
        }
        Ok(_) => {
            debug!(parser = parser.name(), "Parse found no elements, treating as plain text");
            Classification::PlainText { fallback: None }
        }
        Err(e) => {
            warn!(parser = parser.name(), error = %e, "Markup parse failed, falling back to plain text");
            Classification::PlainText { fallback: Some(e) }
        }
    }
}
