//! Fragments and the outcome of a split.

use serde::Serialize;

/// Count Unicode scalar values, the unit every length in this crate uses.
pub fn codepoint_len(text: &str) -> usize {
    text.chars().count()
}

/// Which pipeline produced the fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Markup,
    PlainText,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markup => write!(f, "markup"),
            Self::PlainText => write!(f, "plain text"),
        }
    }
}

/// One bounded-length chunk of the original content.
///
/// Immutable once built; `length` is computed from `content` at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    index: usize,
    content: String,
    length: usize,
    oversized: bool,
}

impl Fragment {
    pub(crate) fn new(index: usize, content: String, oversized: bool) -> Self {
        let length = codepoint_len(&content);
        Self {
            index,
            content,
            length,
            oversized,
        }
    }

    /// Position in the output sequence, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Length in codepoints.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Set when a single indivisible unit exceeded the budget and was
    /// emitted whole rather than cut.
    pub fn is_oversized(&self) -> bool {
        self.oversized
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

/// Non-fatal conditions observed during a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitWarning {
    /// The markup parser rejected the input; it was split as plain text.
    MalformedMarkupFallback { reason: String },

    /// A fragment holds a single unit longer than the budget.
    OversizedUnit {
        fragment: usize,
        length: usize,
        max_length: usize,
    },
}

impl std::fmt::Display for SplitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedMarkupFallback { reason } => {
                write!(f, "markup could not be parsed ({reason}), split as plain text")
            }
            Self::OversizedUnit {
                fragment,
                length,
                max_length,
            } => write!(
                f,
                "fragment {fragment} holds an indivisible unit of {length} codepoints (max {max_length})"
            ),
        }
    }
}

/// Result of a successful split: ordered fragments plus any warnings.
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutcome {
    pub kind: ContentKind,
    pub fragments: Vec<Fragment>,
    pub warnings: Vec<SplitWarning>,
}

impl SplitOutcome {
    pub(crate) fn empty(kind: ContentKind) -> Self {
        Self {
            kind,
            fragments: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// True when no warnings were raised.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn oversized_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_oversized()).count()
    }

    pub fn contents(&self) -> Vec<&str> {
        self.fragments.iter().map(Fragment::content).collect()
    }

    pub fn into_strings(self) -> Vec<String> {
        self.fragments
            .into_iter()
            .map(Fragment::into_content)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_codepoints_not_bytes() {
        let fragment = Fragment::new(0, "héllo 👋".into(), false);
        assert_eq!(fragment.length(), 7);
        assert!(fragment.content().len() > 7);
    }

    #[test]
    fn outcome_helpers() {
        let outcome = SplitOutcome {
            kind: ContentKind::PlainText,
            fragments: vec![
                Fragment::new(0, "A.".into(), false),
                Fragment::new(1, "Supercalifragilistic".into(), true),
            ],
            warnings: vec![SplitWarning::OversizedUnit {
                fragment: 1,
                length: 20,
                max_length: 10,
            }],
        };
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.oversized_count(), 1);
        assert!(!outcome.is_clean());
        assert_eq!(outcome.contents(), vec!["A.", "Supercalifragilistic"]);
    }

    #[test]
    fn warning_serializes_with_type_tag() {
        let warning = SplitWarning::MalformedMarkupFallback {
            reason: "nesting too deep".into(),
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("malformed_markup_fallback"));
        assert!(json.contains("nesting too deep"));
    }

    #[test]
    fn kind_display() {
        assert_eq!(ContentKind::Markup.to_string(), "markup");
        assert_eq!(ContentKind::PlainText.to_string(), "plain text");
    }
}
