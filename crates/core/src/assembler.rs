//! Fragment Assembler: the public entry point.
//!
//! Classifies the input, runs the matching pipeline, then checks every
//! produced fragment against the output guarantees before handing the
//! result back.

use tracing::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

use crate::classifier::{Classification, classify};
use crate::error::{Result, SplitError};
use crate::fragment::{ContentKind, Fragment, SplitOutcome, SplitWarning};
use crate::packer::pack;
use crate::parser::{Html5everParser, MarkupParser};
use crate::segmenter::{LongWordPolicy, split_text};
use crate::walker::walk;

/// Default fragment budget in codepoints.
pub const DEFAULT_MAX_LENGTH: usize = 4096;

/// Caller settings for a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOptions {
    /// Maximum fragment length in codepoints. Must be positive.
    pub max_length: usize,
    pub long_words: LongWordPolicy,
}

impl SplitOptions {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            long_words: LongWordPolicy::default(),
        }
    }

    pub fn with_long_words(mut self, long_words: LongWordPolicy) -> Self {
        self.long_words = long_words;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(SplitError::configuration(
                "max_length must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

/// Splits HTML or plain text into bounded fragments.
///
/// Holds no per-call state, so one instance can be shared across threads.
pub struct Splitter {
    options: SplitOptions,
    parser: Box<dyn MarkupParser>,
}

impl std::fmt::Debug for Splitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Splitter")
            .field("options", &self.options)
            .field("parser", &self.parser.name())
            .finish()
    }
}

impl Splitter {
    /// Create a splitter backed by the html5ever parser.
    pub fn new(options: SplitOptions) -> Result<Self> {
        Self::with_parser(options, Box::new(Html5everParser::new()))
    }

    pub fn with_parser(options: SplitOptions, parser: Box<dyn MarkupParser>) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, parser })
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Split `content` into ordered fragments.
    pub fn split(&self, content: &str) -> Result<SplitOutcome> {
        let SplitOptions {
            max_length,
            long_words,
        } = self.options;

        let classification = classify(content, self.parser.as_ref());
        let mut outcome = SplitOutcome::empty(classification.kind());

        let fragments = match classification {
            Classification::Markup(tree) => pack(&walk(&tree), max_length, long_words)?,
            Classification::PlainText { fallback } => {
                if let Some(e) = fallback {
                    outcome.warnings.push(SplitWarning::MalformedMarkupFallback {
                        reason: e.to_string(),
                    });
                }
                split_text(content, max_length, long_words)
            }
        };

        verify(&fragments, outcome.kind, max_length)?;

        outcome
            .warnings
            .extend(fragments.iter().filter(|f| f.is_oversized()).map(|f| {
                SplitWarning::OversizedUnit {
                    fragment: f.index(),
                    length: f.length(),
                    max_length,
                }
            }));
        outcome.fragments = fragments;

        info!(
            kind = %outcome.kind,
            fragments = outcome.len(),
            oversized = outcome.oversized_count(),
            max_length,
            "Split complete"
        );
        Ok(outcome)
    }
}

/// Split `content` with default options and the given budget, returning
/// just the fragment strings.
pub fn split(content: &str, max_length: usize) -> Result<Vec<String>> {
    let splitter = Splitter::new(SplitOptions::new(max_length))?;
    Ok(splitter.split(content)?.into_strings())
}

/// True when `text` opens with a codepoint that would join the previous
/// grapheme cluster, i.e. a cut landed inside a cluster.
fn starts_inside_cluster(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    let mut probe = String::with_capacity(8);
    probe.push('a');
    probe.push(first);
    probe.graphemes(true).count() == 1
}

fn verify(fragments: &[Fragment], kind: ContentKind, max_length: usize) -> Result<()> {
    for (position, fragment) in fragments.iter().enumerate() {
        if fragment.index() != position {
            return Err(SplitError::Invariant {
                index: fragment.index(),
                reason: format!("index does not match output position {position}"),
            });
        }
        if !fragment.is_oversized() && fragment.length() > max_length {
            return Err(SplitError::Invariant {
                index: position,
                reason: format!(
                    "length {} exceeds max_length {max_length}",
                    fragment.length()
                ),
            });
        }
        if kind == ContentKind::PlainText
            && position > 0
            && starts_inside_cluster(fragment.content())
        {
            return Err(SplitError::Invariant {
                index: position,
                reason: "fragment starts inside a grapheme cluster".into(),
            });
        }
    }
    debug!(fragments = fragments.len(), "Fragments verified");
    Ok(())
}
