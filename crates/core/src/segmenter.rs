//! Text Segmenter: sentence/word tokenization and plain-text packing.
//!
//! Boundaries are found on grapheme clusters, so a cut can never land
//! inside a user-perceived character. A sentence ends at a run of `.`, `!`
//! or `?` followed by whitespace or end of input.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::fragment::{Fragment, codepoint_len};

/// What to do with a single word longer than the budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongWordPolicy {
    /// Emit the word whole as its own oversized fragment.
    #[default]
    Keep,
    /// Cut the word into runs of whole grapheme clusters.
    Split,
}

/// A sentence or word body with the whitespace that preceded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece<'a> {
    pub gap: &'a str,
    pub body: &'a str,
}

fn is_blank(grapheme: &str) -> bool {
    grapheme.chars().all(char::is_whitespace)
}

fn is_terminal(grapheme: &str) -> bool {
    grapheme.starts_with(['.', '!', '?'])
}

fn sentence_bounds(text: &str) -> Vec<Range<usize>> {
    let mut bounds = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut graphemes = text.grapheme_indices(true).peekable();

    while let Some((offset, grapheme)) = graphemes.next() {
        if is_blank(grapheme) {
            continue;
        }
        let body_start = *start.get_or_insert(offset);
        end = offset + grapheme.len();

        let closes = is_terminal(grapheme)
            && graphemes.peek().is_none_or(|(_, next)| is_blank(next));
        if closes {
            bounds.push(body_start..end);
            start = None;
        }
    }

    if let Some(body_start) = start {
        bounds.push(body_start..end);
    }
    bounds
}

fn word_bounds(text: &str) -> Vec<Range<usize>> {
    let mut bounds = Vec::new();
    let mut start: Option<usize> = None;

    for (offset, grapheme) in text.grapheme_indices(true) {
        if is_blank(grapheme) {
            if let Some(word_start) = start.take() {
                bounds.push(word_start..offset);
            }
        } else if start.is_none() {
            start = Some(offset);
        }
    }

    if let Some(word_start) = start {
        bounds.push(word_start..text.len());
    }
    bounds
}

fn pieces<'a>(text: &'a str, bounds: &[Range<usize>]) -> Vec<Piece<'a>> {
    let mut previous_end = 0;
    bounds
        .iter()
        .map(|range| {
            let piece = Piece {
                gap: &text[previous_end..range.start],
                body: &text[range.clone()],
            };
            previous_end = range.end;
            piece
        })
        .collect()
}

/// Contiguous slices covering all of `text`: each holds a body plus the gap
/// before it, and the last one also keeps any trailing whitespace.
fn spans<'a>(text: &'a str, bounds: &[Range<usize>]) -> Vec<&'a str> {
    let mut spans = Vec::with_capacity(bounds.len());
    let mut start = 0;
    for (i, range) in bounds.iter().enumerate() {
        let end = if i + 1 == bounds.len() {
            text.len()
        } else {
            range.end
        };
        spans.push(&text[start..end]);
        start = end;
    }
    spans
}

/// Sentences of `text`, in order.
pub fn sentences(text: &str) -> Vec<Piece<'_>> {
    pieces(text, &sentence_bounds(text))
}

/// Whitespace-delimited words of `text`, in order.
pub fn words(text: &str) -> Vec<Piece<'_>> {
    pieces(text, &word_bounds(text))
}

/// Sentence slices that concatenate back to `text` exactly.
pub fn sentence_spans(text: &str) -> Vec<&str> {
    spans(text, &sentence_bounds(text))
}

/// Word slices that concatenate back to `text` exactly.
pub fn word_spans(text: &str) -> Vec<&str> {
    spans(text, &word_bounds(text))
}

/// Cut `text` into runs of whole grapheme clusters, each measuring at most
/// `max_length` under `measure`. A cluster that alone exceeds the limit
/// becomes a run of its own.
pub fn grapheme_runs<F>(text: &str, max_length: usize, measure: F) -> Vec<&str>
where
    F: Fn(&str) -> usize,
{
    let mut runs = Vec::new();
    let mut start = 0;
    let mut length = 0;

    for (offset, grapheme) in text.grapheme_indices(true) {
        let grapheme_length = measure(grapheme);
        if length > 0 && length + grapheme_length > max_length {
            runs.push(&text[start..offset]);
            start = offset;
            length = 0;
        }
        length += grapheme_length;
    }

    if start < text.len() {
        runs.push(&text[start..]);
    }
    runs
}

/// Split plain text into fragments of at most `max_length` codepoints.
///
/// Sentences are packed greedily; a sentence that cannot fit any fragment
/// starts a fresh one and is packed word by word. Words longer than the
/// budget follow `long_words`.
pub fn split_text(text: &str, max_length: usize, long_words: LongWordPolicy) -> Vec<Fragment> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    if codepoint_len(text) <= max_length {
        return vec![Fragment::new(0, text.to_string(), false)];
    }

    let mut packer = TextPacker::new(max_length, long_words);
    for sentence in sentences(text) {
        if codepoint_len(sentence.body) <= max_length {
            packer.push(sentence.gap, sentence.body);
            continue;
        }

        debug!(
            length = codepoint_len(sentence.body),
            max_length, "Sentence exceeds budget, packing by word"
        );
        packer.flush();
        for word in words(sentence.body) {
            packer.push_word(word);
        }
    }
    packer.finish()
}

struct TextPacker {
    max_length: usize,
    long_words: LongWordPolicy,
    current: String,
    length: usize,
    fragments: Vec<Fragment>,
}

impl TextPacker {
    fn new(max_length: usize, long_words: LongWordPolicy) -> Self {
        Self {
            max_length,
            long_words,
            current: String::new(),
            length: 0,
            fragments: Vec::new(),
        }
    }

    /// Append a body known to fit an empty fragment. The gap is kept only
    /// when the body joins existing content.
    fn push(&mut self, gap: &str, body: &str) {
        let body_length = codepoint_len(body);
        if !self.current.is_empty()
            && self.length + codepoint_len(gap) + body_length > self.max_length
        {
            self.flush();
        }

        if !self.current.is_empty() {
            self.current.push_str(gap);
            self.length += codepoint_len(gap);
        }
        self.current.push_str(body);
        self.length += body_length;
    }

    fn push_word(&mut self, word: Piece<'_>) {
        if codepoint_len(word.body) <= self.max_length {
            self.push(word.gap, word.body);
            return;
        }

        match self.long_words {
            LongWordPolicy::Keep => self.push_oversized(word.body),
            LongWordPolicy::Split => {
                let runs = grapheme_runs(word.body, self.max_length, codepoint_len);
                for (i, run) in runs.into_iter().enumerate() {
                    if codepoint_len(run) > self.max_length {
                        self.push_oversized(run);
                    } else {
                        self.push(if i == 0 { word.gap } else { "" }, run);
                    }
                }
            }
        }
    }

    fn push_oversized(&mut self, body: &str) {
        warn!(
            length = codepoint_len(body),
            max_length = self.max_length,
            "Indivisible unit exceeds budget, emitting oversized fragment"
        );
        self.flush();
        let index = self.fragments.len();
        self.fragments
            .push(Fragment::new(index, body.to_string(), true));
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let index = self.fragments.len();
        let content = std::mem::take(&mut self.current);
        self.fragments.push(Fragment::new(index, content, false));
        self.length = 0;
    }

    fn finish(mut self) -> Vec<Fragment> {
        self.flush();
        self.fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(Fragment::content).collect()
    }

    #[test]
    fn sentence_pieces_keep_gaps() {
        let pieces = sentences("First one.  Second?\nThird!");
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0], Piece { gap: "", body: "First one." });
        assert_eq!(pieces[1], Piece { gap: "  ", body: "Second?" });
        assert_eq!(pieces[2], Piece { gap: "\n", body: "Third!" });
    }

    #[test]
    fn punctuation_inside_a_word_does_not_end_a_sentence() {
        let pieces = sentences("Version 1.5 shipped. Wow?!Really.");
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].body, "Version 1.5 shipped.");
        assert_eq!(pieces[1].body, "Wow?!Really.");
    }

    #[test]
    fn unterminated_tail_is_a_sentence() {
        let pieces = sentences("Done. and then some   ");
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[1].body, "and then some");
    }

    #[test]
    fn spans_cover_the_input() {
        let text = "  Hello there. General Kenobi!  ";
        let spans = sentence_spans(text);
        assert_eq!(spans, vec!["  Hello there.", " General Kenobi!  "]);
        assert_eq!(spans.concat(), text);

        let words = word_spans("one  two three ");
        assert_eq!(words, vec!["one", "  two", " three "]);
    }

    #[test]
    fn whitespace_only_has_no_spans() {
        assert!(sentence_spans(" \n ").is_empty());
        assert!(word_spans("").is_empty());
    }

    #[test]
    fn grapheme_runs_never_split_clusters() {
        // Flag emoji are two codepoints each.
        let flags = "🇫🇷🇩🇪🇯🇵";
        let runs = grapheme_runs(flags, 3, codepoint_len);
        assert_eq!(runs, vec!["🇫🇷", "🇩🇪", "🇯🇵"]);

        let accented = "e\u{301}e\u{301}e\u{301}";
        let runs = grapheme_runs(accented, 4, codepoint_len);
        assert_eq!(runs, vec!["e\u{301}e\u{301}", "e\u{301}"]);
    }

    #[test]
    fn grapheme_larger_than_budget_is_its_own_run() {
        let family = "a👨‍👩‍👧b";
        let runs = grapheme_runs(family, 2, codepoint_len);
        assert_eq!(runs, vec!["a", "👨‍👩‍👧", "b"]);
    }

    #[test]
    fn empty_input_yields_no_fragments() {
        assert!(split_text("", 10, LongWordPolicy::Keep).is_empty());
        assert!(split_text("   \n\t", 10, LongWordPolicy::Keep).is_empty());
    }

    #[test]
    fn short_input_is_returned_verbatim() {
        let text = "  This is a single sentence.  ";
        let fragments = split_text(text, 100, LongWordPolicy::Keep);
        assert_eq!(contents(&fragments), vec![text]);
    }

    #[test]
    fn packs_sentences_greedily() {
        let fragments = split_text("A. B. C.", 4, LongWordPolicy::Keep);
        assert_eq!(contents(&fragments), vec!["A.", "B.", "C."]);

        let fragments = split_text("A. B. C.", 5, LongWordPolicy::Keep);
        assert_eq!(contents(&fragments), vec!["A. B.", "C."]);
    }

    #[test]
    fn long_sentence_falls_back_to_words() {
        let text = "Short one. This is a very long sentence that should be split into multiple fragments based on available space.";
        let fragments = split_text(text, 20, LongWordPolicy::Keep);
        assert_eq!(fragments[0].content(), "Short one.");
        assert!(fragments.len() > 2);
        for fragment in &fragments {
            assert!(fragment.length() <= 20, "{:?}", fragment);
            assert!(!fragment.is_oversized());
        }
    }

    #[test]
    fn long_word_kept_whole_and_flagged() {
        let word = "x".repeat(50);
        let fragments = split_text(&word, 10, LongWordPolicy::Keep);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].length(), 50);
        assert!(fragments[0].is_oversized());
    }

    #[test]
    fn long_word_split_on_request() {
        let text = format!("see {}", "x".repeat(25));
        let fragments = split_text(&text, 10, LongWordPolicy::Split);
        assert_eq!(
            contents(&fragments),
            vec!["see", "xxxxxxxxxx", "xxxxxxxxxx", "xxxxx"]
        );
        assert!(fragments.iter().all(|f| !f.is_oversized()));
    }

    #[test]
    fn indices_are_sequential() {
        let text = "One two. Three four. Five six. Seven eight.";
        let fragments = split_text(text, 10, LongWordPolicy::Keep);
        for (i, fragment) in fragments.iter().enumerate() {
            assert_eq!(fragment.index(), i);
        }
    }

    #[test]
    fn unicode_lengths_are_codepoints() {
        let text = "Hello 👋 World 🌍 with emoji 😊 in a very long text that should be split";
        let fragments = split_text(text, 20, LongWordPolicy::Keep);
        assert!(fragments.len() > 1);
        assert!(fragments.iter().all(|f| f.length() <= 20));
        let rejoined: String = fragments
            .iter()
            .map(Fragment::content)
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, text);
    }
}
