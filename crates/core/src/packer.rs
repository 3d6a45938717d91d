//! Markup Fragment Packer: places walker steps into length-bounded,
//! independently well-formed fragments.
//!
//! The builder mirrors the walker's nesting in a [`TagPath`]. Every fragment
//! is budgeted for the closing tags of the whole open path; when a fragment
//! is sealed those closers are appended, and the next fragment starts by
//! re-opening the path.
//!
//! Placement is shallow-first: an element that fits the current fragment is
//! appended whole, one that only fits a fresh fragment starts the next one,
//! and only an element that fits nowhere is descended into.

use tracing::{debug, warn};

use crate::error::{Result, SplitError};
use crate::fragment::{Fragment, codepoint_len};
use crate::segmenter::LongWordPolicy;
use crate::tree::{Tag, TagPath};
use crate::walker::{Step, Unit, UnitKind};

/// Lifecycle of a [`FragmentBuilder`].
///
/// `Idle -> Accumulating` on the first content of a fragment, back to `Idle`
/// when the fragment is sealed and the next one starts, and `Done` once
/// [`FragmentBuilder::finish`] has sealed the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Holding only re-opened structure.
    Idle,
    /// Holding content that has not been sealed yet.
    Accumulating,
    Done,
}

/// Whitespace-only text held back until real content follows it.
#[derive(Debug)]
struct PendingSpace {
    offset: usize,
    depth: usize,
    rendered: String,
    length: usize,
}

/// Per-call packing state.
///
/// `buffer` always equals `buffer[..content_end]` followed by the opening
/// tags of `stack[content_depth..]`: tags opened since the last content are
/// trailing and are dropped on seal, so a fragment never ends with an empty
/// element shell. Whitespace-only text is kept out of the buffer until
/// content follows it, and is dropped if the fragment is sealed first or
/// its element closes.
#[derive(Debug)]
pub struct FragmentBuilder {
    max_length: usize,
    long_words: LongWordPolicy,
    stack: TagPath,
    buffer: String,
    length: usize,
    has_content: bool,
    content_end: usize,
    content_depth: usize,
    pending_space: Option<PendingSpace>,
    state: BuilderState,
    fragments: Vec<Fragment>,
}

impl FragmentBuilder {
    pub fn new(max_length: usize, long_words: LongWordPolicy) -> Result<Self> {
        if max_length == 0 {
            return Err(SplitError::configuration(
                "max_length must be greater than zero",
            ));
        }
        Ok(Self {
            max_length,
            long_words,
            stack: TagPath::new(),
            buffer: String::new(),
            length: 0,
            has_content: false,
            content_end: 0,
            content_depth: 0,
            pending_space: None,
            state: BuilderState::Idle,
            fragments: Vec::new(),
        })
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Whether `n` more codepoints fit the current fragment.
    fn fits(&self, n: usize) -> bool {
        let pending = self.pending_space.as_ref().map_or(0, |p| p.length);
        self.length + pending + n + self.stack.closing_length() <= self.max_length
    }

    /// Whether `n` codepoints fit a fragment that holds only the open path.
    fn fits_fresh(&self, n: usize) -> bool {
        self.stack.overhead() + n <= self.max_length
    }

    /// Begin a new fragment by re-opening every tag on the stack.
    fn start(&mut self) {
        self.buffer = self.stack.opening_tags();
        self.length = self.stack.opening_length();
        self.has_content = false;
        self.content_end = 0;
        self.content_depth = 0;
        self.pending_space = None;
        self.state = BuilderState::Idle;
    }

    fn seal(&mut self, oversized: bool) {
        let mut content = self.buffer[..self.content_end].to_string();
        content.push_str(&self.stack.closing_tags_to(self.content_depth));

        let index = self.fragments.len();
        debug!(
            fragment = index,
            length = codepoint_len(&content),
            depth = self.content_depth,
            oversized,
            "Sealed markup fragment"
        );
        self.fragments.push(Fragment::new(index, content, oversized));
    }

    /// Seal the current fragment if it holds content, then start the next.
    fn cut(&mut self) {
        if self.has_content {
            self.seal(false);
        }
        self.start();
    }

    fn append_content(&mut self, rendered: &str, length: usize) {
        if let Some(space) = self.pending_space.take() {
            self.buffer.insert_str(space.offset, &space.rendered);
            self.length += space.length;
        }
        self.buffer.push_str(rendered);
        self.length += length;
        self.has_content = true;
        self.content_end = self.buffer.len();
        self.content_depth = self.stack.depth();
        self.state = BuilderState::Accumulating;
    }

    /// Descend into `tag`.
    pub fn open(&mut self, tag: &Tag) -> Result<()> {
        let overhead = self.stack.overhead() + tag.overhead();
        if overhead >= self.max_length {
            return Err(SplitError::configuration(format!(
                "max_length {} leaves no room for content inside `{}` ({} codepoints of tags)",
                self.max_length,
                if self.stack.is_empty() {
                    tag.name().to_string()
                } else {
                    format!("{} > {}", self.stack.describe(), tag.name())
                },
                overhead
            )));
        }

        if !self.fits(tag.overhead()) {
            self.cut();
        }
        debug!(tag = tag.name(), depth = self.stack.depth() + 1, "Descending into element");
        self.stack.push(tag.clone());
        self.buffer.push_str(tag.opening());
        self.length += tag.opening_length();
        Ok(())
    }

    /// Leave the innermost open element.
    pub fn close(&mut self) {
        let depth = self.stack.depth();
        if self.pending_space.as_ref().is_some_and(|p| p.depth == depth) {
            self.pending_space = None;
        }
        let Some(tag) = self.stack.pop() else {
            return;
        };

        if depth > self.content_depth {
            // Nothing inside it in this fragment: drop the trailing opener.
            let end = self.buffer.len().saturating_sub(tag.opening().len());
            self.buffer.truncate(end);
            self.length -= tag.opening_length();
        } else {
            self.buffer.push_str(tag.closing());
            self.length += tag.closing_length();
            self.content_end = self.buffer.len();
            self.content_depth = self.stack.depth();
        }
    }

    /// Append the whole element spanned by `steps` (its `Enter` through its
    /// `Exit`) without descending.
    fn append_element(&mut self, steps: &[Step], outer_length: usize) {
        let rendered: String = steps.iter().map(Step::rendered).collect();
        self.append_content(&rendered, outer_length);
    }

    /// Place an element whole if it fits here or in a fresh fragment.
    /// Returns false when the caller must descend.
    pub fn place_element(&mut self, steps: &[Step], outer_length: usize) -> bool {
        if self.fits(outer_length) {
            self.append_element(steps, outer_length);
            return true;
        }
        if self.fits_fresh(outer_length) {
            self.cut();
            self.append_element(steps, outer_length);
            return true;
        }
        false
    }

    /// Place a leaf unit, refining it when it fits nowhere.
    pub fn place(&mut self, unit: &Unit) {
        debug_assert_eq!(unit.path().depth(), self.stack.depth());

        if unit.kind() == UnitKind::Space {
            if !self.has_content {
                return;
            }
            let offset = self.buffer.len();
            if let Some(space) = self.pending_space.as_mut() {
                if space.offset == offset {
                    space.rendered.push_str(unit.rendered());
                    space.length += unit.length();
                }
            } else {
                self.pending_space = Some(PendingSpace {
                    offset,
                    depth: self.stack.depth(),
                    rendered: unit.rendered().to_string(),
                    length: unit.length(),
                });
            }
            return;
        }

        if self.fits(unit.length()) {
            self.append_content(unit.rendered(), unit.length());
            return;
        }
        if self.fits_fresh(unit.length()) {
            self.cut();
            self.append_content(unit.rendered(), unit.length());
            return;
        }

        let capacity = self.max_length - self.stack.overhead();
        let refined = unit.refine(self.long_words, capacity);
        if refined.is_empty() {
            self.place_oversized(unit);
            return;
        }
        for piece in &refined {
            self.place(piece);
        }
    }

    fn place_oversized(&mut self, unit: &Unit) {
        warn!(
            length = unit.length(),
            max_length = self.max_length,
            path = %unit.path().describe(),
            "Indivisible unit exceeds budget, emitting oversized fragment"
        );
        self.cut();
        self.append_content(unit.rendered(), unit.length());
        self.seal(true);
        self.start();
    }

    /// Seal whatever is left and return the fragments in order. A finished
    /// builder holds nothing and stays `Done`.
    pub fn finish(&mut self) -> Vec<Fragment> {
        if self.state == BuilderState::Done {
            return Vec::new();
        }
        if self.has_content {
            self.seal(false);
        }
        self.has_content = false;
        self.state = BuilderState::Done;
        std::mem::take(&mut self.fragments)
    }
}

/// Pack walker steps into fragments of at most `max_length` codepoints.
pub fn pack(steps: &[Step], max_length: usize, long_words: LongWordPolicy) -> Result<Vec<Fragment>> {
    let mut builder = FragmentBuilder::new(max_length, long_words)?;
    let mut i = 0;

    while i < steps.len() {
        match &steps[i] {
            Step::Enter {
                tag,
                end,
                outer_length,
            } => {
                let end = (*end).min(steps.len() - 1);
                if builder.place_element(&steps[i..=end], *outer_length) {
                    i = end + 1;
                    continue;
                }
                builder.open(tag)?;
            }
            Step::Leaf(unit) => builder.place(unit),
            Step::Exit { .. } => builder.close(),
        }
        i += 1;
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Html5everParser, MarkupParser};
    use crate::walker::walk;

    fn split(raw: &str, max_length: usize) -> Result<Vec<Fragment>> {
        split_with(raw, max_length, LongWordPolicy::Keep)
    }

    fn split_with(raw: &str, max_length: usize, policy: LongWordPolicy) -> Result<Vec<Fragment>> {
        let tree = Html5everParser::new().parse(raw).unwrap();
        pack(&walk(&tree), max_length, policy)
    }

    fn contents(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(Fragment::content).collect()
    }

    #[test]
    fn fitting_markup_is_one_fragment() {
        let fragments = split("<p>Hello <b>world</b>!</p>", 100).unwrap();
        assert_eq!(contents(&fragments), vec!["<p>Hello <b>world</b>!</p>"]);
    }

    #[test]
    fn element_moves_whole_to_next_fragment() {
        let fragments = split("<p>Hello <b>world</b>!</p>", 20).unwrap();
        assert_eq!(
            contents(&fragments),
            vec!["<p>Hello </p>", "<p><b>world</b>!</p>"]
        );
        assert!(fragments.iter().all(|f| !f.is_oversized()));
    }

    #[test]
    fn word_too_long_for_its_path_is_oversized() {
        let fragments = split("<p>Hello <b>world</b>!</p>", 15).unwrap();
        assert_eq!(
            contents(&fragments),
            vec!["<p>Hello </p>", "<p><b>world</b></p>", "<p>!</p>"]
        );
        assert!(!fragments[0].is_oversized());
        assert!(fragments[1].is_oversized());
        assert_eq!(fragments[1].length(), 19);
        assert!(!fragments[2].is_oversized());
    }

    #[test]
    fn siblings_are_packed_greedily() {
        let raw = "<ul><li>one</li><li>two</li><li>three</li></ul>";
        let fragments = split(raw, 33).unwrap();
        assert_eq!(
            contents(&fragments),
            vec!["<ul><li>one</li><li>two</li></ul>", "<ul><li>three</li></ul>"]
        );
    }

    #[test]
    fn reopened_tags_keep_attributes() {
        let raw = r#"<div class="note">First sentence here. Second sentence here.</div>"#;
        let fragments = split(raw, 46).unwrap();
        assert_eq!(
            contents(&fragments),
            vec![
                r#"<div class="note">First sentence here.</div>"#,
                r#"<div class="note"> Second sentence here.</div>"#,
            ]
        );
    }

    #[test]
    fn long_sentence_descends_to_words() {
        let raw = "<p>alpha beta gamma delta epsilon</p>";
        let fragments = split(raw, 20).unwrap();
        assert_eq!(
            contents(&fragments),
            vec!["<p>alpha beta</p>", "<p> gamma delta</p>", "<p> epsilon</p>"]
        );
    }

    #[test]
    fn split_policy_cuts_words_into_grapheme_runs() {
        let raw = format!("<p>{}</p>", "x".repeat(20));
        let fragments = split_with(&raw, 15, LongWordPolicy::Split).unwrap();
        assert_eq!(
            contents(&fragments),
            vec!["<p>xxxxxxxx</p>", "<p>xxxxxxxx</p>", "<p>xxxx</p>"]
        );
        assert!(fragments.iter().all(|f| f.length() <= 15));
    }

    #[test]
    fn blank_runs_of_a_split_word_are_dropped_at_cuts() {
        let raw = format!("<p>aaaa{}bbbbb</p>", " ".repeat(14));
        let fragments = split_with(&raw, 20, LongWordPolicy::Split).unwrap();
        assert_eq!(contents(&fragments), vec!["<p>aaaa</p>", "<p> bbbbb</p>"]);

        let raw = format!("<p>a{}b</p>", " ".repeat(30));
        let fragments = split_with(&raw, 20, LongWordPolicy::Split).unwrap();
        assert_eq!(contents(&fragments), vec!["<p>a</p>", "<p>    b</p>"]);

        for fragment in &fragments {
            let again = split_with(fragment.content(), 20, LongWordPolicy::Split).unwrap();
            assert_eq!(contents(&again), vec![fragment.content()]);
        }
    }

    #[test]
    fn empty_elements_are_not_emitted_as_shells() {
        let raw = "<div><p>aaaa bbbb</p><p>cccc dddd</p></div>";
        let fragments = split(raw, 24).unwrap();
        assert_eq!(
            contents(&fragments),
            vec![
                "<div><p>aaaa</p></div>",
                "<div><p> bbbb</p></div>",
                "<div><p>cccc</p></div>",
                "<div><p> dddd</p></div>",
            ]
        );
        for fragment in &fragments {
            assert!(!fragment.content().contains("<p></p>"), "{fragment:?}");
            assert!(fragment.length() <= 24);
        }
    }

    #[test]
    fn void_elements_are_atomic() {
        let raw = r#"<p>some text <img src="a-very-long-image-name.png"> more</p>"#;
        let fragments = split(raw, 24).unwrap();
        let image = fragments
            .iter()
            .find(|f| f.content().contains("<img"))
            .unwrap();
        assert!(image.is_oversized());
        assert!(image.content().contains(r#"<img src="a-very-long-image-name.png">"#));
    }

    #[test]
    fn too_deep_for_budget_is_a_configuration_error() {
        let raw = "<div><section><article>text that is long</article></section></div>";
        let err = split(raw, 20).unwrap_err();
        assert!(matches!(err, SplitError::Configuration { .. }));
        assert!(err.to_string().contains("leaves no room"));
    }

    #[test]
    fn zero_budget_is_rejected() {
        assert!(FragmentBuilder::new(0, LongWordPolicy::Keep).is_err());
    }

    #[test]
    fn builder_state_transitions() {
        let mut builder = FragmentBuilder::new(20, LongWordPolicy::Keep).unwrap();
        assert_eq!(builder.state(), BuilderState::Idle);

        let tag = Tag::new("p", vec![]);
        builder.open(&tag).unwrap();
        assert_eq!(builder.depth(), 1);

        let mut path = TagPath::new();
        path.push(tag);
        builder.place(&Unit::from_text(UnitKind::Sentence, "hi", &path));
        assert_eq!(builder.state(), BuilderState::Accumulating);

        builder.place(&Unit::from_text(UnitKind::Sentence, " there friend", &path));
        assert_eq!(builder.state(), BuilderState::Accumulating);

        builder.close();
        let fragments = builder.finish();
        assert_eq!(builder.state(), BuilderState::Done);
        assert_eq!(
            contents(&fragments),
            vec!["<p>hi</p>", "<p> there friend</p>"]
        );
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn cut_returns_builder_to_idle() {
        let mut builder = FragmentBuilder::new(20, LongWordPolicy::Keep).unwrap();
        let tag = Tag::new("p", vec![]);
        builder.open(&tag).unwrap();
        let mut path = TagPath::new();
        path.push(tag);
        builder.place(&Unit::from_text(UnitKind::Sentence, "hello", &path));
        assert_eq!(builder.state(), BuilderState::Accumulating);

        builder.cut();
        assert_eq!(builder.state(), BuilderState::Idle);
        assert_eq!(builder.depth(), 1);
    }

    #[test]
    fn whitespace_between_elements_needs_following_content() {
        let raw = "<ul>\n<li>aaaa</li>\n<li>bbbb</li>\n</ul>";
        assert_eq!(
            contents(&split(raw, 24).unwrap()),
            vec!["<ul><li>aaaa</li></ul>", "<ul><li>bbbb</li></ul>"]
        );
        assert_eq!(
            contents(&split(raw, 36).unwrap()),
            vec!["<ul><li>aaaa</li> <li>bbbb</li></ul>"]
        );
        assert_eq!(
            contents(&split(raw, 38).unwrap()),
            vec!["<ul> <li>aaaa</li> <li>bbbb</li> </ul>"]
        );
    }

    #[test]
    fn leading_space_after_cut_is_dropped() {
        let raw = "<p><b>aaaaaaaa</b> <i>bbbbbbbb</i></p>";
        let fragments = split(raw, 22).unwrap();
        assert_eq!(
            contents(&fragments),
            vec!["<p><b>aaaaaaaa</b></p>", "<p><i>bbbbbbbb</i></p>"]
        );
    }
}
