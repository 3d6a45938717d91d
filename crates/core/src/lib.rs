//! # contentsplit core
//!
//! Length-bounded, structure-preserving splitting of HTML and plain text.
//! Each fragment is at most `max_length` codepoints and, for markup, is
//! independently well-formed: open ancestor tags are closed at the end of a
//! fragment and re-opened at the start of the next.
//!
//! ## Pipeline
//!
//! ```text
//! input -> classifier -> segmenter             -> assembler -> fragments
//!                     \-> parser -> walker -> packer /
//! ```
//!
//! The markup parser sits behind the [`MarkupParser`] trait; the default is
//! html5ever. This crate does no I/O.
//!
//! ```
//! let fragments = contentsplit_core::split("<p>Hello <b>world</b>!</p>", 20).unwrap();
//! assert_eq!(fragments, vec!["<p>Hello </p>", "<p><b>world</b>!</p>"]);
//! ```

pub mod assembler;
pub mod classifier;
pub mod error;
pub mod fragment;
pub mod packer;
pub mod parser;
pub mod segmenter;
pub mod tree;
pub mod walker;

// Re-export key types at crate root for ergonomics
pub use assembler::{DEFAULT_MAX_LENGTH, SplitOptions, Splitter, split};
pub use classifier::{Classification, classify};
pub use error::{ParseError, Result, SplitError};
pub use fragment::{ContentKind, Fragment, SplitOutcome, SplitWarning, codepoint_len};
pub use parser::{Html5everParser, MarkupParser};
pub use segmenter::{LongWordPolicy, split_text};
pub use tree::{Attribute, Node, Tag, TagPath, TagTree};
pub use walker::{Step, Unit, UnitKind, walk};
