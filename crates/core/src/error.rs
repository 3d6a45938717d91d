//! Error types for the splitting pipeline.
//!
//! Uses `thiserror` for ergonomic error definitions. Conditions that do not
//! abort a split (markup fallback, oversized units) are reported as
//! [`SplitWarning`](crate::fragment::SplitWarning)s on the outcome instead.

use thiserror::Error;

/// The top-level error type for split operations.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The caller's settings cannot produce valid fragments: a zero
    /// `max_length`, or markup nested too deeply for the budget.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A produced fragment broke an output guarantee.
    #[error("Fragment {index} violates an output invariant: {reason}")]
    Invariant { index: usize, reason: String },
}

impl SplitError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Result type alias using [`SplitError`].
pub type Result<T> = std::result::Result<T, SplitError>;

/// Failure reported by a [`MarkupParser`](crate::parser::MarkupParser).
///
/// Never fatal: the classifier treats any parse error as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Markup parser produced no document root")]
    MissingRoot,

    #[error("Markup nesting exceeds {limit} levels")]
    TooDeep { limit: usize },

    #[error("Malformed markup: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_displays_message() {
        let err = SplitError::configuration("max_length must be greater than zero");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn invariant_error_names_fragment() {
        let err = SplitError::Invariant {
            index: 3,
            reason: "length 12 exceeds max_length 10".into(),
        };
        assert!(err.to_string().contains("Fragment 3"));
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn parse_error_displays_limit() {
        let err = ParseError::TooDeep { limit: 256 };
        assert!(err.to_string().contains("256"));
    }
}
