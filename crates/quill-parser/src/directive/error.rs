//! Directive error types.

use std::fmt;

/// Classification of a directive failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DirectiveErrorKind {
    /// Rejected by the handler's validation hook.
    Validation,
    /// Re-parsing the argument, an option or the body failed.
    NestedParse,
    /// Directive nesting reached the configured limit.
    NestingTooDeep,
    /// Line arithmetic overflowed.
    Internal,
}

impl fmt::Display for DirectiveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation error",
            Self::NestedParse => "nested parse error",
            Self::NestingTooDeep => "nesting too deep",
            Self::Internal => "internal error",
        };
        f.write_str(label)
    }
}

/// Error that turns a directive into an error node.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// Handler validation failed.
    #[error("{0}")]
    Validation(String),
    /// Host parser failed on a sub-slice; the message is kept verbatim.
    #[error("{0}")]
    NestedParse(String),
    /// Directive found at or beyond the nesting limit.
    #[error("directive nesting exceeds the maximum depth of {max}")]
    NestingTooDeep { max: usize },
    /// Absolute line number does not fit in `usize`.
    #[error("line {line} cannot be offset by {offset}")]
    LineOverflow { line: usize, offset: usize },
}

impl DirectiveError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a nested parse error.
    pub fn nested_parse(message: impl Into<String>) -> Self {
        Self::NestedParse(message.into())
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> DirectiveErrorKind {
        match self {
            Self::Validation(_) => DirectiveErrorKind::Validation,
            Self::NestedParse(_) => DirectiveErrorKind::NestedParse,
            Self::NestingTooDeep { .. } => DirectiveErrorKind::NestingTooDeep,
            Self::LineOverflow { .. } => DirectiveErrorKind::Internal,
        }
    }
}

/// Reason the options section of a directive could not be read.
///
/// Never fatal: the directive keeps its whole content as body.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// `---` opener without a matching closer.
    #[error("missing closing '---'")]
    Unclosed,
    /// The block is not valid YAML.
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The block parsed to something other than a mapping.
    #[error("expected a mapping, found {0}")]
    NotAMapping(&'static str),
    /// A key is not a scalar.
    #[error("option keys must be scalars")]
    InvalidKey,
}
