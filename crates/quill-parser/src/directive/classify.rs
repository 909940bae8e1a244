//! Fence classification.
//!
//! A fence is a directive when its info string is `{name}` optionally
//! followed by an argument:
//!
//! ````text
//! ```{figure} images/plot.png
//! ```
//! ````

use std::sync::LazyLock;

use regex::Regex;

use crate::token::{DirectiveToken, RawFenceBlock, Token};

use super::DirectiveRegistry;

static DIRECTIVE_INFO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{([^\s}]+)\}\s*(.*)$").unwrap());

/// Split an info string into directive name and argument.
///
/// ```
/// use quill_parser::directive::parse_info;
///
/// assert_eq!(parse_info("{note} Read this"), Some(("note", Some("Read this"))));
/// assert_eq!(parse_info("{toc}"), Some(("toc", None)));
/// assert_eq!(parse_info("python"), None);
/// ```
#[must_use]
pub fn parse_info(info: &str) -> Option<(&str, Option<&str>)> {
    let caps = DIRECTIVE_INFO_RE.captures(info)?;
    let name = caps.get(1)?.as_str();
    let arg = caps
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|arg| !arg.is_empty());
    Some((name, arg))
}

/// Everything after `{name}` in an info string, untrimmed.
pub(crate) fn raw_arg(info: &str) -> Option<&str> {
    let arg = DIRECTIVE_INFO_RE.captures(info)?.get(2)?.as_str();
    (!arg.is_empty()).then_some(arg)
}

/// Relabels fence tokens that name a directive.
#[derive(Debug)]
pub(crate) struct Classifier<'a> {
    /// When set, only names with a handler are classified.
    pub(crate) registry: Option<&'a DirectiveRegistry>,
}

impl Classifier<'_> {
    /// Classify one token. Anything but a matching fence is returned as is.
    pub(crate) fn classify(&self, token: Token) -> Token {
        match token {
            Token::Fence(fence) => self.classify_fence(fence),
            other => other,
        }
    }

    fn classify_fence(&self, fence: RawFenceBlock) -> Token {
        let Some((name, arg)) = parse_info(&fence.info) else {
            return Token::Fence(fence);
        };
        if self.registry.is_some_and(|registry| !registry.contains(name)) {
            return Token::Fence(fence);
        }
        let name = name.to_owned();
        let arg = arg.map(str::to_owned);
        Token::Directive(DirectiveToken { name, arg, fence })
    }

    /// Classify a whole stream.
    pub(crate) fn run(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter().map(|token| self.classify(token)).collect()
    }
}
