//! Recursive entry point back into the host parser.

use crate::ast::Node;
use crate::diagnostic::Diagnostic;

use super::{DirectiveError, ParseContext};

/// Host parser capability used to parse directive arguments, options and
/// bodies.
///
/// Implementations must report node ranges relative to `ctx.line`, so that
/// a slice parsed at line `L` yields the same ranges it would have in the
/// unsliced document.
pub trait SubParser {
    /// Parse `text` as inline content.
    fn parse_inline(
        &self,
        text: &str,
        ctx: ParseContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Node>, DirectiveError>;

    /// Parse `text` as block content, running directives inside it.
    fn parse_block(
        &self,
        text: &str,
        ctx: ParseContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Node>, DirectiveError>;
}

/// Parse inline text, skipping the host for empty input.
pub(crate) fn inline_nodes<P: SubParser + ?Sized>(
    host: &P,
    text: &str,
    ctx: ParseContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Node>, DirectiveError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    host.parse_inline(text, ctx, diagnostics)
}

/// Parse block text, skipping the host for empty input.
pub(crate) fn block_nodes<P: SubParser + ?Sized>(
    host: &P,
    text: &str,
    ctx: ParseContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Node>, DirectiveError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    host.parse_block(text, ctx, diagnostics)
}
