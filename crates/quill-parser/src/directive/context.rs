//! Position of a sub-parse within the top-level document.

use super::DirectiveError;

/// Where a recursive parse starts and how deeply it is nested.
///
/// Threaded explicitly through every sub-parse so that node ranges come out
/// in top-level document lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseContext {
    /// Absolute line (1-indexed) of the first line of the parsed text.
    pub line: usize,
    /// Number of directive bodies enclosing the parsed text.
    pub depth: usize,
}

impl ParseContext {
    /// Context at an arbitrary position.
    #[must_use]
    pub const fn new(line: usize, depth: usize) -> Self {
        Self { line, depth }
    }

    /// Context of a top-level document.
    #[must_use]
    pub const fn document() -> Self {
        Self::new(1, 0)
    }

    /// Same depth, `offset` lines further down.
    pub fn offset(self, offset: usize) -> Result<Self, DirectiveError> {
        let line = self
            .line
            .checked_add(offset)
            .ok_or(DirectiveError::LineOverflow {
                line: self.line,
                offset,
            })?;
        Ok(Self { line, ..self })
    }

    /// One directive body deeper, `offset` lines further down.
    pub fn nested(self, offset: usize) -> Result<Self, DirectiveError> {
        let ctx = self.offset(offset)?;
        Ok(Self {
            depth: ctx.depth + 1,
            ..ctx
        })
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::document()
    }
}
