//! Shared helpers for offset and line bookkeeping.

use std::ops::Range;

use pulldown_cmark::HeadingLevel;

use crate::ast::SourceRange;

/// Maps byte offsets of a text slice to absolute document lines.
///
/// `first_line` is the absolute line of the slice's first line, which lets
/// a sub-parse report lines in the coordinates of the top-level document.
#[derive(Debug)]
pub(crate) struct LineIndex {
    line_starts: Vec<usize>,
    first_line: usize,
}

impl LineIndex {
    pub(crate) fn new(text: &str, first_line: usize) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            first_line,
        }
    }

    /// Absolute line containing the byte at `offset`.
    pub(crate) fn line_of(&self, offset: usize) -> usize {
        let relative = self.line_starts.partition_point(|&start| start <= offset);
        self.first_line.saturating_add(relative.saturating_sub(1))
    }

    /// Absolute lines covered by a byte range.
    ///
    /// Empty ranges collapse to the line of their start.
    pub(crate) fn range_of(&self, span: &Range<usize>) -> SourceRange {
        let start = self.line_of(span.start);
        let end = if span.end > span.start {
            self.line_of(span.end - 1)
        } else {
            start
        };
        SourceRange::new(start, end)
    }
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Split `text` into owned lines without their terminators.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_owned).collect()
}
