//! Colon fence recognition.
//!
//! `pulldown-cmark` knows nothing about `:::` fences. Before tokenizing,
//! each top-level colon fence is rewritten in place as a tilde fence long
//! enough to hold its content, so the text is parsed in one pass and colon
//! fences nest in lists and block quotes like any other fence. Line
//! numbers are unchanged by the rewrite.
//!
//! Openers are only taken from lines that a plain parse does not already
//! place in a code or HTML block. The closer search tracks backtick and
//! tilde fences, so `:::` lines inside nested code stay code.

use std::borrow::Cow;
use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag};

use crate::token::FenceMarker;

/// Longest indentation an opening or closing fence may have.
const MAX_FENCE_INDENT: usize = 3;

/// Shortest run of fence characters that forms a fence.
const MIN_FENCE_LEN: usize = 3;

/// Tracks code fence state during a line scan.
///
/// A closing fence must use the opener's character, be at least as long
/// and carry nothing but trailing whitespace.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<(FenceMarker, usize)>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Check if the scan is inside a backtick or tilde fence.
    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed the next line. Returns `true` if it opened or closed a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        match self.open {
            Some((marker, len)) => {
                if closes_fence(line, marker, len) {
                    self.open = None;
                    return true;
                }
                false
            }
            None => match code_fence_opener(line) {
                Some(open) => {
                    self.open = Some(open);
                    true
                }
                None => false,
            },
        }
    }
}

/// Strip up to three spaces of indentation.
fn strip_indent(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    (indent <= MAX_FENCE_INDENT).then(|| &line[indent..])
}

/// Leading run of `marker` characters and the rest of the line.
fn fence_run(line: &str, marker: FenceMarker) -> Option<(usize, &str)> {
    let body = strip_indent(line)?;
    let c = marker.as_char();
    let len = body.len() - body.trim_start_matches(c).len();
    (len >= MIN_FENCE_LEN).then(|| (len, &body[len..]))
}

/// Detect a backtick or tilde fence opener.
fn code_fence_opener(line: &str) -> Option<(FenceMarker, usize)> {
    [FenceMarker::Backtick, FenceMarker::Tilde]
        .into_iter()
        .find_map(|marker| {
            let (len, rest) = fence_run(line, marker)?;
            // A backtick info string cannot contain backticks.
            if marker == FenceMarker::Backtick && rest.contains('`') {
                return None;
            }
            Some((marker, len))
        })
}

fn closes_fence(line: &str, marker: FenceMarker, min_len: usize) -> bool {
    fence_run(line, marker).is_some_and(|(len, rest)| len >= min_len && rest.trim().is_empty())
}

/// Detect a colon fence opener with a non-empty info string.
fn colon_fence_opener(line: &str) -> Option<(usize, &str)> {
    let (len, rest) = fence_run(line, FenceMarker::Colon)?;
    let info = rest.trim();
    (!info.is_empty()).then_some((len, info))
}

/// Byte length of the block quote markers, list markers and indentation
/// that start `line`.
fn container_prefix(line: &str) -> usize {
    let mut pos = 0;
    loop {
        let rest = &line[pos..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        pos += rest.len() - trimmed.len();
        if trimmed.starts_with('>') {
            pos += 1;
            continue;
        }
        match list_marker_len(trimmed) {
            Some(len) => pos += len,
            None => return pos,
        }
    }
}

fn list_marker_len(text: &str) -> Option<usize> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    let len = if digits == 0 {
        usize::from(text.starts_with(['-', '+', '*']))
    } else if digits <= 9 && text[digits..].starts_with(['.', ')']) {
        digits + 1
    } else {
        0
    };
    (len > 0 && text[len..].starts_with([' ', '\t'])).then_some(len)
}

/// Text with its top-level colon fences rewritten as tilde fences.
#[derive(Debug, PartialEq)]
pub(crate) struct ColonRewrite<'a> {
    pub(crate) text: Cow<'a, str>,
    /// 1-based lines, relative to the text, that open a colon fence.
    pub(crate) openers: Vec<usize>,
}

/// Rewrite the top-level colon fences of `text`.
///
/// Colon fences nested inside another colon fence are left alone; they
/// are found again when the enclosing directive's body is parsed.
pub(crate) fn rewrite_colon_fences(text: &str, options: Options) -> ColonRewrite<'_> {
    if !text.contains(":::") {
        return ColonRewrite {
            text: Cow::Borrowed(text),
            openers: Vec::new(),
        };
    }

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let starts: Vec<usize> = lines
        .iter()
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some(start)
        })
        .collect();
    let literal = literal_spans(text, options);

    let mut rewrites: Vec<(usize, String)> = Vec::new();
    let mut openers = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = trim_newline(lines[idx]);
        let prefix = container_prefix(line);
        let opener = colon_fence_opener(&line[prefix..])
            .filter(|_| !literal.iter().any(|span| span.contains(&(starts[idx] + prefix))));
        let Some((len, _)) = opener else {
            idx += 1;
            continue;
        };

        let close = find_closer(&lines[idx + 1..], len).map(|pos| idx + 1 + pos);
        let content = &lines[idx + 1..close.unwrap_or(lines.len())];
        let tildes = "~".repeat(tilde_width(content));

        rewrites.push((
            idx,
            format!("{}{tildes}{}", &line[..prefix], &line[prefix + len..]),
        ));
        if let Some(close) = close {
            let closer = trim_newline(lines[close]);
            rewrites.push((close, format!("{}{tildes}", &closer[..container_prefix(closer)])));
        }
        openers.push(idx + 1);
        idx = close.map_or(lines.len(), |close| close + 1);
    }

    if rewrites.is_empty() {
        return ColonRewrite {
            text: Cow::Borrowed(text),
            openers,
        };
    }

    let mut out = String::with_capacity(text.len() + rewrites.len() * 4);
    let mut pending = rewrites.into_iter().peekable();
    for (i, raw) in lines.iter().enumerate() {
        match pending.next_if(|(at, _)| *at == i) {
            Some((_, line)) => {
                out.push_str(&line);
                out.push_str(&raw[trim_newline(raw).len()..]);
            }
            None => out.push_str(raw),
        }
    }
    ColonRewrite {
        text: Cow::Owned(out),
        openers,
    }
}

/// Byte spans of code and HTML blocks in a plain parse of `text`.
fn literal_spans(text: &str, options: Options) -> Vec<Range<usize>> {
    Parser::new_ext(text, options)
        .into_offset_iter()
        .filter_map(|(event, span)| {
            matches!(event, Event::Start(Tag::CodeBlock(_) | Tag::HtmlBlock)).then_some(span)
        })
        .collect()
}

/// Index of the line closing a colon fence of `len` colons.
fn find_closer(lines: &[&str], len: usize) -> Option<usize> {
    let mut tracker = FenceTracker::new();
    lines.iter().position(|raw| {
        let line = trim_newline(raw);
        let line = &line[container_prefix(line)..];
        if !tracker.in_fence() && closes_fence(line, FenceMarker::Colon, len) {
            return true;
        }
        tracker.update(line);
        false
    })
}

/// Tilde run longer than any tilde run starting a content line.
fn tilde_width(content: &[&str]) -> usize {
    content
        .iter()
        .map(|raw| {
            let line = trim_newline(raw);
            let line = &line[container_prefix(line)..];
            line.len() - line.trim_start_matches('~').len()
        })
        .max()
        .unwrap_or(0)
        .max(MIN_FENCE_LEN - 1)
        + 1
}

fn trim_newline(line: &str) -> &str {
    line.strip_suffix('\n')
        .map_or(line, |l| l.strip_suffix('\r').unwrap_or(l))
}
