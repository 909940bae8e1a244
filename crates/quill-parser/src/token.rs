//! Flat token stream between the tokenizer and the tree builder.
//!
//! The directive engine works on this stream: fences are relabelled as
//! directive tokens and directive tokens are replaced by finished nodes.
//! Everything else passes through untouched.

use crate::ast::{Node, SourceRange};

/// Character a fence is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FenceMarker {
    /// `` ``` ``
    Backtick,
    /// `~~~`
    Tilde,
    /// `:::`
    Colon,
}

impl FenceMarker {
    /// Marker for a fence character, if it is one.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '`' => Some(Self::Backtick),
            '~' => Some(Self::Tilde),
            ':' => Some(Self::Colon),
            _ => None,
        }
    }

    /// The fence character.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Backtick => '`',
            Self::Tilde => '~',
            Self::Colon => ':',
        }
    }
}

/// A fenced block exactly as the tokenizer saw it.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFenceBlock {
    /// Fence character.
    pub marker: FenceMarker,
    /// Info string after the opening fence, trimmed.
    pub info: String,
    /// Lines between the opening and closing fence.
    pub content_lines: Vec<String>,
    /// Lines spanned by the fence, including opener and closer.
    pub range: SourceRange,
}

impl RawFenceBlock {
    /// Absolute line of the opening fence.
    #[must_use]
    pub fn start_line(&self) -> usize {
        self.range.start_line
    }

    /// Fence content joined with newlines.
    #[must_use]
    pub fn raw_content(&self) -> String {
        self.content_lines.join("\n")
    }

    /// Render the fence as a plain code node.
    ///
    /// The first word of the info string becomes the language, the rest the
    /// meta string.
    #[must_use]
    pub fn into_code(self) -> Node {
        let info = self.info.trim();
        let (lang, meta) = match info.split_once(char::is_whitespace) {
            Some((lang, meta)) => (lang, meta.trim()),
            None => (info, ""),
        };
        Node::Code {
            lang: (!lang.is_empty()).then(|| lang.to_owned()),
            meta: (!meta.is_empty()).then(|| meta.to_owned()),
            value: self.raw_content(),
            range: self.range,
        }
    }
}

/// A fence whose info string names a directive.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectiveToken {
    /// Name inside the braces.
    pub name: String,
    /// Trimmed remainder of the info string, if non-empty.
    pub arg: Option<String>,
    /// The fence the directive was found in.
    pub fence: RawFenceBlock,
}

/// Container block opened by [`Token::Open`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    BlockQuote,
    List { ordered: bool, start: Option<u64> },
    ListItem { checked: Option<bool> },
    Table,
    TableRow { header: bool },
}

/// Token of the flat block stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Start of a container block.
    Open {
        container: ContainerKind,
        range: SourceRange,
    },
    /// End of the innermost open container.
    Close,
    /// Finished node.
    Leaf(Node),
    /// Fenced block that has not been classified.
    Fence(RawFenceBlock),
    /// Fenced block classified as a directive.
    Directive(DirectiveToken),
}
