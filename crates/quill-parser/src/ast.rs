//! Document AST produced by [`MarkdownParser`](crate::MarkdownParser).
//!
//! Block and inline nodes share one [`Node`] enum. Every node carries a
//! [`SourceRange`] expressed in lines of the top-level document, including
//! nodes produced by re-parsing a directive's argument, options or body.

use std::fmt;

use indexmap::IndexMap;

use crate::directive::DirectiveErrorKind;

/// Inclusive, 1-based line range in the top-level document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceRange {
    /// First line (1-indexed).
    pub start_line: usize,
    /// Last line (1-indexed, inclusive).
    pub end_line: usize,
}

impl SourceRange {
    /// Create a range from first and last line.
    #[must_use]
    pub const fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Range covering a single line.
    #[must_use]
    pub const fn line(line: usize) -> Self {
        Self::new(line, line)
    }

    /// Check if a line falls within this range.
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Smallest range covering both ranges.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start_line: self.start_line.min(other.start_line),
            end_line: self.end_line.max(other.end_line),
        }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "line {}", self.start_line)
        } else {
            write!(f, "lines {}-{}", self.start_line, self.end_line)
        }
    }
}

/// Typed directive option value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum OptionValue {
    /// Numeric literal.
    Number(f64),
    /// `true` or `false` (case-insensitive).
    Boolean(bool),
    /// Anything else, unchanged.
    String(String),
}

impl OptionValue {
    /// Get the value as a string slice if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a number if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the value as a boolean if it is boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Ordered directive options.
///
/// Iteration follows first-seen order. Inserting a key that is already
/// present keeps the existing value.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct OptionMap {
    entries: IndexMap<String, OptionValue>,
}

impl OptionMap {
    /// Create an empty option map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value unless the key is already present.
    ///
    /// Returns `true` if the value was inserted.
    pub fn insert_first(&mut self, key: impl Into<String>, value: OptionValue) -> bool {
        match self.entries.entry(key.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Get an option value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    /// Check if an option is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over options in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over option keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// A successfully assembled directive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DirectiveNode {
    /// Directive name from `{name}`.
    pub name: String,
    /// Trimmed argument following the name, if any.
    pub arg: Option<String>,
    /// Coerced options.
    pub options: OptionMap,
    /// Body text after the options section.
    pub body: String,
    /// Inline nodes parsed from the argument.
    pub arg_nodes: Vec<Node>,
    /// One entry per retained option.
    pub option_nodes: Vec<DirectiveOption>,
    /// Block nodes parsed from the body.
    pub body_nodes: Vec<Node>,
    /// Lines spanned by the whole fence.
    pub range: SourceRange,
}

/// A single option of a directive, with its typed value and parsed content.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DirectiveOption {
    /// Option key.
    pub key: String,
    /// Coerced value.
    pub value: OptionValue,
    /// Raw value text before coercion.
    pub raw: String,
    /// Inline nodes parsed from the raw value.
    pub children: Vec<Node>,
    /// Line the option was declared on.
    pub range: SourceRange,
}

/// A directive that failed to assemble.
///
/// Carries the untouched fence content so a renderer can show it without
/// knowing anything about the directive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ErrorNode {
    /// Directive name from `{name}`.
    pub name: String,
    /// Raw argument, if any.
    pub arg: Option<String>,
    /// Fence content exactly as written.
    pub raw_content: String,
    /// Error message.
    pub message: String,
    /// Error classification.
    pub kind: DirectiveErrorKind,
    /// Lines spanned by the whole fence.
    pub range: SourceRange,
}

/// AST node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "type", rename_all = "camelCase")
)]
pub enum Node {
    /// Paragraph of inline content.
    Paragraph {
        children: Vec<Node>,
        range: SourceRange,
    },
    /// ATX or setext heading.
    Heading {
        level: u8,
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Fenced or indented code block that is not a directive.
    Code {
        lang: Option<String>,
        meta: Option<String>,
        value: String,
        range: SourceRange,
    },
    /// Block quotation.
    BlockQuote {
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Ordered or bullet list.
    List {
        ordered: bool,
        start: Option<u64>,
        children: Vec<Node>,
        range: SourceRange,
    },
    /// List item; `checked` is set for task list items.
    ListItem {
        checked: Option<bool>,
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Thematic break (`---`).
    ThematicBreak { range: SourceRange },
    /// Raw HTML block.
    Html { value: String, range: SourceRange },
    /// GFM table.
    Table {
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Table row; `header` is set for the head row.
    TableRow {
        header: bool,
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Table cell.
    TableCell {
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Assembled directive.
    Directive(Box<DirectiveNode>),
    /// Directive that failed to assemble.
    DirectiveError(Box<ErrorNode>),
    /// Plain text.
    Text { value: String, range: SourceRange },
    /// Emphasis (`*text*`).
    Emphasis {
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Strong emphasis (`**text**`).
    Strong {
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Strikethrough (`~~text~~`).
    Strikethrough {
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Code span.
    InlineCode { value: String, range: SourceRange },
    /// Hyperlink.
    Link {
        url: String,
        title: String,
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Image; children hold the alt text.
    Image {
        url: String,
        title: String,
        children: Vec<Node>,
        range: SourceRange,
    },
    /// Inline HTML.
    InlineHtml { value: String, range: SourceRange },
    /// Soft or hard line break.
    Break { hard: bool, range: SourceRange },
}

impl Node {
    /// Source lines covered by this node.
    #[must_use]
    pub fn range(&self) -> SourceRange {
        match self {
            Self::Paragraph { range, .. }
            | Self::Heading { range, .. }
            | Self::Code { range, .. }
            | Self::BlockQuote { range, .. }
            | Self::List { range, .. }
            | Self::ListItem { range, .. }
            | Self::ThematicBreak { range }
            | Self::Html { range, .. }
            | Self::Table { range, .. }
            | Self::TableRow { range, .. }
            | Self::TableCell { range, .. }
            | Self::Text { range, .. }
            | Self::Emphasis { range, .. }
            | Self::Strong { range, .. }
            | Self::Strikethrough { range, .. }
            | Self::InlineCode { range, .. }
            | Self::Link { range, .. }
            | Self::Image { range, .. }
            | Self::InlineHtml { range, .. }
            | Self::Break { range, .. } => *range,
            Self::Directive(node) => node.range,
            Self::DirectiveError(node) => node.range,
        }
    }

    /// Child nodes of container nodes.
    ///
    /// Directives expose their body nodes; leaves return an empty slice.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Paragraph { children, .. }
            | Self::Heading { children, .. }
            | Self::BlockQuote { children, .. }
            | Self::List { children, .. }
            | Self::ListItem { children, .. }
            | Self::Table { children, .. }
            | Self::TableRow { children, .. }
            | Self::TableCell { children, .. }
            | Self::Emphasis { children, .. }
            | Self::Strong { children, .. }
            | Self::Strikethrough { children, .. }
            | Self::Link { children, .. }
            | Self::Image { children, .. } => children,
            Self::Directive(node) => &node.body_nodes,
            Self::Code { .. }
            | Self::ThematicBreak { .. }
            | Self::Html { .. }
            | Self::DirectiveError(_)
            | Self::Text { .. }
            | Self::InlineCode { .. }
            | Self::InlineHtml { .. }
            | Self::Break { .. } => &[],
        }
    }

    /// Get the assembled directive if this is a directive node.
    #[must_use]
    pub fn as_directive(&self) -> Option<&DirectiveNode> {
        match self {
            Self::Directive(node) => Some(node),
            _ => None,
        }
    }

    /// Get the error node if this directive failed to assemble.
    #[must_use]
    pub fn as_directive_error(&self) -> Option<&ErrorNode> {
        match self {
            Self::DirectiveError(node) => Some(node),
            _ => None,
        }
    }

    /// Concatenated text content of this node and its descendants.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { value, .. } | Self::InlineCode { value, .. } | Self::Code { value, .. } => {
                out.push_str(value);
            }
            Self::Break { .. } => out.push('\n'),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_map_first_insert_wins() {
        let mut map = OptionMap::new();
        assert!(map.insert_first("x", OptionValue::Number(1.0)));
        assert!(!map.insert_first("x", OptionValue::Number(2.0)));
        assert_eq!(map.get("x"), Some(&OptionValue::Number(1.0)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_option_map_preserves_order() {
        let mut map = OptionMap::new();
        map.insert_first("b", OptionValue::Boolean(true));
        map.insert_first("a", OptionValue::String("x".to_owned()));
        map.insert_first("c", OptionValue::Number(3.0));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_option_value_display() {
        assert_eq!(OptionValue::Number(5.0).to_string(), "5");
        assert_eq!(OptionValue::Number(2.5).to_string(), "2.5");
        assert_eq!(OptionValue::Boolean(false).to_string(), "false");
        assert_eq!(OptionValue::String("two".to_owned()).to_string(), "two");
    }

    #[test]
    fn test_source_range_display() {
        assert_eq!(SourceRange::line(3).to_string(), "line 3");
        assert_eq!(SourceRange::new(3, 7).to_string(), "lines 3-7");
    }

    #[test]
    fn test_source_range_merge() {
        let merged = SourceRange::new(4, 5).merge(SourceRange::new(2, 4));
        assert_eq!(merged, SourceRange::new(2, 5));
        assert!(merged.contains_line(3));
        assert!(!merged.contains_line(6));
    }

    #[test]
    fn test_plain_text() {
        let node = Node::Paragraph {
            children: vec![
                Node::Text {
                    value: "Hello ".to_owned(),
                    range: SourceRange::line(1),
                },
                Node::Strong {
                    children: vec![Node::Text {
                        value: "world".to_owned(),
                        range: SourceRange::line(1),
                    }],
                    range: SourceRange::line(1),
                },
            ],
            range: SourceRange::line(1),
        };
        assert_eq!(node.plain_text(), "Hello world");
    }
}
