//! Markdown tokenizer.
//!
//! Walks `pulldown-cmark` offset events and produces the flat [`Token`]
//! stream: container blocks become open/close pairs, fenced code blocks
//! stay raw so directives can be recognized, and every other block is
//! finished into a [`Node`] right away.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::iter::Peekable;
use std::ops::Range;

use pulldown_cmark::{
    BrokenLink, CodeBlockKind, CowStr, Event, Options, Parser, RefDefs, Tag, TagEnd,
};
use quill_config::ParserConfig;

use crate::ast::{Node, SourceRange};
use crate::fence::rewrite_colon_fences;
use crate::token::{ContainerKind, FenceMarker, RawFenceBlock, Token};
use crate::util::{LineIndex, heading_level_to_num, split_lines};

type Spanned<'a> = (Event<'a>, Range<usize>);

/// Link reference definitions visible to a parse.
///
/// Labels are matched case-insensitively with runs of whitespace
/// collapsed. The first definition of a label wins.
#[derive(Clone, Debug, Default)]
pub(crate) struct LinkRefs {
    defs: HashMap<String, (String, String)>,
}

impl LinkRefs {
    fn normalize(label: &str) -> String {
        label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Destination and title for `label`.
    fn resolve<'x>(&self, label: &str) -> Option<(CowStr<'x>, CowStr<'x>)> {
        let (dest, title) = self.defs.get(&Self::normalize(label))?;
        Some((dest.clone().into(), title.clone().into()))
    }

    /// These definitions followed by the ones in `own`.
    fn extended(&self, own: &RefDefs<'_>) -> Self {
        let mut defs = self.defs.clone();
        for (label, def) in own.iter() {
            defs.entry(Self::normalize(label)).or_insert_with(|| {
                let title = def.title.as_deref().unwrap_or_default();
                (def.dest.as_ref().to_owned(), title.to_owned())
            });
        }
        Self { defs }
    }
}

/// Tokens of one block parse and the link references it can see.
#[derive(Debug)]
pub(crate) struct Tokenized {
    pub(crate) tokens: Vec<Token>,
    /// Inherited definitions plus the ones found in the text.
    pub(crate) refs: LinkRefs,
}

/// Tokenize block content whose first line is `first_line` in the document.
///
/// References in `refs` resolve links the text itself leaves undefined.
pub(crate) fn tokenize(
    text: &str,
    first_line: usize,
    config: &ParserConfig,
    refs: &LinkRefs,
) -> Tokenized {
    let options = block_options(config);
    let (source, colon_openers) = if config.colon_fences {
        let rewrite = rewrite_colon_fences(text, options);
        let bias = first_line.saturating_sub(1);
        let openers = rewrite
            .openers
            .iter()
            .map(|line| bias.saturating_add(*line))
            .collect::<HashSet<usize>>();
        (rewrite.text, openers)
    } else {
        (Cow::Borrowed(text), HashSet::new())
    };

    let mut tokenizer = Tokenizer::new(&source, first_line, options, refs);
    tokenizer.colon_openers = colon_openers;
    let refs = std::mem::take(&mut tokenizer.refs);
    Tokenized {
        tokens: tokenizer.run(),
        refs,
    }
}

/// Tokenize text that may only hold inline content.
///
/// Line starts that would open a block are escaped first. When the text
/// still produces anything but paragraphs, or nothing at all, it is
/// returned verbatim as a single text node.
pub(crate) fn tokenize_inline(
    text: &str,
    first_line: usize,
    gfm: bool,
    refs: &LinkRefs,
) -> Vec<Node> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let neutralized = neutralize_blocks(text);
    let mut options = Options::empty();
    if gfm {
        options.insert(Options::ENABLE_STRIKETHROUGH);
    }

    let mut nodes = Vec::new();
    for token in Tokenizer::new(&neutralized, first_line, options, refs).run() {
        match token {
            Token::Leaf(Node::Paragraph { children, .. }) => nodes.extend(children),
            _ => return vec![verbatim(text, first_line)],
        }
    }
    if nodes.is_empty() {
        return vec![verbatim(text, first_line)];
    }
    nodes
}

fn verbatim(text: &str, first_line: usize) -> Node {
    let lines = text.lines().count().max(1);
    Node::Text {
        value: text.to_owned(),
        range: SourceRange::new(first_line, first_line.saturating_add(lines - 1)),
    }
}

fn block_options(config: &ParserConfig) -> Options {
    let mut options = Options::empty();
    if config.gfm {
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
    }
    options
}

/// Escape line starts that `pulldown-cmark` would read as block syntax.
fn neutralize_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line = line.trim_start();
        match block_marker_at(line) {
            Some(pos) => {
                out.push_str(&line[..pos]);
                out.push('\\');
                out.push_str(&line[pos..]);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Byte position of the character that makes `line` a block start.
fn block_marker_at(line: &str) -> Option<usize> {
    let first = line.chars().next()?;
    match first {
        '#' | '>' | '=' => Some(0),
        '-' | '+' | '*' | '_' => {
            let rest = &line[1..];
            let is_list_marker = first != '_' && (rest.is_empty() || rest.starts_with([' ', '\t']));
            let is_rule = line.chars().all(|c| c == first || c == ' ' || c == '\t');
            (is_list_marker || is_rule).then_some(0)
        }
        '0'..='9' => {
            let digits = line.bytes().take_while(u8::is_ascii_digit).count();
            let rest = &line[digits..];
            let is_ordered = digits <= 9
                && rest.starts_with(['.', ')'])
                && (rest.len() == 1 || rest[1..].starts_with([' ', '\t']));
            is_ordered.then_some(digits)
        }
        _ => None,
    }
}

struct Tokenizer<'a> {
    events: Peekable<std::vec::IntoIter<Spanned<'a>>>,
    source: &'a str,
    lines: LineIndex,
    refs: LinkRefs,
    /// Absolute lines of fences rewritten from colon fences.
    colon_openers: HashSet<usize>,
    tokens: Vec<Token>,
    /// Token indices of currently open list items.
    open_items: Vec<usize>,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str, first_line: usize, options: Options, refs: &LinkRefs) -> Self {
        let callback = |link: BrokenLink| refs.resolve(&link.reference);
        let parser = Parser::new_with_broken_link_callback(source, options, Some(callback));
        let refs = refs.extended(parser.reference_definitions());
        let events: Vec<Spanned<'a>> = parser.into_offset_iter().collect();
        Self {
            events: events.into_iter().peekable(),
            source,
            lines: LineIndex::new(source, first_line),
            refs,
            colon_openers: HashSet::new(),
            tokens: Vec::new(),
            open_items: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some((event, span)) = self.events.next() {
            self.block_event(event, span);
        }
        self.tokens
    }

    fn block_event(&mut self, event: Event<'a>, span: Range<usize>) {
        let range = self.lines.range_of(&span);
        match event {
            Event::Start(tag) if is_inline_tag(&tag) => {
                self.implicit_paragraph(Event::Start(tag), span);
            }
            Event::Start(tag) => self.start_block(tag, span, range),
            Event::End(end) => self.end_block(end),
            Event::Rule => self.leaf(Node::ThematicBreak { range }),
            Event::TaskListMarker(checked) => self.mark_task(checked),
            Event::Html(html) => self.leaf(Node::Html {
                value: html.into_string(),
                range,
            }),
            inline => self.implicit_paragraph(inline, span),
        }
    }

    fn start_block(&mut self, tag: Tag<'a>, span: Range<usize>, range: SourceRange) {
        match tag {
            Tag::Paragraph => {
                let children = self.inline_children();
                self.leaf(Node::Paragraph { children, range });
            }
            Tag::Heading { level, .. } => {
                let children = self.inline_children();
                self.leaf(Node::Heading {
                    level: heading_level_to_num(level),
                    children,
                    range,
                });
            }
            Tag::BlockQuote(_) => self.open(ContainerKind::BlockQuote, range),
            Tag::List(start) => self.open(
                ContainerKind::List {
                    ordered: start.is_some(),
                    start,
                },
                range,
            ),
            Tag::Item => {
                self.open_items.push(self.tokens.len());
                self.open(ContainerKind::ListItem { checked: None }, range);
            }
            Tag::CodeBlock(kind) => {
                let content = self.literal_content();
                let token = match kind {
                    CodeBlockKind::Fenced(info) => Token::Fence(RawFenceBlock {
                        marker: if self.colon_openers.contains(&range.start_line) {
                            FenceMarker::Colon
                        } else {
                            self.fence_marker(span.start)
                        },
                        info: info.trim().to_owned(),
                        content_lines: split_lines(&content),
                        range,
                    }),
                    CodeBlockKind::Indented => Token::Leaf(Node::Code {
                        lang: None,
                        meta: None,
                        value: content.trim_end_matches('\n').to_owned(),
                        range,
                    }),
                };
                self.tokens.push(token);
            }
            Tag::HtmlBlock => {
                let value = self.literal_content();
                self.leaf(Node::Html { value, range });
            }
            Tag::Table(_) => self.open(ContainerKind::Table, range),
            Tag::TableHead => self.open(ContainerKind::TableRow { header: true }, range),
            Tag::TableRow => self.open(ContainerKind::TableRow { header: false }, range),
            Tag::TableCell => {
                let children = self.inline_children();
                self.leaf(Node::TableCell { children, range });
            }
            // Not enabled; skip whatever they contain.
            _ => self.skip_to_end(),
        }
    }

    fn end_block(&mut self, end: TagEnd) {
        match end {
            TagEnd::Item => {
                self.open_items.pop();
                self.tokens.push(Token::Close);
            }
            TagEnd::BlockQuote(_)
            | TagEnd::List(_)
            | TagEnd::Table
            | TagEnd::TableHead
            | TagEnd::TableRow => self.tokens.push(Token::Close),
            _ => {}
        }
    }

    fn open(&mut self, container: ContainerKind, range: SourceRange) {
        self.tokens.push(Token::Open { container, range });
    }

    fn leaf(&mut self, node: Node) {
        self.tokens.push(Token::Leaf(node));
    }

    fn mark_task(&mut self, checked: bool) {
        if let Some(&idx) = self.open_items.last()
            && let Some(Token::Open { container, .. }) = self.tokens.get_mut(idx)
        {
            *container = ContainerKind::ListItem {
                checked: Some(checked),
            };
        }
    }

    /// Marker character of a fenced code block starting at `offset`.
    fn fence_marker(&self, offset: usize) -> FenceMarker {
        self.source
            .get(offset..)
            .unwrap_or_default()
            .trim_start_matches(|c: char| c.is_whitespace() || c == '>')
            .chars()
            .next()
            .and_then(FenceMarker::from_char)
            .unwrap_or(FenceMarker::Backtick)
    }

    /// Concatenate text up to the end of a code or HTML block.
    fn literal_content(&mut self) -> String {
        let mut content = String::new();
        for (event, _) in self.events.by_ref() {
            match event {
                Event::End(_) => break,
                Event::Text(text) | Event::Html(text) => content.push_str(&text),
                _ => {}
            }
        }
        content
    }

    fn skip_to_end(&mut self) {
        let mut depth = 1usize;
        for (event, _) in self.events.by_ref() {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    /// Bare inline content of a tight list item.
    fn implicit_paragraph(&mut self, first: Event<'a>, span: Range<usize>) {
        let mut covered = span.clone();
        let mut children = Vec::new();
        self.inline_event(first, span, &mut children);

        while self.events.peek().is_some_and(|(event, _)| is_inline_event(event)) {
            let Some((event, span)) = self.events.next() else {
                break;
            };
            covered.start = covered.start.min(span.start);
            covered.end = covered.end.max(span.end);
            self.inline_event(event, span, &mut children);
        }

        let range = self.lines.range_of(&covered);
        self.leaf(Node::Paragraph { children, range });
    }

    /// Inline nodes up to and including the end of the enclosing tag.
    fn inline_children(&mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        while let Some((event, span)) = self.events.next() {
            if matches!(event, Event::End(_)) {
                break;
            }
            self.inline_event(event, span, &mut nodes);
        }
        nodes
    }

    fn inline_event(&mut self, event: Event<'a>, span: Range<usize>, nodes: &mut Vec<Node>) {
        let range = self.lines.range_of(&span);
        match event {
            Event::Text(text) | Event::InlineMath(text) | Event::DisplayMath(text) => {
                push_text(nodes, &text, range);
            }
            Event::Code(code) => nodes.push(Node::InlineCode {
                value: code.into_string(),
                range,
            }),
            Event::InlineHtml(html) | Event::Html(html) => nodes.push(Node::InlineHtml {
                value: html.into_string(),
                range,
            }),
            Event::SoftBreak => nodes.push(Node::Break { hard: false, range }),
            Event::HardBreak => nodes.push(Node::Break { hard: true, range }),
            Event::FootnoteReference(label) => push_text(nodes, &format!("[^{label}]"), range),
            Event::Start(tag) => self.inline_tag(tag, range, nodes),
            Event::End(_) | Event::Rule | Event::TaskListMarker(_) => {}
        }
    }

    fn inline_tag(&mut self, tag: Tag<'a>, range: SourceRange, nodes: &mut Vec<Node>) {
        let children = self.inline_children();
        let node = match tag {
            Tag::Emphasis => Node::Emphasis { children, range },
            Tag::Strong => Node::Strong { children, range },
            Tag::Strikethrough => Node::Strikethrough { children, range },
            Tag::Link {
                dest_url, title, ..
            } => Node::Link {
                url: dest_url.into_string(),
                title: title.into_string(),
                children,
                range,
            },
            Tag::Image {
                dest_url, title, ..
            } => Node::Image {
                url: dest_url.into_string(),
                title: title.into_string(),
                children,
                range,
            },
            _ => {
                nodes.extend(children);
                return;
            }
        };
        nodes.push(node);
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Superscript
            | Tag::Subscript
            | Tag::Link { .. }
            | Tag::Image { .. }
    )
}

fn is_inline_event(event: &Event<'_>) -> bool {
    match event {
        Event::Text(_)
        | Event::Code(_)
        | Event::InlineHtml(_)
        | Event::SoftBreak
        | Event::HardBreak
        | Event::FootnoteReference(_)
        | Event::InlineMath(_)
        | Event::DisplayMath(_) => true,
        Event::Start(tag) => is_inline_tag(tag),
        _ => false,
    }
}

/// Append text, merging with a preceding text node.
fn push_text(nodes: &mut Vec<Node>, value: &str, range: SourceRange) {
    if let Some(Node::Text {
        value: last,
        range: last_range,
    }) = nodes.last_mut()
    {
        last.push_str(value);
        *last_range = last_range.merge(range);
        return;
    }
    nodes.push(Node::Text {
        value: value.to_owned(),
        range,
    });
}
