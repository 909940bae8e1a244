//! Host Markdown parser.

use quill_config::ParserConfig;

use crate::ast::{DirectiveNode, Node};
use crate::diagnostic::{Diagnostic, Severity};
use crate::directive::{
    DirectiveEngine, DirectiveError, DirectiveHandler, DirectiveRegistry, ParseContext, SubParser,
};
use crate::tokenizer::{LinkRefs, Tokenized, tokenize, tokenize_inline};
use crate::tree;

/// Markdown parser with directive support.
///
/// `parse` takes `&self`, so one parser can be shared across threads.
///
/// # Example
///
/// ```
/// use quill_parser::{MarkdownParser, Node, ParserConfig};
///
/// let parser = MarkdownParser::with_config(ParserConfig::default().with_max_depth(4));
/// let doc = parser.parse("# Guide\n\n:::{tip}\nUse `quill`.\n:::\n");
///
/// assert!(matches!(doc.nodes[0], Node::Heading { level: 1, .. }));
/// assert_eq!(doc.nodes[1].as_directive().unwrap().name, "tip");
/// assert!(doc.diagnostics.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MarkdownParser {
    config: ParserConfig,
    registry: DirectiveRegistry,
}

impl MarkdownParser {
    /// Create a parser with default settings and no registered handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with the given settings.
    #[must_use]
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            registry: DirectiveRegistry::new(),
        }
    }

    /// Register a directive handler.
    #[must_use]
    pub fn with_directive<H: DirectiveHandler + 'static>(mut self, handler: H) -> Self {
        self.registry.register(handler);
        self
    }

    /// Replace the directive registry.
    #[must_use]
    pub fn with_registry(mut self, registry: DirectiveRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Parser settings.
    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Registered directive handlers.
    #[must_use]
    pub fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    /// Parse a document.
    ///
    /// Never fails: malformed directives become error nodes and are
    /// reported in [`ParsedDocument::diagnostics`].
    pub fn parse(&self, text: &str) -> ParsedDocument {
        let mut diagnostics = Vec::new();
        let nodes = self.parse_blocks(
            text,
            ParseContext::document(),
            &LinkRefs::default(),
            &mut diagnostics,
        );
        tracing::debug!(
            nodes = nodes.len(),
            diagnostics = diagnostics.len(),
            "Parsed document"
        );
        ParsedDocument { nodes, diagnostics }
    }

    fn parse_blocks(
        &self,
        text: &str,
        ctx: ParseContext,
        refs: &LinkRefs,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Node> {
        let engine = DirectiveEngine::new(&self.registry, &self.config);
        let Tokenized { tokens, refs } = tokenize(text, ctx.line, &self.config, refs);
        let tokens = engine.classify(tokens);
        let scope = Scope {
            parser: self,
            refs: &refs,
        };
        let tokens = engine.run(tokens, &scope, ctx, diagnostics);
        tree::build(tokens)
    }
}

/// Sub-parser for directive content, seeing the link references of the
/// text that encloses it.
struct Scope<'a> {
    parser: &'a MarkdownParser,
    refs: &'a LinkRefs,
}

impl SubParser for Scope<'_> {
    fn parse_inline(
        &self,
        text: &str,
        ctx: ParseContext,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Node>, DirectiveError> {
        Ok(tokenize_inline(
            text,
            ctx.line,
            self.parser.config.gfm,
            self.refs,
        ))
    }

    fn parse_block(
        &self,
        text: &str,
        ctx: ParseContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Node>, DirectiveError> {
        Ok(self.parser.parse_blocks(text, ctx, self.refs, diagnostics))
    }
}

impl SubParser for MarkdownParser {
    fn parse_inline(
        &self,
        text: &str,
        ctx: ParseContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Node>, DirectiveError> {
        let refs = LinkRefs::default();
        Scope { parser: self, refs: &refs }.parse_inline(text, ctx, diagnostics)
    }

    fn parse_block(
        &self,
        text: &str,
        ctx: ParseContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Node>, DirectiveError> {
        Ok(self.parse_blocks(text, ctx, &LinkRefs::default(), diagnostics))
    }
}

/// Result of parsing a document.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParsedDocument {
    /// Top-level nodes in source order.
    pub nodes: Vec<Node>,
    /// Warnings and errors in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedDocument {
    /// Check if any directive failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Warning diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// All assembled directives, depth-first in source order.
    ///
    /// Includes directives nested in other directives' bodies.
    #[must_use]
    pub fn directives(&self) -> Vec<&DirectiveNode> {
        let mut found = Vec::new();
        collect_directives(&self.nodes, &mut found);
        found
    }
}

fn collect_directives<'a>(nodes: &'a [Node], found: &mut Vec<&'a DirectiveNode>) {
    for node in nodes {
        if let Node::Directive(directive) = node {
            found.push(directive);
        }
        collect_directives(node.children(), found);
    }
}
