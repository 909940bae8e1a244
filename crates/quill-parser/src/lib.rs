//! Markdown parser with a directive extension engine.
//!
//! This crate provides [`MarkdownParser`], a `CommonMark` + GFM parser built
//! on `pulldown-cmark` that recognizes directives: fenced blocks tagged
//! with `{name}` that carry an argument, typed options and a body that is
//! parsed as Markdown in turn.
//!
//! # Architecture
//!
//! Parsing is a pure rewrite of a flat token stream:
//! - The tokenizer turns text into tokens. Colon fences are rewritten as
//!   tilde fences first, and fenced blocks stay raw.
//! - The [`directive`] engine relabels `{name}` fences and replaces them
//!   with [`Node::Directive`] or, on failure, [`Node::DirectiveError`].
//!   Directive bodies are parsed by re-entering the parser.
//! - The tree builder folds the stream into [`Node`]s.
//!
//! Every node carries a [`SourceRange`] in lines of the top-level document,
//! including nodes found inside directive bodies. Problems are reported as
//! [`Diagnostic`]s and never abort the parse.
//!
//! [`HtmlRenderer`] renders the AST with fallbacks for directives that
//! have no renderer and for directives that failed.
//!
//! # Example
//!
//! ```
//! use quill_parser::{HtmlRenderer, MarkdownParser};
//!
//! let doc = MarkdownParser::new().parse("```{warning} Careful\n---\nlevel: 3\n---\nHot *stuff*.\n```\n");
//!
//! let warning = doc.nodes[0].as_directive().unwrap();
//! assert_eq!(warning.option_nodes[0].key, "level");
//! assert_eq!(warning.body_nodes[0].range().start_line, 5);
//!
//! let html = HtmlRenderer::new().render(&doc.nodes);
//! assert!(html.starts_with("<aside class=\"directive-unhandled\">"));
//! ```

mod ast;
mod diagnostic;
pub mod directive;
mod fence;
mod html;
mod parser;
pub mod token;
mod tokenizer;
mod tree;
mod util;

pub use ast::{
    DirectiveNode, DirectiveOption, ErrorNode, Node, OptionMap, OptionValue, SourceRange,
};
pub use diagnostic::{Diagnostic, Severity};
pub use html::{DirectiveRenderer, HtmlRenderer, escape_html};
pub use parser::{MarkdownParser, ParsedDocument};
pub use quill_config::ParserConfig;
