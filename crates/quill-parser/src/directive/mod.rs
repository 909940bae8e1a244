//! Directive extension engine.
//!
//! A directive is a fence whose info string starts with `{name}`:
//!
//! ````markdown
//! ```{note} An optional argument
//! :class: tip
//! :collapsible:
//!
//! Body content, parsed as **Markdown**.
//! ```
//! ````
//!
//! Backtick, tilde and `:::` colon fences all work. Options come either as
//! `:key: value` lines or as a YAML block between `---` lines at the top of
//! the content.
//!
//! # Architecture
//!
//! The engine rewrites the token stream of the host parser:
//!
//! 1. **Classification**: fence tokens whose info string names a directive
//!    become directive tokens.
//! 2. **Splitting** ([`split_content`]): the content is separated into raw
//!    options and body.
//! 3. **Coercion** ([`coerce_options`]): raw values become numbers,
//!    booleans or strings; the first occurrence of a key wins.
//! 4. **Sub-parsing** ([`SubParser`]): argument and option values are
//!    parsed as inline Markdown, the body as block Markdown, all with line
//!    numbers of the top-level document.
//! 5. **Assembly** ([`DirectiveEngine`]): the parts become a
//!    [`DirectiveNode`](crate::DirectiveNode), or an
//!    [`ErrorNode`](crate::ErrorNode) if any step fails.
//!
//! Handlers registered in a [`DirectiveRegistry`] describe directives and
//! may reject them through [`DirectiveHandler::validate`].
//!
//! # Example
//!
//! ```
//! use quill_parser::{MarkdownParser, OptionValue};
//!
//! let doc = MarkdownParser::new().parse("```{note} Heads up\n:level: 2\n\nBody\n```\n");
//!
//! let note = doc.nodes[0].as_directive().unwrap();
//! assert_eq!(note.name, "note");
//! assert_eq!(note.arg.as_deref(), Some("Heads up"));
//! assert_eq!(note.options.get("level"), Some(&OptionValue::Number(2.0)));
//! assert_eq!(note.body, "Body");
//! ```

mod assemble;
mod classify;
mod content;
mod context;
mod error;
mod handler;
mod options;
mod registry;
mod subparse;

pub use assemble::DirectiveEngine;
pub use classify::parse_info;
pub use content::{OptionEntry, SplitContent, split_content};
pub use context::ParseContext;
pub use error::{DirectiveError, DirectiveErrorKind, OptionsError};
pub use handler::{DirectiveHandler, DirectiveSpec, OptionKind, OptionSpec};
pub use options::{coerce_options, coerce_value};
pub use registry::DirectiveRegistry;
pub use subparse::SubParser;
