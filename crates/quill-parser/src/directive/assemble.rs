//! Directive assembly.
//!
//! Each directive token goes through
//! `classified -> content split -> options coerced + sub-parsed -> assembled`,
//! or drops out to an error node at any step. A directive never affects its
//! siblings: its diagnostics and failures stay local until it is finished.

use quill_config::ParserConfig;

use crate::ast::{DirectiveNode, DirectiveOption, ErrorNode, Node, SourceRange};
use crate::diagnostic::Diagnostic;
use crate::token::{DirectiveToken, Token};

use super::classify::{Classifier, raw_arg};
use super::subparse::{block_nodes, inline_nodes};
use super::{
    DirectiveError, DirectiveRegistry, ParseContext, SubParser, coerce_options, split_content,
};

/// Rewrites token streams, replacing directive fences with finished nodes.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveEngine<'a> {
    registry: &'a DirectiveRegistry,
    config: &'a ParserConfig,
}

impl<'a> DirectiveEngine<'a> {
    /// Create an engine over a registry and parser settings.
    #[must_use]
    pub fn new(registry: &'a DirectiveRegistry, config: &'a ParserConfig) -> Self {
        Self { registry, config }
    }

    /// Relabel directive fences as directive tokens.
    #[must_use]
    pub fn classify(&self, tokens: Vec<Token>) -> Vec<Token> {
        let classifier = Classifier {
            registry: self.config.registered_only.then_some(self.registry),
        };
        classifier.run(tokens)
    }

    /// Replace every directive token with a directive or error node.
    ///
    /// `ctx` is the context the tokens were produced in; its depth is the
    /// nesting depth of the directives found in them. Other tokens are
    /// passed through in order.
    pub fn run<P: SubParser + ?Sized>(
        &self,
        tokens: Vec<Token>,
        host: &P,
        ctx: ParseContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Token> {
        tokens
            .into_iter()
            .map(|token| match token {
                Token::Directive(directive) => {
                    Token::Leaf(self.assemble(directive, host, ctx, diagnostics))
                }
                other => other,
            })
            .collect()
    }

    /// Assemble a single directive.
    ///
    /// Any failure yields a [`Node::DirectiveError`] plus an error
    /// diagnostic; diagnostics gathered while assembling the failed
    /// directive are dropped.
    pub fn assemble<P: SubParser + ?Sized>(
        &self,
        token: DirectiveToken,
        host: &P,
        ctx: ParseContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Node {
        let mut local = Vec::new();
        match self.try_assemble(&token, host, ctx, &mut local) {
            Ok(node) => {
                tracing::debug!(
                    directive = %node.name,
                    line = node.range.start_line,
                    options = node.options.len(),
                    "Assembled directive"
                );
                diagnostics.append(&mut local);
                Node::Directive(Box::new(node))
            }
            Err(err) => {
                tracing::warn!(
                    directive = %token.name,
                    line = token.fence.start_line(),
                    kind = %err.kind(),
                    error = %err,
                    "Directive replaced by error node"
                );
                diagnostics.push(Diagnostic::error(
                    format!("Error parsing \"{}\" directive: {err}", token.name),
                    token.fence.range,
                ));
                Node::DirectiveError(Box::new(error_node(token, &err)))
            }
        }
    }

    fn try_assemble<P: SubParser + ?Sized>(
        &self,
        token: &DirectiveToken,
        host: &P,
        ctx: ParseContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<DirectiveNode, DirectiveError> {
        if ctx.depth >= self.config.max_depth {
            return Err(DirectiveError::NestingTooDeep {
                max: self.config.max_depth,
            });
        }

        let fence = &token.fence;
        let here = ParseContext::new(fence.start_line(), ctx.depth);

        let split = split_content(&fence.content_lines);
        if let Some(reason) = &split.warning {
            tracing::warn!(
                directive = %token.name,
                line = here.line,
                error = %reason,
                "Ignoring invalid directive options"
            );
            diagnostics.push(Diagnostic::warning(
                format!(
                    "Invalid YAML options in \"{}\" directive: {reason}",
                    token.name
                ),
                fence.range,
            ));
        }
        let options = coerce_options(&split.options);

        let arg_nodes = match &token.arg {
            Some(arg) => inline_nodes(host, arg, here, diagnostics)?,
            None => Vec::new(),
        };

        let mut option_nodes: Vec<DirectiveOption> = Vec::with_capacity(options.len());
        for entry in &split.options {
            if option_nodes.iter().any(|option| option.key == entry.key) {
                continue;
            }
            let Some(value) = options.get(&entry.key) else {
                continue;
            };
            let line_ctx = here.offset(entry.line_offset)?;
            let children = inline_nodes(host, &entry.value, line_ctx, diagnostics)?;
            option_nodes.push(DirectiveOption {
                key: entry.key.clone(),
                value: value.clone(),
                raw: entry.value.clone(),
                children,
                range: SourceRange::line(line_ctx.line),
            });
        }

        let body_ctx = here.nested(split.body_offset)?;
        let body_nodes = block_nodes(host, &split.body, body_ctx, diagnostics)?;

        let node = DirectiveNode {
            name: token.name.clone(),
            arg: token.arg.clone(),
            options,
            body: split.body,
            arg_nodes,
            option_nodes,
            body_nodes,
            range: fence.range,
        };

        if let Some(handler) = self.registry.get(&node.name) {
            handler.validate(&node)?;
        }
        Ok(node)
    }
}

fn error_node(token: DirectiveToken, err: &DirectiveError) -> ErrorNode {
    ErrorNode {
        raw_content: token.fence.raw_content(),
        range: token.fence.range,
        name: token.name,
        arg: raw_arg(&token.fence.info).map(str::to_owned).or(token.arg),
        message: err.to_string(),
        kind: err.kind(),
    }
}
