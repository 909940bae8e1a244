//! Fold a flat token stream back into a node tree.

use crate::ast::{Node, SourceRange};
use crate::token::{ContainerKind, Token};

struct OpenContainer {
    kind: ContainerKind,
    range: SourceRange,
    children: Vec<Node>,
}

impl OpenContainer {
    fn finish(self) -> Node {
        let Self {
            kind,
            range,
            children,
        } = self;
        match kind {
            ContainerKind::BlockQuote => Node::BlockQuote { children, range },
            ContainerKind::List { ordered, start } => Node::List {
                ordered,
                start,
                children,
                range,
            },
            ContainerKind::ListItem { checked } => Node::ListItem {
                checked,
                children,
                range,
            },
            ContainerKind::Table => Node::Table { children, range },
            ContainerKind::TableRow { header } => Node::TableRow {
                header,
                children,
                range,
            },
        }
    }
}

/// Build the node tree.
///
/// Fences still present at this point are plain code blocks. Containers
/// left open at the end of the stream are closed.
pub(crate) fn build(tokens: Vec<Token>) -> Vec<Node> {
    let mut root = Vec::new();
    let mut stack: Vec<OpenContainer> = Vec::new();

    for token in tokens {
        let node = match token {
            Token::Open { container, range } => {
                stack.push(OpenContainer {
                    kind: container,
                    range,
                    children: Vec::new(),
                });
                continue;
            }
            Token::Close => match stack.pop() {
                Some(open) => open.finish(),
                None => continue,
            },
            Token::Leaf(node) => node,
            Token::Fence(fence) => fence.into_code(),
            Token::Directive(directive) => directive.fence.into_code(),
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => root.push(node),
        }
    }

    while let Some(open) = stack.pop() {
        let node = open.finish();
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => root.push(node),
        }
    }

    root
}
