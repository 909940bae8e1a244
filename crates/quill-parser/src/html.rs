//! Fallback HTML rendering.
//!
//! Produces semantic HTML5 for the host AST. Directives are rendered by
//! renderers registered per name; unregistered directives and error nodes
//! get a visible fallback:
//!
//! ```html
//! <aside class="directive-unhandled">
//! <header><mark>name</mark><code> arg</code></header>
//! <pre>raw body</pre></aside>
//! ```
//!
//! ```html
//! <aside class="directive-error">
//! <header><mark>name</mark><code> arg</code></header>
//! <pre>validation error:
//! message
//!
//! ---
//! raw content</pre></aside>
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use crate::ast::{DirectiveNode, ErrorNode, Node};

/// Renders one directive to HTML.
///
/// Implemented for closures, so a renderer can be registered inline:
///
/// ```
/// use quill_parser::{DirectiveNode, HtmlRenderer, MarkdownParser};
///
/// fn note(node: &DirectiveNode, r: &HtmlRenderer, out: &mut String) {
///     out.push_str("<div class=\"note\">\n");
///     r.render_into(&node.body_nodes, out);
///     out.push_str("</div>\n");
/// }
///
/// let html = HtmlRenderer::new().with_directive("note", note);
///
/// let doc = MarkdownParser::new().parse(":::{note}\nHello\n:::\n");
/// assert_eq!(html.render(&doc.nodes), "<div class=\"note\">\n<p>Hello</p>\n</div>\n");
/// ```
pub trait DirectiveRenderer: Send + Sync {
    /// Append HTML for `node` to `out`.
    fn render(&self, node: &DirectiveNode, renderer: &HtmlRenderer, out: &mut String);
}

impl<F> DirectiveRenderer for F
where
    F: Fn(&DirectiveNode, &HtmlRenderer, &mut String) + Send + Sync,
{
    fn render(&self, node: &DirectiveNode, renderer: &HtmlRenderer, out: &mut String) {
        self(node, renderer, out);
    }
}

/// HTML renderer with per-directive hooks.
#[derive(Default)]
pub struct HtmlRenderer {
    directives: HashMap<String, Box<dyn DirectiveRenderer>>,
}

impl HtmlRenderer {
    /// Create a renderer with no directive renderers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer for a directive name.
    #[must_use]
    pub fn with_directive<R: DirectiveRenderer + 'static>(
        mut self,
        name: impl Into<String>,
        renderer: R,
    ) -> Self {
        self.directives.insert(name.into(), Box::new(renderer));
        self
    }

    /// Render nodes to an HTML string.
    #[must_use]
    pub fn render(&self, nodes: &[Node]) -> String {
        let mut out = String::new();
        self.render_into(nodes, &mut out);
        out
    }

    /// Append HTML for `nodes` to `out`.
    pub fn render_into(&self, nodes: &[Node], out: &mut String) {
        for node in nodes {
            self.node(node, out);
        }
    }

    fn node(&self, node: &Node, out: &mut String) {
        match node {
            Node::Paragraph { children, .. } => self.wrap("p", children, out),
            Node::Heading {
                level, children, ..
            } => {
                let _ = write!(out, "<h{level}>");
                self.render_into(children, out);
                let _ = writeln!(out, "</h{level}>");
            }
            Node::Code { lang, value, .. } => {
                match lang {
                    Some(lang) => {
                        let _ = write!(
                            out,
                            r#"<pre><code class="language-{}">"#,
                            escape_html(lang)
                        );
                    }
                    None => out.push_str("<pre><code>"),
                }
                out.push_str(&escape_html(value));
                out.push_str("</code></pre>\n");
            }
            Node::BlockQuote { children, .. } => {
                out.push_str("<blockquote>\n");
                self.render_into(children, out);
                out.push_str("</blockquote>\n");
            }
            Node::List {
                ordered,
                start,
                children,
                ..
            } => {
                let tag = if *ordered { "ol" } else { "ul" };
                match start {
                    Some(start) if *ordered && *start != 1 => {
                        let _ = writeln!(out, r#"<ol start="{start}">"#);
                    }
                    _ => {
                        let _ = writeln!(out, "<{tag}>");
                    }
                }
                self.render_into(children, out);
                let _ = writeln!(out, "</{tag}>");
            }
            Node::ListItem {
                checked, children, ..
            } => {
                out.push_str("<li>");
                match checked {
                    Some(true) => out.push_str(r#"<input type="checkbox" disabled checked> "#),
                    Some(false) => out.push_str(r#"<input type="checkbox" disabled> "#),
                    None => {}
                }
                self.list_item_content(children, out);
                out.push_str("</li>\n");
            }
            Node::ThematicBreak { .. } => out.push_str("<hr>\n"),
            Node::Html { value, .. } => out.push_str(value),
            Node::Table { children, .. } => {
                out.push_str("<table>\n");
                self.render_into(children, out);
                out.push_str("</table>\n");
            }
            Node::TableRow {
                header, children, ..
            } => {
                let cell = if *header { "th" } else { "td" };
                out.push_str("<tr>");
                for child in children {
                    let _ = write!(out, "<{cell}>");
                    self.render_into(child.children(), out);
                    let _ = write!(out, "</{cell}>");
                }
                out.push_str("</tr>\n");
            }
            Node::TableCell { children, .. } => self.wrap("td", children, out),
            Node::Directive(directive) => match self.directives.get(&directive.name) {
                Some(renderer) => renderer.render(directive, self, out),
                None => unhandled_directive(directive, out),
            },
            Node::DirectiveError(error) => directive_error(error, out),
            Node::Text { value, .. } => out.push_str(&escape_html(value)),
            Node::Emphasis { children, .. } => self.inline("em", children, out),
            Node::Strong { children, .. } => self.inline("strong", children, out),
            Node::Strikethrough { children, .. } => self.inline("del", children, out),
            Node::InlineCode { value, .. } => {
                let _ = write!(out, "<code>{}</code>", escape_html(value));
            }
            Node::Link {
                url,
                title,
                children,
                ..
            } => {
                let _ = write!(out, r#"<a href="{}""#, escape_html(url));
                if !title.is_empty() {
                    let _ = write!(out, r#" title="{}""#, escape_html(title));
                }
                out.push('>');
                self.render_into(children, out);
                out.push_str("</a>");
            }
            Node::Image {
                url,
                title,
                children,
                ..
            } => {
                let alt: String = children.iter().map(Node::plain_text).collect();
                let _ = write!(
                    out,
                    r#"<img src="{}" alt="{}""#,
                    escape_html(url),
                    escape_html(&alt)
                );
                if !title.is_empty() {
                    let _ = write!(out, r#" title="{}""#, escape_html(title));
                }
                out.push('>');
            }
            Node::InlineHtml { value, .. } => out.push_str(value),
            Node::Break { hard: true, .. } => out.push_str("<br>\n"),
            Node::Break { hard: false, .. } => out.push('\n'),
        }
    }

    fn wrap(&self, tag: &str, children: &[Node], out: &mut String) {
        self.inline(tag, children, out);
        out.push('\n');
    }

    fn inline(&self, tag: &str, children: &[Node], out: &mut String) {
        let _ = write!(out, "<{tag}>");
        self.render_into(children, out);
        let _ = write!(out, "</{tag}>");
    }

    /// A single paragraph in a list item renders without `<p>`.
    fn list_item_content(&self, children: &[Node], out: &mut String) {
        match children {
            [Node::Paragraph { children, .. }] => self.render_into(children, out),
            _ => {
                out.push('\n');
                self.render_into(children, out);
            }
        }
    }
}

impl std::fmt::Debug for HtmlRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.directives.keys().collect();
        names.sort();
        f.debug_struct("HtmlRenderer")
            .field("directives", &names)
            .finish()
    }
}

fn header(name: &str, arg: Option<&str>, out: &mut String) {
    let _ = write!(out, "<header><mark>{}</mark>", escape_html(name));
    if let Some(arg) = arg {
        let _ = write!(out, "<code> {}</code>", escape_html(arg));
    }
    out.push_str("</header>\n");
}

fn unhandled_directive(directive: &DirectiveNode, out: &mut String) {
    out.push_str("<aside class=\"directive-unhandled\">\n");
    header(&directive.name, directive.arg.as_deref(), out);
    let _ = writeln!(out, "<pre>{}</pre></aside>", escape_html(&directive.body));
}

fn directive_error(error: &ErrorNode, out: &mut String) {
    out.push_str("<aside class=\"directive-error\">\n");
    header(&error.name, error.arg.as_deref(), out);
    let _ = write!(
        out,
        "<pre>{}:\n{}\n",
        error.kind,
        escape_html(&error.message)
    );
    if !error.raw_content.is_empty() {
        let _ = write!(out, "\n---\n{}", escape_html(&error.raw_content));
    }
    out.push_str("</pre></aside>\n");
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
