use pretty_assertions::assert_eq;
use quill_parser::directive::{
    DirectiveEngine, DirectiveError, DirectiveErrorKind, DirectiveHandler, DirectiveRegistry,
    ParseContext, SubParser,
};
use quill_parser::token::{DirectiveToken, FenceMarker, RawFenceBlock};
use quill_parser::{
    Diagnostic, DirectiveNode, HtmlRenderer, MarkdownParser, Node, OptionValue, ParserConfig,
    Severity, SourceRange,
};

fn parse(text: &str) -> quill_parser::ParsedDocument {
    MarkdownParser::new().parse(text)
}

fn directive(node: &Node) -> &DirectiveNode {
    node.as_directive()
        .unwrap_or_else(|| panic!("expected directive, got {node:?}"))
}

fn text(value: &str, line: usize) -> Node {
    Node::Text {
        value: value.to_owned(),
        range: SourceRange::line(line),
    }
}

/// Rejects directives whose argument is `bad`.
struct Picky;

impl DirectiveHandler for Picky {
    fn name(&self) -> &str {
        "picky"
    }

    fn validate(&self, node: &DirectiveNode) -> Result<(), DirectiveError> {
        if node.arg.as_deref() == Some("bad") {
            return Err(DirectiveError::validation("argument 'bad' is not allowed"));
        }
        Ok(())
    }
}

#[test]
fn test_plain_fences_are_untouched() {
    let doc = parse("```python\nprint(1)\n```\n\n~~~\n{note}\n~~~\n");
    assert_eq!(
        doc.nodes,
        vec![
            Node::Code {
                lang: Some("python".to_owned()),
                meta: None,
                value: "print(1)".to_owned(),
                range: SourceRange::new(1, 3),
            },
            Node::Code {
                lang: None,
                meta: None,
                value: "{note}".to_owned(),
                range: SourceRange::new(5, 7),
            },
        ]
    );
    assert!(doc.diagnostics.is_empty());
}

#[test]
fn test_registered_only_leaves_unknown_fences_as_code() {
    let parser = MarkdownParser::with_config(ParserConfig::default().with_registered_only(true))
        .with_directive(Picky);
    let doc = parser.parse("```{picky} ok\n```\n\n```{unknown} arg\nbody\n```\n");

    assert_eq!(directive(&doc.nodes[0]).name, "picky");
    assert_eq!(
        doc.nodes[1],
        Node::Code {
            lang: Some("{unknown}".to_owned()),
            meta: Some("arg".to_owned()),
            value: "body".to_owned(),
            range: SourceRange::new(4, 6),
        }
    );
}

#[test]
fn test_yaml_options() {
    let doc = parse("```{figure} plot.png\n---\na: 1\nb: two\n---\nbody\n```\n");
    let figure = directive(&doc.nodes[0]);

    assert_eq!(figure.name, "figure");
    assert_eq!(figure.arg.as_deref(), Some("plot.png"));
    assert_eq!(
        figure.options.iter().collect::<Vec<_>>(),
        vec![
            ("a", &OptionValue::Number(1.0)),
            ("b", &OptionValue::String("two".to_owned())),
        ]
    );
    assert_eq!(figure.body, "body");
    assert_eq!(figure.option_nodes[0].range, SourceRange::line(3));
    assert_eq!(figure.option_nodes[1].range, SourceRange::line(4));
    assert_eq!(figure.body_nodes[0].range(), SourceRange::line(6));
    assert!(doc.diagnostics.is_empty());
}

#[test]
fn test_colon_options() {
    let doc = parse(":::{d}\n:x: 5\n:y:\nbody\n:::\n");
    let d = directive(&doc.nodes[0]);

    assert_eq!(d.options.get("x"), Some(&OptionValue::Number(5.0)));
    assert_eq!(d.options.get("y"), Some(&OptionValue::Boolean(true)));
    assert_eq!(d.options.len(), 2);
    assert_eq!(d.body, "body");
    assert_eq!(d.option_nodes[1].raw, "true");
}

#[test]
fn test_first_duplicate_wins() {
    let doc = parse("```{d}\n:x: 1\n:x: 2\n```\n");
    let d = directive(&doc.nodes[0]);

    assert_eq!(d.options.len(), 1);
    assert_eq!(d.options.get("x"), Some(&OptionValue::Number(1.0)));
    assert_eq!(d.option_nodes.len(), 1);
    assert_eq!(d.option_nodes[0].range, SourceRange::line(2));
}

#[test]
fn test_option_values_are_parsed_inline() {
    let doc = parse("```{d}\n:title: A **bold** claim\n```\n");
    let d = directive(&doc.nodes[0]);

    assert_eq!(
        d.option_nodes[0].children,
        vec![
            text("A ", 2),
            Node::Strong {
                children: vec![text("bold", 2)],
                range: SourceRange::line(2),
            },
            text(" claim", 2),
        ]
    );
}

#[test]
fn test_malformed_yaml_falls_back_with_one_warning() {
    let doc = parse("```{d}\n---\n: : :\n---\nbody\n```\n");
    let d = directive(&doc.nodes[0]);

    assert!(d.options.is_empty());
    assert_eq!(d.body, "---\n: : :\n---\nbody");
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(doc.diagnostics[0].severity, Severity::Warning);
    assert!(
        doc.diagnostics[0]
            .message
            .starts_with("Invalid YAML options in \"d\" directive:"),
        "unexpected message: {}",
        doc.diagnostics[0].message
    );
    assert_eq!(doc.diagnostics[0].range, SourceRange::new(1, 6));
    assert!(!doc.has_errors());
}

#[test]
fn test_empty_or_null_yaml_falls_back() {
    for content in ["---\n---\nbody", "---\nnull\n---\nbody", "---\n~\n---\nbody"] {
        let doc = parse(&format!("```{{d}}\n{content}\n```\n"));
        let d = directive(&doc.nodes[0]);

        assert!(d.options.is_empty());
        assert_eq!(d.body, content);
        assert_eq!(doc.warnings().count(), 1);
        assert_eq!(d.body_nodes[0].range().start_line, 2);
    }
}

#[test]
fn test_leading_blank_lines_are_stripped() {
    let doc = parse("```{d}\n:a: 1\n\n\nbody\n```\n");
    let d = directive(&doc.nodes[0]);

    assert_eq!(d.body, "body");
    assert_eq!(d.options.keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(
        d.body_nodes,
        vec![Node::Paragraph {
            children: vec![text("body", 5)],
            range: SourceRange::line(5),
        }]
    );
}

#[test]
fn test_nested_directives() {
    let doc = parse("````{outer}\n```{inner}\nx\n```\n````\n");
    let outer = directive(&doc.nodes[0]);
    assert_eq!(outer.body, "```{inner}\nx\n```");

    let inner = directive(&outer.body_nodes[0]);
    assert_eq!(inner.name, "inner");
    assert_eq!(inner.body, "x");
    assert_eq!(inner.range, SourceRange::new(2, 4));
    assert_eq!(inner.body_nodes[0].range(), SourceRange::line(3));
}

#[test]
fn test_body_lines_are_absolute() {
    let source = "Intro\n\n```{d} The *arg*\n:a: 1\n:b: 2\n\nFirst para\n\nSecond para\n```\n";
    let doc = parse(source);
    let d = directive(&doc.nodes[1]);

    // Opening fence on line 3, body offset 4.
    assert_eq!(d.range, SourceRange::new(3, 10));
    assert_eq!(d.arg_nodes[0].range(), SourceRange::line(3));
    assert_eq!(d.option_nodes[0].range, SourceRange::line(4));
    assert_eq!(d.option_nodes[1].range, SourceRange::line(5));
    assert_eq!(
        d.body_nodes.iter().map(Node::range).collect::<Vec<_>>(),
        vec![SourceRange::line(7), SourceRange::line(9)]
    );
}

#[test]
fn test_nested_lines_are_absolute() {
    let source = "# Doc\n\n:::{outer}\n:class: wide\n\n```{inner}\n---\nk: v\n---\n\ninner body\n```\n:::\n";
    let doc = parse(source);
    let outer = directive(&doc.nodes[1]);
    assert_eq!(outer.range, SourceRange::new(3, 13));

    let inner = directive(&outer.body_nodes[0]);
    assert_eq!(inner.range, SourceRange::new(6, 12));
    assert_eq!(inner.option_nodes[0].range, SourceRange::line(8));
    assert_eq!(inner.body_nodes[0].range(), SourceRange::line(11));
    assert_eq!(inner.body_nodes[0].children(), &[text("inner body", 11)]);
}

#[test]
fn test_failure_is_isolated() {
    let parser = MarkdownParser::new().with_directive(Picky);
    let doc = parser.parse(
        "```{picky} one\nfirst\n```\n\n```{picky} bad\nsecond\n```\n\n```{picky} three\nthird\n```\n",
    );

    assert_eq!(doc.nodes.len(), 3);
    assert_eq!(directive(&doc.nodes[0]).body, "first");
    assert_eq!(directive(&doc.nodes[2]).body, "third");

    let error = doc.nodes[1].as_directive_error().unwrap();
    assert_eq!(error.name, "picky");
    assert_eq!(error.arg.as_deref(), Some("bad"));
    assert_eq!(error.raw_content, "second");
    assert_eq!(error.kind, DirectiveErrorKind::Validation);
    assert_eq!(error.range, SourceRange::new(5, 7));

    assert_eq!(
        doc.diagnostics,
        vec![Diagnostic::error(
            "Error parsing \"picky\" directive: argument 'bad' is not allowed",
            SourceRange::new(5, 7),
        )]
    );
}

#[test]
fn test_nested_failure_stays_inside_parent() {
    let parser = MarkdownParser::new().with_directive(Picky);
    let doc = parser.parse("````{outer}\nbefore\n\n```{picky} bad\nx\n```\n````\n");

    let outer = directive(&doc.nodes[0]);
    assert!(matches!(outer.body_nodes[0], Node::Paragraph { .. }));
    assert!(outer.body_nodes[1].as_directive_error().is_some());
    assert_eq!(doc.errors().count(), 1);
}

#[test]
fn test_nesting_limit() {
    let parser = MarkdownParser::with_config(ParserConfig::default().with_max_depth(2));
    let doc = parser.parse(":::::{a}\n::::{b}\n:::{c}\nx\n:::\n::::\n:::::\n");

    let a = directive(&doc.nodes[0]);
    let b = directive(&a.body_nodes[0]);
    let c = b.body_nodes[0].as_directive_error().unwrap();

    assert_eq!(c.name, "c");
    assert_eq!(c.kind, DirectiveErrorKind::NestingTooDeep);
    assert_eq!(c.range, SourceRange::new(3, 5));
    assert_eq!(c.raw_content, "x");
    assert_eq!(doc.errors().count(), 1);
}

#[test]
fn test_runaway_nesting_is_bounded() {
    let depth = 40;
    let mut source = String::new();
    for level in 0..depth {
        source.push_str(&":".repeat(depth + 3 - level));
        source.push_str("{box}\n");
    }
    source.push_str("core\n");
    for level in (0..depth).rev() {
        source.push_str(&":".repeat(depth + 3 - level));
        source.push('\n');
    }

    let doc = parse(&source);

    assert_eq!(doc.directives().len(), 16);
    assert_eq!(doc.errors().count(), 1);
}

#[test]
fn test_directive_in_list_item() {
    let doc = parse("- item\n\n  ```{note}\n  inside\n  ```\n");
    let Node::List { children, .. } = &doc.nodes[0] else {
        panic!("expected list, got {:?}", doc.nodes[0]);
    };
    let item = children[0].children();
    let note = directive(&item[1]);
    assert_eq!(note.body, "inside");
    assert_eq!(note.body_nodes[0].range(), SourceRange::line(4));
}

#[test]
fn test_colon_directive_in_list_item() {
    let doc = parse("- item\n\n  :::{note}\n  :class: tip\n  body\n  :::\n- second\n");
    assert_eq!(doc.nodes.len(), 1);
    let Node::List { children, .. } = &doc.nodes[0] else {
        panic!("expected list, got {:?}", doc.nodes[0]);
    };
    assert_eq!(children.len(), 2);

    let note = directive(&children[0].children()[1]);
    assert_eq!(note.range, SourceRange::new(3, 6));
    assert_eq!(note.options.get("class"), Some(&OptionValue::String("tip".to_owned())));
    assert_eq!(note.option_nodes[0].range, SourceRange::line(4));
    assert_eq!(note.body, "body");
    assert_eq!(note.body_nodes[0].range(), SourceRange::line(5));
}

#[test]
fn test_colon_directive_in_blockquote() {
    let doc = parse("> :::{note} Title\n> body\n> :::\n");
    let Node::BlockQuote { children, .. } = &doc.nodes[0] else {
        panic!("expected block quote, got {:?}", doc.nodes[0]);
    };
    let note = directive(&children[0]);
    assert_eq!(note.arg.as_deref(), Some("Title"));
    assert_eq!(note.body, "body");
    assert_eq!(note.body_nodes[0].range(), SourceRange::line(2));
}

#[test]
fn test_code_inside_colon_directive_keeps_its_colons() {
    let doc = parse(":::{outer}\n```text\n:::\n```\n:::\nafter\n");
    assert_eq!(doc.nodes.len(), 2);

    let outer = directive(&doc.nodes[0]);
    assert_eq!(outer.range, SourceRange::new(1, 5));
    assert_eq!(outer.body, "```text\n:::\n```");
    assert!(matches!(&outer.body_nodes[0], Node::Code { value, .. } if value == ":::"));
    assert_eq!(doc.nodes[1].children(), &[text("after", 6)]);
}

fn link_urls(nodes: &[Node]) -> Vec<String> {
    let mut urls = Vec::new();
    for node in nodes {
        if let Node::Link { url, .. } = node {
            urls.push(url.clone());
        }
        urls.extend(link_urls(node.children()));
    }
    urls
}

#[test]
fn test_references_resolve_around_colon_directives() {
    let doc = parse("See [docs][r].\n\n:::{note}\nAlso [r].\n:::\n\n[r]: https://example.com\n");
    assert_eq!(
        link_urls(&doc.nodes),
        vec!["https://example.com", "https://example.com"]
    );
}

#[test]
fn test_definition_like_argument_is_kept() {
    let doc = parse("```{figure} [a]: b\n```\n");
    let figure = directive(&doc.nodes[0]);
    assert_eq!(figure.arg_nodes, vec![text("[a]: b", 1)]);
}

#[test]
fn test_tilde_fence_directive() {
    let doc = parse("~~~{note}\n:a: true\n~~~\n");
    assert_eq!(
        directive(&doc.nodes[0]).options.get("a"),
        Some(&OptionValue::Boolean(true))
    );
}

#[test]
fn test_colon_fence_inside_code_block_is_code() {
    let doc = parse("```\n:::{note}\n:::\n```\n");
    assert!(matches!(doc.nodes[0], Node::Code { .. }));
    assert!(doc.directives().is_empty());
}

#[test]
fn test_html_fallbacks() {
    let parser = MarkdownParser::new().with_directive(Picky);
    let doc = parser.parse("```{other} Hi\nsome <body>\n```\n\n```{picky} bad\nraw\n```\n");

    assert_eq!(
        HtmlRenderer::new().render(&doc.nodes),
        "<aside class=\"directive-unhandled\">\n\
         <header><mark>other</mark><code> Hi</code></header>\n\
         <pre>some &lt;body&gt;</pre></aside>\n\
         <aside class=\"directive-error\">\n\
         <header><mark>picky</mark><code> bad</code></header>\n\
         <pre>validation error:\nargument &#x27;bad&#x27; is not allowed\n\n---\nraw</pre></aside>\n"
    );
}

#[test]
fn test_host_failure_becomes_error_node() {
    struct Broken;

    impl SubParser for Broken {
        fn parse_inline(
            &self,
            _text: &str,
            _ctx: ParseContext,
            _diagnostics: &mut Vec<Diagnostic>,
        ) -> Result<Vec<Node>, DirectiveError> {
            Err(DirectiveError::nested_parse("inline parser unavailable"))
        }

        fn parse_block(
            &self,
            _text: &str,
            _ctx: ParseContext,
            _diagnostics: &mut Vec<Diagnostic>,
        ) -> Result<Vec<Node>, DirectiveError> {
            Ok(Vec::new())
        }
    }

    let registry = DirectiveRegistry::new();
    let config = ParserConfig::default();
    let engine = DirectiveEngine::new(&registry, &config);
    let token = DirectiveToken {
        name: "note".to_owned(),
        arg: Some("Title".to_owned()),
        fence: RawFenceBlock {
            marker: FenceMarker::Backtick,
            info: "{note} Title".to_owned(),
            content_lines: vec!["body".to_owned()],
            range: SourceRange::new(7, 9),
        },
    };
    let mut diagnostics = Vec::new();

    let node = engine.assemble(token, &Broken, ParseContext::document(), &mut diagnostics);

    let error = node.as_directive_error().unwrap();
    assert_eq!(error.kind, DirectiveErrorKind::NestedParse);
    assert_eq!(error.message, "inline parser unavailable");
    assert_eq!(error.range, SourceRange::new(7, 9));
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_config_file_drives_parser() {
    let config = quill_config::Config::from_toml_str("[parser]\ncolon_fences = false\n").unwrap();
    let parser = MarkdownParser::with_config(config.parser);
    let doc = parser.parse(":::{note}\nbody\n:::\n");
    assert!(doc.directives().is_empty());
}

#[test]
fn test_parallel_parsing() {
    let parser = MarkdownParser::new().with_directive(Picky);
    let sources: Vec<String> = (0..4)
        .map(|i| format!("```{{picky}} doc{i}\nbody {i}\n```\n"))
        .collect();
    let parser = &parser;

    let bodies: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| scope.spawn(move || parser.parse(source)))
            .collect();
        handles
            .into_iter()
            .map(|handle| directive(&handle.join().unwrap().nodes[0]).body.clone())
            .collect()
    });

    assert_eq!(bodies, vec!["body 0", "body 1", "body 2", "body 3"]);
}

#[cfg(feature = "serde")]
#[test]
fn test_serialize_document() {
    let doc = parse("```{d} arg\n:a: 1\nbody\n```\n");
    let json = serde_json::to_value(&doc).unwrap();

    assert_eq!(json["nodes"][0]["type"], "directive");
    assert_eq!(json["nodes"][0]["name"], "d");
    assert_eq!(json["nodes"][0]["options"]["a"], 1.0);
    assert_eq!(json["nodes"][0]["range"]["start_line"], 1);
    assert_eq!(json["diagnostics"], serde_json::json!([]));
}
