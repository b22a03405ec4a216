//! Parser tests: tree shape, transitions, code constructs, error recovery,
//! lossless round-trips, and the 100-iteration determinism test.

use stencil_parser::ParseResult;
use stencil_types::{DirectiveRegistry, ErrorCode, FileKind, SourceFile, SyntaxKind, TokenKind};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse_as(source: &str, kind: FileKind) -> ParseResult {
    let sf = SourceFile::new("test.stencil", source);
    let registry = DirectiveRegistry::with_defaults();
    stencil_parser::parse(&sf, kind, &registry)
}

fn parse(source: &str) -> ParseResult {
    parse_as(source, FileKind::Component)
}

fn codes(source: &str) -> Vec<ErrorCode> {
    parse(source).errors.iter().map(|d| d.code).collect()
}

fn parse_ok(source: &str) -> ParseResult {
    let result = parse(source);
    let errors: Vec<_> = result.errors.iter().map(|d| d.message.clone()).collect();
    assert!(errors.is_empty(), "unexpected errors for {source:?}: {errors:?}");
    result
}

/// Full text of every node of `kind`, trimmed.
fn texts_of(source: &str, kind: SyntaxKind) -> Vec<String> {
    let tree = parse(source).tree;
    tree.find_all(kind)
        .into_iter()
        .map(|n| tree.node_text(n).trim().to_string())
        .collect()
}

fn count(source: &str, kind: SyntaxKind) -> usize {
    parse(source).tree.find_all(kind).len()
}

// ─────────────────────────────────────────────────────────────────────
// Markup
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_element_with_expression() {
    let result = parse_ok("<p>Hello @name!</p>");
    let tree = &result.tree;
    let element = tree.find_all(SyntaxKind::MarkupElement)[0];
    let kids: Vec<_> = tree.child_nodes(element).map(|n| tree.kind(n)).collect();
    assert_eq!(
        kids,
        vec![
            SyntaxKind::MarkupStartTag,
            SyntaxKind::ImplicitExpression,
            SyntaxKind::MarkupEndTag
        ]
    );
    let texts: Vec<_> = tree.child_tokens(element).map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello ", "!"]);
}

#[test]
fn test_nested_and_void_elements() {
    let source = "<ul><li>a<br>b</li><li><input type=\"text\"></li></ul>";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 5);
    assert_eq!(count(source, SyntaxKind::MarkupEndTag), 3);
}

#[test]
fn test_self_closing_component() {
    let source = "<Counter IncrementAmount=\"5\" />";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::MarkupEndTag), 0);
    assert_eq!(texts_of(source, SyntaxKind::AttributeValue), vec!["\"5\""]);
}

#[test]
fn test_attribute_forms() {
    let source = "<input disabled value=@x name='n' id=plain>";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::MarkupAttribute), 4);
    assert_eq!(
        texts_of(source, SyntaxKind::AttributeValue),
        vec!["@x", "'n'", "plain"]
    );
}

#[test]
fn test_attribute_value_with_expressions() {
    let source = "<a href=\"/items/@item.Id/edit\" class=\"@(active ? \"on\" : \"off\")\">x</a>";
    parse_ok(source);
    assert_eq!(
        texts_of(source, SyntaxKind::ImplicitExpression),
        vec!["@item.Id"]
    );
    assert_eq!(count(source, SyntaxKind::ExplicitExpression), 1);
}

#[test]
fn test_directive_attributes_in_components() {
    let result = parse_ok("<input @bind-Value=\"name\" @onclick=\"Save\" />");
    let names: Vec<_> = result
        .tree
        .tokens()
        .into_iter()
        .filter(|t| t.kind == TokenKind::Name)
        .map(|t| t.text.clone())
        .collect();
    assert_eq!(names, vec!["input", "@bind-Value", "@onclick"]);
}

#[test]
fn test_dynamic_attributes_in_templates() {
    let result = parse_as("<div @attrs></div>", FileKind::Template);
    assert!(result.errors.is_empty());
    assert_eq!(result.tree.find_all(SyntaxKind::ImplicitExpression).len(), 1);
}

#[test]
fn test_comments_and_escapes() {
    let source = "<!-- html -->@* razor *@a@@b";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::MarkupComment), 1);
    assert_eq!(count(source, SyntaxKind::RazorComment), 1);
    assert_eq!(count(source, SyntaxKind::EscapedTransition), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_implicit_expression_boundaries() {
    assert_eq!(
        texts_of("@user.Name.", SyntaxKind::ImplicitExpression),
        vec!["@user.Name"]
    );
    assert_eq!(
        texts_of("@items[0].Format(\"x\") tail", SyntaxKind::ImplicitExpression),
        vec!["@items[0].Format(\"x\")"]
    );
    assert_eq!(
        texts_of("<p>@count items</p>", SyntaxKind::ImplicitExpression),
        vec!["@count"]
    );
}

#[test]
fn test_email_is_not_an_expression() {
    assert_eq!(count("write to me@example.com", SyntaxKind::ImplicitExpression), 0);
}

#[test]
fn test_explicit_expression() {
    assert_eq!(
        texts_of("<p>@(a + (b * c))!</p>", SyntaxKind::ExplicitExpression),
        vec!["@(a + (b * c))"]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Code
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_code_block_with_markup() {
    let source = "@{ var x = 1; <p>@x</p> }";
    let result = parse_ok(source);
    let tree = &result.tree;
    let block = tree.find_all(SyntaxKind::CodeBlock)[0];
    let element = tree.find_all(SyntaxKind::MarkupElement)[0];
    assert_eq!(tree.parent(element), Some(block));
    assert_eq!(tree.find_all(SyntaxKind::ImplicitExpression).len(), 1);
}

#[test]
fn test_comparison_is_not_markup() {
    let source = "@{ var ok = a <b; }";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 0);
}

#[test]
fn test_if_else_chain() {
    let source = "@if (a) { <b>x</b> } else if (b) { <i>y</i> } else { <u>z</u> }\n<p>after</p>";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::ControlStatement), 1);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 4);
    let tree = parse(source).tree;
    let statement = tree.find_all(SyntaxKind::ControlStatement)[0];
    let after = tree.find_all(SyntaxKind::MarkupElement)[3];
    assert_eq!(tree.parent(after), Some(tree.root()));
    assert!(!tree.node_text(statement).contains("after"));
}

#[test]
fn test_foreach_across_lines() {
    let source = "<ul>\n@foreach (var item in items)\n{\n    <li>@item</li>\n}\n</ul>";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::ControlStatement), 1);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 2);
}

#[test]
fn test_try_catch_finally_and_switch() {
    parse_ok("@try { A(); } catch (Exception e) { <p>@e.Message</p> } finally { B(); }");
    let source = "@switch (n) { case 1: <p>one</p> break; default: <p>many</p> break; }";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 2);
}

#[test]
fn test_using_statement_versus_directive() {
    assert_eq!(count("@using (var s = Open()) { }", SyntaxKind::ControlStatement), 1);
    assert_eq!(count("@using System.Text\n", SyntaxKind::Directive), 1);
}

#[test]
fn test_markup_line() {
    let source = "@{\n    @:Hello @name\n}";
    parse_ok(source);
    assert_eq!(texts_of(source, SyntaxKind::MarkupLine), vec!["@:Hello @name"]);
}

#[test]
fn test_templates() {
    let source = "@{ RenderFragment f = @<p>hi</p>; }";
    let result = parse_ok(source);
    let tree = &result.tree;
    let template = tree.find_all(SyntaxKind::Template)[0];
    assert_eq!(tree.kind(tree.parent(template).unwrap_or(tree.root())), SyntaxKind::CodeBlock);
    assert_eq!(tree.node_text(template).trim(), "@<p>hi</p>");
}

#[test]
fn test_template_in_markup_parses() {
    // Placement rules are checked after lowering; the parser accepts it.
    assert_eq!(count("<div>@<p>x</p></div>", SyntaxKind::Template), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Directives
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_directive_tokens() {
    let source = "@page \"/counter\"\n@using System.Linq;\n@inject Dictionary<string, int> Map\n<p>x</p>";
    parse_ok(source);
    assert_eq!(count(source, SyntaxKind::Directive), 3);
    assert_eq!(
        texts_of(source, SyntaxKind::DirectiveToken),
        vec!["\"/counter\"", "System.Linq", "Dictionary<string, int>", "Map"]
    );
}

#[test]
fn test_code_directive_block() {
    let source = "@code {\n    int count;\n    void Up() { count++; }\n}\n";
    let result = parse_ok(source);
    let directive = result.tree.find_all(SyntaxKind::Directive)[0];
    assert!(result.tree.node_text(directive).ends_with('}'));
}

#[test]
fn test_directive_errors() {
    assert_eq!(codes("@page\n<p>x</p>"), vec![ErrorCode::DIRECTIVE_TOKEN_MISSING]);
    assert_eq!(
        codes("@inherits Base extra stuff\n"),
        vec![ErrorCode::UNEXPECTED_DIRECTIVE_CONTENT]
    );
    assert_eq!(codes("@code\n<p>x</p>"), vec![ErrorCode::DIRECTIVE_BLOCK_MISSING]);
}

#[test]
fn test_unknown_directive() {
    let source = "@model Foo.Bar\n<p>x</p>";
    assert_eq!(codes(source), vec![ErrorCode::UNKNOWN_DIRECTIVE]);
    assert_eq!(count(source, SyntaxKind::Directive), 1);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_end_tag_closes_implicitly() {
    let source = "<div><p>text</div><span>ok</span>";
    assert_eq!(codes(source), vec![ErrorCode::MISSING_END_TAG]);
    let result = parse(source);
    let p = result.tree.find_all(SyntaxKind::MarkupElement)[1];
    assert_eq!(result.tree.node(p).diagnostics.len(), 1);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 3);
}

#[test]
fn test_unclosed_element_at_end() {
    assert_eq!(codes("<section>text"), vec![ErrorCode::MISSING_END_TAG]);
}

#[test]
fn test_stray_end_tag() {
    assert_eq!(codes("<p>a</b>c</p>"), vec![ErrorCode::UNEXPECTED_END_TAG]);
    assert_eq!(codes("</x>"), vec![ErrorCode::UNEXPECTED_END_TAG]);
    assert_eq!(count("</x>", SyntaxKind::Error), 1);
}

#[test]
fn test_unclosed_code_block() {
    assert_eq!(codes("@{ var x = 1;"), vec![ErrorCode::UNCLOSED_BLOCK]);
    assert_eq!(codes("@(a + b"), vec![ErrorCode::UNCLOSED_BLOCK]);
}

#[test]
fn test_unclosed_paren_inside_block_recovers() {
    let source = "@{ Call(1; }<p>x</p>";
    assert_eq!(codes(source), vec![ErrorCode::UNCLOSED_BLOCK]);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 1);
}

#[test]
fn test_unterminated_string_in_code() {
    assert!(codes("@{ var s = \"abc\n}").contains(&ErrorCode::UNTERMINATED_STRING));
}

#[test]
fn test_invalid_transition() {
    let result = parse("a @ b");
    assert_eq!(
        result.errors.iter().map(|d| d.code).collect::<Vec<_>>(),
        vec![ErrorCode::INVALID_TRANSITION]
    );
    assert!(result.errors.iter().any(|d| d.message.contains("whitespace")));
    assert_eq!(codes("end @"), vec![ErrorCode::INVALID_TRANSITION]);
}

#[test]
fn test_unclosed_attribute_value() {
    let found = codes("<a href=\"x");
    assert!(found.contains(&ErrorCode::UNCLOSED_ATTRIBUTE_VALUE));
    assert!(found.contains(&ErrorCode::UNEXPECTED_TOKEN));
}

#[test]
fn test_missing_close_angle() {
    let source = "<div <p>x</p>";
    assert_eq!(codes(source), vec![ErrorCode::UNEXPECTED_TOKEN]);
    assert_eq!(count(source, SyntaxKind::MarkupElement), 2);
}

#[test]
fn test_control_statement_missing_parts() {
    assert_eq!(codes("@if x"), vec![ErrorCode::UNEXPECTED_TOKEN, ErrorCode::UNEXPECTED_TOKEN]);
}

#[test]
fn test_missing_tokens_are_zero_width() {
    let result = parse("@{ a(");
    let missing: Vec<_> = result
        .tree
        .tokens()
        .into_iter()
        .filter(|t| t.kind == TokenKind::Missing)
        .collect();
    assert_eq!(missing.len(), 2);
    assert!(missing.iter().all(|t| t.text.is_empty() && t.span.is_empty()));
}

// ─────────────────────────────────────────────────────────────────────
// Losslessness and queries
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_round_trip_well_formed_and_malformed() {
    let sources = [
        "",
        "plain text",
        "@page \"/x\"\r\n<h1 class='t'>Hi @name</h1>\r\n@code { int n; }\r\n",
        "<div><p>text</div>",
        "@{ var s = \"open\n}",
        "<a href=\"x",
        "@if (a) { <b>x</b> } else {",
        "@inherits Base junk  \n@model X\n",
        "@{ @:line @x\n  RenderFragment f = @<i>t</i>; }",
        "<div <p>@(a[0]</p>",
        "@code\n<p>",
        "a @ b @* c",
        "</x>@",
    ];
    for source in sources {
        for kind in [FileKind::Component, FileKind::Template] {
            assert_eq!(parse_as(source, kind).tree.text(), source, "source {source:?}");
        }
    }
}

#[test]
fn test_token_at_offset() {
    let source = "<p>@count</p>";
    let tree = parse(source).tree;
    let tok = tree.token_at_offset(5).map(|t| t.text.clone());
    assert_eq!(tok.as_deref(), Some("count"));
    let node = tree.node_at_offset(5);
    assert_eq!(tree.kind(node), SyntaxKind::ImplicitExpression);
}

#[test]
fn test_diagnostics_point_at_source() {
    let result = parse("<p>\n  </b></p>");
    let d = &result.errors.errors[0];
    assert_eq!(d.code, ErrorCode::UNEXPECTED_END_TAG);
    assert_eq!(d.span.start_line, 2);
    assert_eq!(d.span.start_col, 3);
}

// ─────────────────────────────────────────────────────────────────────
// 100-iteration determinism test
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_parser_determinism_100_iterations() {
    let source = "@page \"/c\"\n<div>@if (x) { <p>@y</p> }</span>\n@code { int y; }";
    let first = parse(source);
    for i in 0..100 {
        let again = parse(source);
        assert_eq!(first.tree, again.tree, "Determinism failure at iteration {i}");
        assert_eq!(first.errors, again.errors, "Determinism failure at iteration {i}");
    }
}
