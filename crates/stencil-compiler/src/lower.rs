//! Lowering: from the lossless syntax tree to the IR.
//!
//! Lowering is purely structural. It builds the document boilerplate
//! (namespace, usings, class, render method), turns markup into `Html*`
//! nodes and code into `CSharp*` nodes whose `CodeFragment` leaves are
//! verbatim source slices, and records where each template sits. It knows
//! nothing about components; binding is a later pass.
//!
//! Every syntax diagnostic is moved onto the IR node lowered from the
//! nearest syntax ancestor that has one, or onto the document root.

use stencil_types::descriptor::builtin;
use stencil_types::ir::{ClassAttribute, DirectiveTokenValue, TemplateSlot};
use stencil_types::syntax::SyntaxElement;
use stencil_types::{
    DirectiveDescriptor, DirectiveKind, DirectiveRegistry, DirectiveTokenKind, DocumentShape,
    FileKind, IrDocument, IrKind, IrNodeId, NodeId, SourceFile, Span, SyntaxKind, SyntaxTree,
    TokenKind,
};
use tracing::debug;

use crate::classify::{classify, directive_name};

/// Namespace used when neither `@namespace` nor the configuration names one.
pub const DEFAULT_ROOT_NAMESPACE: &str = "Stencil.Generated";

/// Lower a parsed document under the default root namespace.
pub fn lower(
    tree: &SyntaxTree,
    source: &SourceFile,
    kind: FileKind,
    registry: &DirectiveRegistry,
) -> IrDocument {
    lower_in_namespace(tree, source, kind, registry, DEFAULT_ROOT_NAMESPACE)
}

/// Lower a parsed document. Without `@namespace`, the class lands in
/// `root_namespace` extended by the file's directory segments.
pub fn lower_in_namespace(
    tree: &SyntaxTree,
    source: &SourceFile,
    kind: FileKind,
    registry: &DirectiveRegistry,
    root_namespace: &str,
) -> IrDocument {
    let shape = classify(tree, kind);
    let mut lowerer = Lowerer {
        tree,
        source,
        ir: IrDocument::new(source.name.clone(), shape),
        lowered: vec![None; tree.len()],
    };
    let directives = lowerer.collect_directives(registry);
    lowerer.build(&directives, root_namespace);
    lowerer.place_syntax_diagnostics();
    debug!(
        file = %source.name,
        shape = ?shape,
        directives = directives.len(),
        nodes = lowerer.ir.len(),
        "lowered document"
    );
    lowerer.ir
}

/// Replace every character that cannot appear in an identifier with `_`.
pub fn sanitize_identifier(text: &str) -> String {
    let mut out: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

// ══════════════════════════════════════════════════════════════════════════════
// Lowerer
// ══════════════════════════════════════════════════════════════════════════════

/// One directive occurrence, decoded against its descriptor.
struct LoweredDirective<'t> {
    node: NodeId,
    name: String,
    tokens: Vec<DirectiveTokenValue>,
    /// Elements between the braces of a code-block directive.
    body: Option<&'t [SyntaxElement]>,
}

struct Lowerer<'a> {
    tree: &'a SyntaxTree,
    source: &'a SourceFile,
    ir: IrDocument,
    /// IR node lowered from each syntax node, by syntax node index.
    lowered: Vec<Option<IrNodeId>>,
}

/// Adjacent markup text merged into one node.
#[derive(Default)]
struct TextRun {
    text: String,
    span: Option<Span>,
}

impl TextRun {
    fn push(&mut self, text: &str, span: Span) {
        self.text.push_str(text);
        self.span = Some(self.span.map_or(span, |s| s.merge(span)));
    }

    fn take(&mut self) -> Option<(String, Span)> {
        let span = self.span.take()?;
        Some((std::mem::take(&mut self.text), span))
    }
}

impl<'a> Lowerer<'a> {
    // ── Boilerplate ───────────────────────────────────────────────────────────

    fn build(&mut self, directives: &[LoweredDirective<'a>], root_namespace: &str) {
        let tree = self.tree;
        let root = self.ir.root();
        self.lowered[tree.root().index()] = Some(root);

        let name = self.namespace_name(directives, root_namespace);
        let namespace = self.ir.add(root, IrKind::Namespace { name }, None);
        for directive in directives.iter().filter(|d| d.name == builtin::USING) {
            if let Some(token) = directive.tokens.first().filter(|t| !t.is_missing()) {
                let using = IrKind::Using {
                    namespace: token.text.clone(),
                };
                self.ir.add(namespace, using, Some(token.span));
            }
        }

        let class_kind = self.class_kind(directives);
        let class = self.ir.add(namespace, class_kind, None);
        for directive in directives {
            let span = self.content_span(directive.node);
            let kind = IrKind::Directive {
                name: directive.name.clone(),
                tokens: directive.tokens.clone(),
            };
            let id = self.ir.add(class, kind, Some(span));
            self.lowered[directive.node.index()] = Some(id);
            if let Some(body) = directive.body {
                let code_span = self.elements_span(body).unwrap_or(span);
                let code = self.ir.add(id, IrKind::CSharpCode, Some(code_span));
                self.lower_code(body, code);
            }
        }

        let method = self.ir.add(class, IrKind::Method, None);
        self.lower_content(tree.children(tree.root()), method);
    }

    fn namespace_name(&self, directives: &[LoweredDirective<'a>], root_namespace: &str) -> String {
        let declared = directives
            .iter()
            .filter(|d| d.name == builtin::NAMESPACE)
            .find_map(|d| d.tokens.first().filter(|t| !t.is_missing()));
        if let Some(token) = declared {
            return token.text.clone();
        }
        let mut parts: Vec<String> = root_namespace
            .split('.')
            .filter(|p| !p.trim().is_empty())
            .map(|p| p.trim().to_string())
            .collect();
        parts.extend(self.source.directories().into_iter().map(sanitize_identifier));
        if parts.is_empty() {
            DEFAULT_ROOT_NAMESPACE.to_string()
        } else {
            parts.join(".")
        }
    }

    fn class_kind(&self, directives: &[LoweredDirective<'a>]) -> IrKind {
        let mut type_parameters: Vec<String> = Vec::new();
        let mut base_type = None;
        let mut interfaces = Vec::new();
        let mut attributes = Vec::new();
        let mut layout = false;

        for directive in directives {
            let Some(token) = directive.tokens.first().filter(|t| !t.is_missing()) else {
                continue;
            };
            match directive.name.as_str() {
                builtin::TYPEPARAM => {
                    if !type_parameters.contains(&token.text) {
                        type_parameters.push(token.text.clone());
                    }
                }
                builtin::INHERITS if base_type.is_none() => base_type = Some(token.text.clone()),
                builtin::IMPLEMENTS => interfaces.push(token.text.clone()),
                builtin::PAGE => attributes.push(ClassAttribute::Route(token.unquoted().to_string())),
                builtin::LAYOUT if !layout => {
                    layout = true;
                    attributes.push(ClassAttribute::Layout(token.text.clone()));
                }
                _ => {}
            }
        }

        IrKind::Class {
            name: sanitize_identifier(self.source.stem()),
            type_parameters,
            base_type,
            interfaces,
            attributes,
        }
    }

    // ── Directives ────────────────────────────────────────────────────────────

    fn collect_directives(&self, registry: &DirectiveRegistry) -> Vec<LoweredDirective<'a>> {
        let tree = self.tree;
        tree.find_all(SyntaxKind::Directive)
            .into_iter()
            .filter_map(|node| {
                let name = directive_name(tree, node)?.to_string();
                let descriptor = registry.get(&name);
                let tokens = descriptor
                    .map(|d| self.directive_tokens(node, d))
                    .unwrap_or_default();
                let body = match descriptor {
                    Some(d) if d.kind == DirectiveKind::CodeBlock => braced_body(tree.children(node)),
                    _ => None,
                };
                Some(LoweredDirective {
                    node,
                    name,
                    tokens,
                    body,
                })
            })
            .collect()
    }

    /// Pair the directive's token nodes with the descriptor's token list.
    /// Absent optional tokens leave no node behind, so an optional slot is
    /// skipped when the next node does not have its shape.
    fn directive_tokens(&self, node: NodeId, descriptor: &DirectiveDescriptor) -> Vec<DirectiveTokenValue> {
        let tree = self.tree;
        let mut nodes = tree
            .child_nodes(node)
            .filter(|&n| tree.kind(n) == SyntaxKind::DirectiveToken)
            .peekable();
        let mut values = Vec::new();
        for expected in &descriptor.tokens {
            let Some(&next) = nodes.peek() else {
                break;
            };
            let value = self.token_value(next, expected.kind);
            if expected.optional && !fits(expected.kind, &value.text) {
                continue;
            }
            nodes.next();
            values.push(value);
        }
        values
    }

    fn token_value(&self, node: NodeId, kind: DirectiveTokenKind) -> DirectiveTokenValue {
        let tokens = self.tree.node_tokens(node);
        let mut text_tokens = tokens.iter().filter(|t| !t.kind.is_zero_width());
        let first = text_tokens.next();
        let last = text_tokens.last().or(first);
        if let (Some(first), Some(last)) = (first, last) {
            let start = first.span.offset;
            let span = self.source.span(start, last.span.end_offset() - start);
            return DirectiveTokenValue {
                kind,
                text: self.source.slice(span).to_string(),
                span,
            };
        }
        let at = tokens.first().map_or_else(|| self.tree.node_span(node), |t| t.span);
        DirectiveTokenValue {
            kind,
            text: String::new(),
            span: Span::point(at.offset, at.start_line, at.start_col),
        }
    }

    // ── Markup ────────────────────────────────────────────────────────────────

    /// Markup content: text, elements, and transitions.
    fn lower_content(&mut self, elements: &'a [SyntaxElement], parent: IrNodeId) {
        let tree = self.tree;
        let mut run = TextRun::default();
        for element in elements {
            match element {
                SyntaxElement::Token(token) => {
                    if !token.kind.is_zero_width() && token.kind != TokenKind::MarkupLineTransition {
                        run.push(&token.full_text(), token.full_span());
                    }
                }
                SyntaxElement::Node(node) => match tree.kind(*node) {
                    SyntaxKind::EscapedTransition => run.push("@", self.content_span(*node)),
                    SyntaxKind::RazorComment | SyntaxKind::Directive => {}
                    SyntaxKind::MarkupComment => {
                        if self.ir.shape() != DocumentShape::Component {
                            run.push(&tree.node_text(*node), self.content_span(*node));
                        }
                    }
                    _ => {
                        self.flush_text(&mut run, parent, false);
                        self.lower_node(*node, parent);
                    }
                },
            }
        }
        self.flush_text(&mut run, parent, false);
    }

    fn flush_text(&mut self, run: &mut TextRun, parent: IrNodeId, attribute_value: bool) {
        let Some((text, span)) = run.take() else {
            return;
        };
        let kind = if attribute_value {
            IrKind::HtmlAttributeValue { text }
        } else {
            IrKind::HtmlContent { text }
        };
        self.ir.add(parent, kind, Some(span));
    }

    fn lower_node(&mut self, node: NodeId, parent: IrNodeId) {
        let tree = self.tree;
        match tree.kind(node) {
            SyntaxKind::MarkupElement => self.lower_element(node, parent),
            SyntaxKind::ImplicitExpression | SyntaxKind::ExplicitExpression => {
                self.lower_expression(node, parent)
            }
            SyntaxKind::CodeBlock => {
                let id = self.add_lowered(node, parent, IrKind::CSharpCode);
                if let Some(body) = braced_body(tree.children(node)) {
                    self.lower_code(body, id);
                }
            }
            SyntaxKind::ControlStatement => {
                let id = self.add_lowered(node, parent, IrKind::CSharpCode);
                // Everything after the `@` is statement code.
                self.lower_code(tree.children(node).get(1..).unwrap_or(&[]), id);
            }
            SyntaxKind::Template => self.lower_template(node, parent),
            SyntaxKind::MarkupLine => self.lower_content(tree.children(node), parent),
            SyntaxKind::Error => {
                let text = tree.node_text(node);
                self.add_lowered(node, parent, IrKind::Malformed { text });
            }
            SyntaxKind::EscapedTransition => {
                let span = self.content_span(node);
                self.ir.add(parent, IrKind::HtmlContent { text: "@".into() }, Some(span));
            }
            _ => {}
        }
    }

    fn lower_element(&mut self, node: NodeId, parent: IrNodeId) {
        let tree = self.tree;
        let children = tree.children(node);
        let Some(start_tag) = tree
            .child_nodes(node)
            .find(|&n| tree.kind(n) == SyntaxKind::MarkupStartTag)
        else {
            return;
        };
        let tag = tree
            .child_tokens(start_tag)
            .find(|t| t.kind == TokenKind::Name)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        let self_closing = tree
            .child_tokens(start_tag)
            .any(|t| t.kind == TokenKind::SlashCloseAngle);

        // `<text>` only groups markup inside code; the tag itself is not emitted.
        let transparent = tag == "text" && matches!(self.ir.kind(parent), IrKind::CSharpCode);
        let target = if transparent {
            parent
        } else {
            let id = self.add_lowered(node, parent, IrKind::HtmlElement { tag, self_closing });
            for attribute in tree
                .child_nodes(start_tag)
                .filter(|&n| tree.kind(n) == SyntaxKind::MarkupAttribute)
            {
                self.lower_attribute(attribute, id);
            }
            id
        };
        self.lower_content(element_content(tree, children), target);
    }

    fn lower_attribute(&mut self, node: NodeId, element: IrNodeId) {
        let tree = self.tree;
        let children = tree.children(node);
        let name = children.iter().find_map(|c| match c {
            SyntaxElement::Token(t) if t.kind == TokenKind::Name => Some(t.text.clone()),
            _ => None,
        });

        let Some(name) = name else {
            // `<div @attributes>` in a template file: the expression writes
            // the whole attribute.
            let id = self.add_lowered(
                node,
                element,
                IrKind::HtmlAttribute {
                    name: String::new(),
                    minimized: false,
                },
            );
            for child in tree.child_nodes(node) {
                self.lower_node(child, id);
            }
            return;
        };

        let minimized = !children
            .iter()
            .any(|c| matches!(c, SyntaxElement::Token(t) if t.kind == TokenKind::Equals));
        let id = self.add_lowered(node, element, IrKind::HtmlAttribute { name, minimized });
        if let Some(value) = tree
            .child_nodes(node)
            .find(|&n| tree.kind(n) == SyntaxKind::AttributeValue)
        {
            self.lowered[value.index()] = Some(id);
            self.lower_attribute_value(tree.children(value), id);
        }
    }

    fn lower_attribute_value(&mut self, elements: &'a [SyntaxElement], attribute: IrNodeId) {
        let tree = self.tree;
        let mut run = TextRun::default();
        for element in elements {
            match element {
                SyntaxElement::Token(token) => match token.kind {
                    TokenKind::DoubleQuote | TokenKind::SingleQuote => {}
                    kind if kind.is_zero_width() => {}
                    _ => run.push(&token.full_text(), token.full_span()),
                },
                SyntaxElement::Node(node) => match tree.kind(*node) {
                    SyntaxKind::EscapedTransition => run.push("@", self.content_span(*node)),
                    SyntaxKind::RazorComment => {}
                    _ => {
                        self.flush_text(&mut run, attribute, true);
                        self.lower_node(*node, attribute);
                    }
                },
            }
        }
        self.flush_text(&mut run, attribute, true);
    }

    // ── Code ──────────────────────────────────────────────────────────────────

    fn lower_expression(&mut self, node: NodeId, parent: IrNodeId) {
        let tree = self.tree;
        let explicit = tree.kind(node) == SyntaxKind::ExplicitExpression;
        let id = self.add_lowered(node, parent, IrKind::CSharpExpression { explicit });
        let children = tree.children(node);
        let body = if explicit {
            paren_body(children)
        } else {
            children.get(1..).unwrap_or(&[])
        };
        self.lower_code(body, id);
    }

    /// Code interleaved with markup. Contiguous code becomes one verbatim
    /// fragment; markup, templates, and malformed regions split fragments.
    fn lower_code(&mut self, elements: &'a [SyntaxElement], parent: IrNodeId) {
        let tree = self.tree;
        let mut pending: Option<(usize, usize)> = None;
        for element in elements {
            match element {
                SyntaxElement::Token(token) => {
                    let span = token.full_span();
                    if !span.is_empty() {
                        extend(&mut pending, span);
                    }
                }
                SyntaxElement::Node(node) => match tree.kind(*node) {
                    SyntaxKind::MarkupElement
                    | SyntaxKind::MarkupLine
                    | SyntaxKind::Template
                    | SyntaxKind::Error => {
                        self.flush_fragment(&mut pending, parent);
                        self.lower_node(*node, parent);
                    }
                    SyntaxKind::RazorComment => self.flush_fragment(&mut pending, parent),
                    _ => {
                        let span = tree.node_span(*node);
                        if !span.is_empty() {
                            extend(&mut pending, span);
                        }
                    }
                },
            }
        }
        self.flush_fragment(&mut pending, parent);
    }

    fn flush_fragment(&mut self, pending: &mut Option<(usize, usize)>, parent: IrNodeId) {
        let Some((start, end)) = pending.take() else {
            return;
        };
        if end <= start {
            return;
        }
        let span = self.source.span(start, end - start);
        let text = self.source.slice(span).to_string();
        self.ir.add(parent, IrKind::CodeFragment { text }, Some(span));
    }

    fn lower_template(&mut self, node: NodeId, parent: IrNodeId) {
        let tree = self.tree;
        let slot = template_slot(tree, node);
        let id = self.add_lowered(node, parent, IrKind::Template { slot });
        for child in tree.child_nodes(node) {
            self.lower_node(child, id);
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn add_lowered(&mut self, node: NodeId, parent: IrNodeId, kind: IrKind) -> IrNodeId {
        let span = self.content_span(node);
        let id = self.ir.add(parent, kind, Some(span));
        self.lowered[node.index()] = Some(id);
        id
    }

    /// Node span without the leading trivia of its first token.
    fn content_span(&self, node: NodeId) -> Span {
        let full = self.tree.node_span(node);
        let start = self
            .tree
            .node_tokens(node)
            .into_iter()
            .find(|t| !t.kind.is_zero_width())
            .map_or(full.offset, |t| t.span.offset);
        let end = full.end_offset().max(start);
        self.source.span(start, end - start)
    }

    fn elements_span(&self, elements: &[SyntaxElement]) -> Option<Span> {
        elements
            .iter()
            .map(|e| match e {
                SyntaxElement::Token(t) => t.full_span(),
                SyntaxElement::Node(n) => self.tree.node_span(*n),
            })
            .filter(|s| !s.is_empty())
            .reduce(Span::merge)
    }

    fn place_syntax_diagnostics(&mut self) {
        let tree = self.tree;
        let root = self.ir.root();
        for node in tree.descendants(tree.root()) {
            let diagnostics = &tree.node(node).diagnostics;
            if diagnostics.is_empty() {
                continue;
            }
            let target = std::iter::once(node)
                .chain(tree.ancestors(node))
                .find_map(|n| self.lowered[n.index()])
                .unwrap_or(root);
            for diagnostic in diagnostics {
                self.ir.attach(target, diagnostic.clone());
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Syntax Shapes
// ══════════════════════════════════════════════════════════════════════════════

fn is_node(tree: &SyntaxTree, element: &SyntaxElement, kind: SyntaxKind) -> bool {
    matches!(element, SyntaxElement::Node(n) if tree.kind(*n) == kind)
}

fn is_token(element: &SyntaxElement, kinds: &[TokenKind]) -> bool {
    matches!(element, SyntaxElement::Token(t) if kinds.contains(&t.kind))
}

/// Element children between the start tag and the end tag.
fn element_content<'t>(tree: &SyntaxTree, children: &'t [SyntaxElement]) -> &'t [SyntaxElement] {
    let start = children
        .iter()
        .position(|c| is_node(tree, c, SyntaxKind::MarkupStartTag))
        .map_or(0, |i| i + 1);
    let end = match children.last() {
        Some(last) if is_node(tree, last, SyntaxKind::MarkupEndTag) => children.len() - 1,
        _ => children.len(),
    };
    children.get(start..end.max(start)).unwrap_or(&[])
}

/// Elements after the first `{`, without the closing `}` (or the missing
/// token recovery put in its place).
fn braced_body(children: &[SyntaxElement]) -> Option<&[SyntaxElement]> {
    let open = children.iter().position(|c| is_token(c, &[TokenKind::LBrace]))?;
    let body = children.get(open + 1..)?;
    match body.split_last() {
        Some((last, rest)) if is_token(last, &[TokenKind::RBrace, TokenKind::Missing]) => Some(rest),
        _ => Some(body),
    }
}

/// Elements inside `@( ... )`. When the closing `)` is missing, only the
/// recovery tokens are dropped.
fn paren_body(children: &[SyntaxElement]) -> &[SyntaxElement] {
    let start = children
        .iter()
        .position(|c| is_token(c, &[TokenKind::LParen]))
        .map_or(children.len(), |i| i + 1);
    let mut end = children.len();
    if children.last().is_some_and(|c| is_token(c, &[TokenKind::RParen])) {
        end -= 1;
    } else {
        while end > start && is_token(&children[end - 1], &[TokenKind::Missing]) {
            end -= 1;
        }
    }
    children.get(start..end.max(start)).unwrap_or(&[])
}

fn extend(pending: &mut Option<(usize, usize)>, span: Span) {
    *pending = Some(match *pending {
        Some((start, _)) => (start, span.end_offset()),
        None => (span.offset, span.end_offset()),
    });
}

/// Whether an optional directive token's text has the shape of `kind`.
fn fits(kind: DirectiveTokenKind, text: &str) -> bool {
    let ident = |c: char| c.is_alphabetic() || c == '_';
    let first = text.chars().next();
    match kind {
        DirectiveTokenKind::String => matches!(first, Some('"' | '@')),
        DirectiveTokenKind::Type => first.is_some_and(|c| c == '(' || ident(c)),
        DirectiveTokenKind::Namespace | DirectiveTokenKind::Member => first.is_some_and(ident),
    }
}

/// Where a template sits. Attribute context wins over an explicit
/// expression, which wins over nesting; otherwise the nearest enclosing
/// construct decides between code and markup.
fn template_slot(tree: &SyntaxTree, node: NodeId) -> TemplateSlot {
    let mut attribute = false;
    let mut explicit = false;
    let mut nested = false;
    let mut context = None;
    for ancestor in tree.ancestors(node) {
        let kind = tree.kind(ancestor);
        if kind == SyntaxKind::Template {
            nested = true;
            break;
        }
        match kind {
            SyntaxKind::AttributeValue | SyntaxKind::MarkupAttribute => attribute = true,
            SyntaxKind::ExplicitExpression => explicit = true,
            _ => {}
        }
        if context.is_none() {
            context = match kind {
                SyntaxKind::CodeBlock
                | SyntaxKind::ControlStatement
                | SyntaxKind::Directive
                | SyntaxKind::ImplicitExpression
                | SyntaxKind::ExplicitExpression => Some(TemplateSlot::Code),
                SyntaxKind::MarkupElement | SyntaxKind::MarkupLine | SyntaxKind::Document => {
                    Some(TemplateSlot::Markup)
                }
                _ => None,
            };
        }
    }
    if attribute {
        TemplateSlot::Attribute
    } else if explicit {
        TemplateSlot::ExplicitExpression
    } else if nested {
        TemplateSlot::Nested
    } else {
        context.unwrap_or(TemplateSlot::Markup)
    }
}
