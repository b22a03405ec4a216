//! Lossless syntax tree.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]; each node
//! records its parent index so tooling can walk upwards without reference
//! cycles. Every byte of the source belongs to exactly one token (or to the
//! trivia in front of one), so concatenating all tokens in tree order gives
//! back the original text, malformed regions included.

use crate::token::Token;
use crate::{Diagnostic, Span};

/// Grammar variant selected by the caller for one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Plain template (page or legacy view). `@name` inside a start tag is
    /// a dynamic attribute expression.
    #[default]
    Template,
    /// Component template. `@name` inside a start tag names a directive
    /// attribute (`@bind-Value`, `@key`, `@onclick`).
    Component,
}

/// HTML elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Index of a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Document,
    /// `<tag ...> ... </tag>` or a self-closing / void element.
    MarkupElement,
    MarkupStartTag,
    MarkupEndTag,
    /// `name`, `name=value`, `name="..."`.
    MarkupAttribute,
    AttributeValue,
    /// `<!-- ... -->`
    MarkupComment,
    /// `@:` followed by markup to the end of the line.
    MarkupLine,
    /// `@@`
    EscapedTransition,
    /// `@* ... *@`
    RazorComment,
    /// `@name.member(args)[index]`
    ImplicitExpression,
    /// `@( ... )`
    ExplicitExpression,
    /// `@{ ... }`
    CodeBlock,
    /// `@if (...) { ... } else { ... }` and friends.
    ControlStatement,
    /// `@keyword tokens...` for a registered or unknown directive.
    Directive,
    /// One shaped token of a directive.
    DirectiveToken,
    /// `@<tag>...</tag>` markup literal inside code.
    Template,
    /// Unparseable region kept for round-trip fidelity.
    Error,
}

/// A child of a syntax node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxElement {
    Node(NodeId),
    Token(Token),
}

/// Arena entry for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub kind: SyntaxKind,
    pub parent: Option<NodeId>,
    pub children: Vec<SyntaxElement>,
    /// Covers the full text (trivia included) of every descendant token.
    pub span: Span,
    pub diagnostics: Vec<Diagnostic>,
}

/// Immutable syntax tree produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.node(id).kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[SyntaxElement] {
        &self.node(id).children
    }

    /// Child nodes only.
    pub fn child_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().filter_map(|c| match c {
            SyntaxElement::Node(n) => Some(*n),
            SyntaxElement::Token(_) => None,
        })
    }

    /// Direct child tokens only.
    pub fn child_tokens(&self, id: NodeId) -> impl Iterator<Item = &Token> + '_ {
        self.children(id).iter().filter_map(|c| match c {
            SyntaxElement::Token(t) => Some(t),
            SyntaxElement::Node(_) => None,
        })
    }

    /// Strict ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    pub fn node_span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    /// All tokens below `id`, in source order.
    pub fn node_tokens(&self, id: NodeId) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(id, &mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, id: NodeId, out: &mut Vec<&'a Token>) {
        for child in self.children(id) {
            match child {
                SyntaxElement::Token(t) => out.push(t),
                SyntaxElement::Node(n) => self.collect_tokens(*n, out),
            }
        }
    }

    /// Full text of a node, trivia included.
    pub fn node_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for tok in self.node_tokens(id) {
            tok.write_full_text(&mut out);
        }
        out
    }

    /// Every token of the document, in source order.
    pub fn tokens(&self) -> Vec<&Token> {
        self.node_tokens(self.root)
    }

    /// Reconstruct the source text.
    pub fn text(&self) -> String {
        self.node_text(self.root)
    }

    /// The token whose full span (trivia included) covers `offset`.
    /// Zero-width tokens are skipped; an offset at the very end of the text
    /// yields the last non-empty token.
    pub fn token_at_offset(&self, offset: usize) -> Option<&Token> {
        let tokens = self.tokens();
        let mut last = None;
        for tok in tokens {
            let full = tok.full_span();
            if full.is_empty() {
                continue;
            }
            if full.contains_offset(offset) {
                return Some(tok);
            }
            last = Some(tok);
        }
        match last {
            Some(t) if offset == t.full_span().end_offset() => Some(t),
            _ => None,
        }
    }

    /// The innermost node whose span covers `offset`.
    pub fn node_at_offset(&self, offset: usize) -> NodeId {
        let mut current = self.root;
        'descend: loop {
            for child in self.child_nodes(current) {
                let span = self.node_span(child);
                if !span.is_empty() && span.contains_offset(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Every node below and including `id`, in document (pre-)order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            let kids: Vec<NodeId> = self.child_nodes(n).collect();
            stack.extend(kids.into_iter().rev());
        }
        out
    }

    /// Every attached diagnostic, in document order.
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        self.descendants(self.root)
            .into_iter()
            .flat_map(|n| self.node(n).diagnostics.iter())
            .collect()
    }

    /// Nodes of one kind, in document order.
    pub fn find_all(&self, kind: SyntaxKind) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|n| self.kind(*n) == kind)
            .collect()
    }
}

/// Incremental builder used by the parser: open a node, push tokens and
/// nested nodes, close it.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a node as the last child of the currently open node.
    pub fn start_node(&mut self, kind: SyntaxKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
            span: Span::point(0, 1, 1),
            diagnostics: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(SyntaxElement::Node(id));
        }
        self.stack.push(id);
        id
    }

    /// Close the innermost open node.
    pub fn finish_node(&mut self) {
        self.stack.pop();
    }

    /// The innermost open node.
    pub fn current(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }

    /// Number of open nodes.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Kind of a node created by this builder.
    pub fn kind_of(&self, id: NodeId) -> SyntaxKind {
        self.nodes[id.index()].kind
    }

    /// Kinds of the open nodes, innermost first.
    pub fn open_kinds(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        self.stack.iter().rev().map(|id| self.nodes[id.index()].kind)
    }

    /// Append a token to the innermost open node.
    pub fn token(&mut self, token: Token) {
        if let Some(id) = self.current() {
            self.nodes[id.index()].children.push(SyntaxElement::Token(token));
        }
    }

    /// Attach a diagnostic to a node.
    pub fn attach(&mut self, id: NodeId, diagnostic: Diagnostic) {
        self.nodes[id.index()].diagnostics.push(diagnostic);
    }

    /// Close any nodes left open and compute spans. `start` positions
    /// nodes that cover no text before any content.
    pub fn finish(mut self, start: Span) -> SyntaxTree {
        self.stack.clear();
        let mut tree = SyntaxTree {
            nodes: self.nodes,
            root: NodeId(0),
        };
        if tree.nodes.is_empty() {
            tree.nodes.push(NodeData {
                kind: SyntaxKind::Document,
                parent: None,
                children: Vec::new(),
                span: start,
                diagnostics: Vec::new(),
            });
        }
        compute_span(&mut tree, NodeId(0), start);
        tree
    }
}

/// Post-order span computation. Empty nodes take the position of the
/// preceding content, passed in as `cursor`.
fn compute_span(tree: &mut SyntaxTree, id: NodeId, cursor: Span) -> Span {
    let mut span: Option<Span> = None;
    let mut pos = cursor;
    let children = tree.nodes[id.index()].children.clone();
    for child in &children {
        let child_span = match child {
            SyntaxElement::Token(t) => t.full_span(),
            SyntaxElement::Node(n) => compute_span(tree, *n, pos),
        };
        if child_span.is_empty() && span.is_some() {
            continue;
        }
        span = Some(match span {
            Some(s) if !child_span.is_empty() => s.merge(child_span),
            Some(s) => s,
            None => child_span,
        });
        pos = child_span.end_point();
    }
    let span = span.unwrap_or(Span::point(cursor.offset, cursor.start_line, cursor.start_col));
    tree.nodes[id.index()].span = span;
    span
}
