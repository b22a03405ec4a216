//! Intermediate representation between the syntax tree and generated code.
//!
//! One [`IrDocument`] exists per compiled document. Lowering builds it once;
//! passes then mutate it in place (reclassifying elements and attributes,
//! attaching diagnostics) and the generator reads it. Nodes are stored in an
//! arena and linked by [`IrNodeId`] with parent back-references.

use crate::descriptor::DirectiveTokenKind;
use crate::{Diagnostic, Diagnostics, ErrorCode, Span};
use serde::{Deserialize, Serialize};

/// Index of a node in an [`IrDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IrNodeId(pub u32);

impl IrNodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The generated-artifact shape chosen by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentShape {
    /// Component class with a render-tree builder method.
    Component,
    /// Routable page rendered through a text writer.
    Page,
    /// View rendered through a text writer, without a route.
    LegacyView,
}

impl DocumentShape {
    /// Writer-based shapes emit `Write`/`WriteLiteral` calls.
    pub fn is_view(self) -> bool {
        matches!(self, Self::Page | Self::LegacyView)
    }
}

/// Grammatical position of a template literal, decided from syntax alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSlot {
    /// Code position: code blocks, statements, directive blocks, call
    /// arguments of implicit expressions.
    Code,
    /// Inside a markup attribute value.
    Attribute,
    /// Inside `@( ... )`.
    ExplicitExpression,
    /// Inside another template.
    Nested,
    /// Directly in markup content.
    Markup,
}

impl TemplateSlot {
    /// The diagnostic a template in this slot earns, if any.
    pub fn diagnostic(self) -> Option<ErrorCode> {
        match self {
            Self::Code => None,
            Self::Attribute => Some(ErrorCode::TEMPLATE_IN_ATTRIBUTE),
            Self::ExplicitExpression => Some(ErrorCode::TEMPLATE_IN_EXPLICIT_EXPRESSION),
            Self::Nested => Some(ErrorCode::NESTED_TEMPLATE),
            Self::Markup => Some(ErrorCode::MISPLACED_TEMPLATE),
        }
    }
}

/// One consumed directive token. Missing tokens keep an empty text and a
/// zero-width span at the position where they were expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveTokenValue {
    pub kind: DirectiveTokenKind,
    pub text: String,
    pub span: Span,
}

impl DirectiveTokenValue {
    pub fn is_missing(&self) -> bool {
        self.text.is_empty()
    }

    /// String token content without its quotes.
    pub fn unquoted(&self) -> &str {
        let t = self.text.trim_start_matches('@');
        t.strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(t)
    }
}

/// Class-level attributes contributed by directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassAttribute {
    /// `@page "/route"`
    Route(String),
    /// `@layout LayoutType`
    Layout(String),
}

/// How a component attribute was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeBinding {
    /// Bound directly to a component property.
    Parameter { property: String, type_name: String },
    /// Supplies a type argument explicitly (`TItem="string"`).
    TypeArgument { parameter: String },
    /// `bind-X` / `@bind-X` paired with the `XChanged` callback.
    TwoWay {
        property: String,
        changed: String,
        type_name: String,
    },
    /// Routed into the capture-unmatched property.
    CaptureUnmatched { property: String },
    /// `@key`
    Key,
    /// `@ref`
    Ref,
}

/// One type parameter of a bound component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeArgument {
    pub parameter: String,
    /// Explicit argument text, or `None` when inferred from a parameter.
    pub value: Option<String>,
}

/// Node kinds. Structural data lives on the kind; source positions and
/// diagnostics live on [`IrNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrKind {
    Document,
    Namespace {
        name: String,
    },
    Using {
        namespace: String,
    },
    Class {
        name: String,
        type_parameters: Vec<String>,
        /// `None` selects the shape's default base type.
        base_type: Option<String>,
        interfaces: Vec<String>,
        attributes: Vec<ClassAttribute>,
    },
    /// The render method; its children are the lowered body.
    Method,
    Directive {
        name: String,
        tokens: Vec<DirectiveTokenValue>,
    },
    HtmlContent {
        text: String,
    },
    HtmlElement {
        tag: String,
        self_closing: bool,
    },
    HtmlAttribute {
        name: String,
        /// Written without `=value`.
        minimized: bool,
    },
    HtmlAttributeValue {
        text: String,
    },
    CSharpExpression {
        explicit: bool,
    },
    /// Statement code; children interleave fragments and markup.
    CSharpCode,
    /// Verbatim user code; its text equals the source under its span.
    CodeFragment {
        text: String,
    },
    Template {
        slot: TemplateSlot,
    },
    Component {
        tag: String,
        type_name: String,
        type_arguments: Vec<TypeArgument>,
        self_closing: bool,
    },
    ComponentAttribute {
        name: String,
        binding: AttributeBinding,
    },
    /// Region that could not be lowered; carries the diagnostics.
    Malformed {
        text: String,
    },
}

impl IrKind {
    /// Short kind name for logging and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Namespace { .. } => "Namespace",
            Self::Using { .. } => "Using",
            Self::Class { .. } => "Class",
            Self::Method => "Method",
            Self::Directive { .. } => "Directive",
            Self::HtmlContent { .. } => "HtmlContent",
            Self::HtmlElement { .. } => "HtmlElement",
            Self::HtmlAttribute { .. } => "HtmlAttribute",
            Self::HtmlAttributeValue { .. } => "HtmlAttributeValue",
            Self::CSharpExpression { .. } => "CSharpExpression",
            Self::CSharpCode => "CSharpCode",
            Self::CodeFragment { .. } => "CodeFragment",
            Self::Template { .. } => "Template",
            Self::Component { .. } => "Component",
            Self::ComponentAttribute { .. } => "ComponentAttribute",
            Self::Malformed { .. } => "Malformed",
        }
    }
}

/// Arena entry for one IR node.
#[derive(Debug, Clone)]
pub struct IrNode {
    pub kind: IrKind,
    pub parent: Option<IrNodeId>,
    pub children: Vec<IrNodeId>,
    /// Originating source span; `None` for boilerplate.
    pub span: Option<Span>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The IR tree of one document.
#[derive(Debug, Clone)]
pub struct IrDocument {
    nodes: Vec<IrNode>,
    shape: DocumentShape,
    file_name: String,
}

impl IrDocument {
    /// A document holding only its root node.
    pub fn new(file_name: impl Into<String>, shape: DocumentShape) -> Self {
        Self {
            nodes: vec![IrNode {
                kind: IrKind::Document,
                parent: None,
                children: Vec::new(),
                span: None,
                diagnostics: Vec::new(),
            }],
            shape,
            file_name: file_name.into(),
        }
    }

    pub fn root(&self) -> IrNodeId {
        IrNodeId(0)
    }

    pub fn shape(&self) -> DocumentShape {
        self.shape
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Construction ─────────────────────────────────────────

    /// Append a new node as the last child of `parent`.
    pub fn add(&mut self, parent: IrNodeId, kind: IrKind, span: Option<Span>) -> IrNodeId {
        let id = IrNodeId(self.nodes.len() as u32);
        self.nodes.push(IrNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            span,
            diagnostics: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Replace a node's kind in place, keeping its children and position.
    pub fn set_kind(&mut self, id: IrNodeId, kind: IrKind) {
        self.nodes[id.index()].kind = kind;
    }

    pub fn set_span(&mut self, id: IrNodeId, span: Span) {
        self.nodes[id.index()].span = Some(span);
    }

    /// Attach a diagnostic unless an equivalent one is already present on
    /// the node. Returns whether it was added.
    pub fn attach(&mut self, id: IrNodeId, diagnostic: Diagnostic) -> bool {
        let node = &mut self.nodes[id.index()];
        if node.diagnostics.iter().any(|d| d.same_problem(&diagnostic)) {
            return false;
        }
        node.diagnostics.push(diagnostic);
        true
    }

    // ── Queries ──────────────────────────────────────────────

    pub fn node(&self, id: IrNodeId) -> &IrNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: IrNodeId) -> &IrKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: IrNodeId) -> &mut IrKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn children(&self, id: IrNodeId) -> &[IrNodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: IrNodeId) -> Option<IrNodeId> {
        self.nodes[id.index()].parent
    }

    pub fn span(&self, id: IrNodeId) -> Option<Span> {
        self.nodes[id.index()].span
    }

    /// Strict ancestors, innermost first.
    pub fn ancestors(&self, id: IrNodeId) -> impl Iterator<Item = IrNodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: IrNodeId) -> Vec<IrNodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Nodes matching `predicate`, in document order.
    pub fn find_all(&self, predicate: impl Fn(&IrKind) -> bool) -> Vec<IrNodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|n| predicate(self.kind(*n)))
            .collect()
    }

    fn find_first(&self, predicate: impl Fn(&IrKind) -> bool) -> Option<IrNodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| predicate(self.kind(*n)))
    }

    pub fn namespace(&self) -> Option<IrNodeId> {
        self.find_first(|k| matches!(k, IrKind::Namespace { .. }))
    }

    pub fn class(&self) -> Option<IrNodeId> {
        self.find_first(|k| matches!(k, IrKind::Class { .. }))
    }

    /// The render method.
    pub fn method(&self) -> Option<IrNodeId> {
        self.find_first(|k| matches!(k, IrKind::Method))
    }

    /// Every occurrence of a directive, in source order.
    pub fn directives(&self, name: &str) -> Vec<IrNodeId> {
        self.find_all(|k| matches!(k, IrKind::Directive { name: n, .. } if n == name))
    }

    /// The innermost spanned node covering `offset`.
    pub fn node_at_offset(&self, offset: usize) -> Option<IrNodeId> {
        let mut found = None;
        let mut current = self.root();
        'descend: loop {
            for &child in self.children(current) {
                let covers = self.span(child).is_some_and(|s| s.contains_offset(offset));
                if covers {
                    found = Some(child);
                    current = child;
                    continue 'descend;
                }
                // Boilerplate nodes carry no span; look through them.
                if self.span(child).is_none() && self.subtree_covers(child, offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return found;
        }
    }

    fn subtree_covers(&self, id: IrNodeId, offset: usize) -> bool {
        self.descendants(id)
            .into_iter()
            .any(|n| self.span(n).is_some_and(|s| s.contains_offset(offset)))
    }

    /// Every attached diagnostic, in document order.
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        self.descendants(self.root())
            .into_iter()
            .flat_map(|n| self.nodes[n.index()].diagnostics.iter())
            .collect()
    }

    /// Attached diagnostics gathered into a capped list.
    pub fn collect_diagnostics(&self) -> Diagnostics {
        let mut out = Diagnostics::empty();
        out.extend(self.diagnostics().into_iter().cloned());
        out
    }

    /// Concatenated text of every `CodeFragment` below `id`.
    pub fn code_text(&self, id: IrNodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.kind(n) {
                IrKind::CodeFragment { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
