//! Document skeleton shared by every shape: header, namespace, usings,
//! class declaration, design-time helpers, injected properties, and code
//! members. Render bodies live in [`crate::component`] and [`crate::view`].

use stencil_types::ir::{ClassAttribute, DirectiveTokenValue};
use stencil_types::{DirectiveTokenKind, DocumentShape, IrDocument, IrKind, IrNodeId, SourceFile, Span};
use tracing::debug;

use crate::component::InferenceMethod;
use crate::error::{CodegenError, CodegenResult};
use crate::names;
use crate::options::GenerationOptions;
use crate::source_map::SourceMap;
use crate::writer::CodeWriter;

/// Output of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub text: String,
    pub source_map: SourceMap,
}

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Generate C# for a lowered, pass-processed IR document.
///
/// Traversal follows IR document order. The IR is only read; user-facing
/// problems must already be attached to it as diagnostics.
pub fn generate(
    ir: &IrDocument,
    source: &SourceFile,
    options: &GenerationOptions,
) -> CodegenResult<GeneratedCode> {
    let mut generator = Generator::new(ir, source, options);
    generator.emit_document()?;
    let (text, source_map) = generator.out.finish();
    debug!(
        file = %source.name,
        bytes = text.len(),
        mappings = source_map.len(),
        "generated code"
    );
    Ok(GeneratedCode { text, source_map })
}

// ══════════════════════════════════════════════════════════════════════════════
// Generator
// ══════════════════════════════════════════════════════════════════════════════

/// Lexical position inside a render body. Templates nest builder scopes.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Scope {
    depth: usize,
}

impl Scope {
    /// Name of the render-tree builder in this scope.
    pub(crate) fn builder(self) -> String {
        match self.depth {
            0 => names::BUILDER.to_string(),
            d => format!("{}{}", names::BUILDER, d + 1),
        }
    }

    pub(crate) fn nested(self) -> Scope {
        Scope {
            depth: self.depth + 1,
        }
    }
}

pub(crate) struct Generator<'a> {
    pub(crate) ir: &'a IrDocument,
    pub(crate) source: &'a SourceFile,
    pub(crate) options: &'a GenerationOptions,
    pub(crate) out: CodeWriter,
    /// Next render-tree sequence number; restarts for each method body.
    pub(crate) sequence: u32,
    /// Pending view literal, written as one `WriteLiteral` call.
    pub(crate) literal: String,
    pub(crate) inference: Vec<InferenceMethod>,
}

impl<'a> Generator<'a> {
    fn new(ir: &'a IrDocument, source: &'a SourceFile, options: &'a GenerationOptions) -> Self {
        Self {
            ir,
            source,
            options,
            out: CodeWriter::new(source.name.clone(), source.len()),
            sequence: 0,
            literal: String::new(),
            inference: Vec::new(),
        }
    }

    pub(crate) fn shape(&self) -> DocumentShape {
        self.ir.shape()
    }

    pub(crate) fn next_sequence(&mut self) -> u32 {
        let seq = self.sequence;
        self.sequence += 1;
        seq
    }

    fn full(&self) -> bool {
        !self.options.declaration_only()
    }

    // ── Skeleton ─────────────────────────────────────────────────────────

    fn emit_document(&mut self) -> CodegenResult<()> {
        let ir = self.ir;
        let namespace = ir.namespace().ok_or(CodegenError::MissingNode("Namespace"))?;
        let class = ir.class().ok_or(CodegenError::MissingNode("Class"))?;
        let IrKind::Namespace { name } = ir.kind(namespace) else {
            return Err(CodegenError::MissingNode("Namespace"));
        };

        if self.full() && self.options.design_time() {
            if let Some(checksum) = &self.options.checksum {
                let pragma = format!(
                    "#pragma checksum {} \"{}\" \"{}\"",
                    names::string_literal(&self.source.name),
                    names::CHECKSUM_SHA256_GUID,
                    checksum
                );
                self.out.directive(&pragma);
            }
        }
        self.out.line("// <auto-generated/>");
        self.out.directive("#pragma warning disable 1591");
        self.out.line(&format!("namespace {name}")).line("{").indent();

        self.out.directive("#line hidden");
        for using in names::default_usings(self.shape()) {
            self.out.line(&format!("using {using};"));
        }
        for &child in ir.children(namespace) {
            if let IrKind::Using { namespace } = ir.kind(child) {
                let span = self.span_of(child)?;
                self.mapped_line("using ", namespace, span, ";", self.marks_expressions())?;
            }
        }

        self.emit_class(class)?;

        self.out.dedent().line("}");
        self.out.directive("#pragma warning restore 1591");
        Ok(())
    }

    fn emit_class(&mut self, class: IrNodeId) -> CodegenResult<()> {
        let ir = self.ir;
        let IrKind::Class {
            name,
            type_parameters,
            base_type,
            interfaces,
            attributes,
        } = ir.kind(class)
        else {
            return Err(CodegenError::MissingNode("Class"));
        };

        for attribute in attributes {
            let line = match attribute {
                ClassAttribute::Route(route) => format!(
                    "[{}({})]",
                    names::route_attribute(self.shape()),
                    names::string_literal(route)
                ),
                ClassAttribute::Layout(layout) => {
                    format!("[{}(typeof({layout}))]", names::LAYOUT_ATTRIBUTE)
                }
            };
            self.out.line(&line);
        }

        let mut declaration = format!("public partial class {name}");
        if !type_parameters.is_empty() {
            declaration.push_str(&format!("<{}>", type_parameters.join(", ")));
        }
        let base = base_type
            .clone()
            .unwrap_or_else(|| names::default_base_type(self.shape()).to_string());
        declaration.push_str(" : ");
        declaration.push_str(&base);
        for interface in interfaces {
            declaration.push_str(", ");
            declaration.push_str(interface);
        }
        self.out.line(&declaration).line("{").indent();

        if self.options.design_time() {
            if self.full() {
                self.emit_design_time_helper(class)?;
            }
            self.out.directive("#pragma warning disable 0414");
            self.out
                .line(&format!("private static object {} = null;", names::DESIGN_TIME_SINK));
            self.out.directive("#pragma warning restore 0414");
        }

        if self.full() {
            let method = ir.method().ok_or(CodegenError::MissingNode("Method"))?;
            self.emit_render_method(method)?;
        }

        self.emit_injected_properties(class)?;
        self.emit_code_members(class)?;
        self.emit_type_inference()?;

        self.out.dedent().line("}");
        Ok(())
    }

    fn emit_render_method(&mut self, method: IrNodeId) -> CodegenResult<()> {
        self.sequence = 0;
        self.out.directive("#pragma warning disable 1998");
        if self.shape().is_view() {
            self.out
                .line("public async override global::System.Threading.Tasks.Task ExecuteAsync()")
                .line("{")
                .indent();
            self.emit_view_children(method)?;
            self.flush_literal();
        } else {
            self.out
                .line(&format!(
                    "protected override void BuildRenderTree({} {})",
                    names::RENDER_TREE_BUILDER,
                    names::BUILDER
                ))
                .line("{")
                .indent();
            self.emit_component_children(method, Scope::default())?;
        }
        self.out.ensure_line_start();
        self.out.dedent().line("}");
        self.out.directive("#pragma warning restore 1998");
        Ok(())
    }

    // ── Directive-driven members ─────────────────────────────────────────

    fn emit_design_time_helper(&mut self, class: IrNodeId) -> CodegenResult<()> {
        let ir = self.ir;
        let tokens: Vec<&DirectiveTokenValue> = ir
            .children(class)
            .iter()
            .filter_map(|&c| match ir.kind(c) {
                IrKind::Directive { tokens, .. } => Some(tokens),
                _ => None,
            })
            .flatten()
            .filter(|t| !t.is_missing())
            .collect();

        self.out.directive("#pragma warning disable 219");
        self.out
            .line(&format!("private void {}()", names::DESIGN_TIME_HELPER))
            .line("{")
            .indent();
        for token in tokens {
            let (prefix, suffix) = match token.kind {
                DirectiveTokenKind::Type => (String::new(), format!(" {} = default!;", names::TYPE_HELPER)),
                DirectiveTokenKind::Namespace => (
                    format!("global::System.Object {} = nameof(", names::TYPE_HELPER),
                    ");".to_string(),
                ),
                DirectiveTokenKind::Member => {
                    ("global::System.Object ".to_string(), " = null!;".to_string())
                }
                DirectiveTokenKind::String => (
                    format!("global::System.Object {} = ", names::TYPE_HELPER),
                    ";".to_string(),
                ),
            };
            self.out.line("((global::System.Action)(() => {");
            self.mapped_line(&prefix, &token.text, token.span, &suffix, true)?;
            self.out.line("}");
            self.out.line("))();");
        }
        self.out.dedent().line("}");
        self.out.directive("#pragma warning restore 219");
        Ok(())
    }

    fn emit_injected_properties(&mut self, class: IrNodeId) -> CodegenResult<()> {
        let ir = self.ir;
        let attribute = if self.shape().is_view() {
            names::VIEW_INJECT_ATTRIBUTE
        } else {
            names::INJECT_ATTRIBUTE
        };
        for &child in ir.children(class) {
            let IrKind::Directive { name, tokens } = ir.kind(child) else {
                continue;
            };
            if name != "inject" {
                continue;
            }
            let (Some(ty), Some(member)) = (tokens.first(), tokens.get(1)) else {
                continue;
            };
            if ty.is_missing() || member.is_missing() {
                continue;
            }
            self.out.ensure_line_start();
            self.out.write(&format!("[{attribute}] private "));
            // Design-time output maps these through the directive helper.
            if self.options.design_time() {
                self.out.write(&ty.text).write(" ").write(&member.text);
            } else {
                self.out.write_mapped(&ty.text, ty.span)?;
                self.out.write(" ");
                self.out.write_mapped(&member.text, member.span)?;
            }
            self.out.write(" { get; set; }").newline();
        }
        Ok(())
    }

    fn emit_code_members(&mut self, class: IrNodeId) -> CodegenResult<()> {
        let ir = self.ir;
        for &child in ir.children(class) {
            let IrKind::Directive { name, .. } = ir.kind(child) else {
                continue;
            };
            if name != "code" && name != "functions" {
                continue;
            }
            self.sequence = 0;
            for &code in ir.children(child) {
                if !matches!(ir.kind(code), IrKind::CSharpCode) {
                    continue;
                }
                if self.shape().is_view() {
                    self.emit_view_code(code)?;
                    self.flush_literal();
                } else {
                    self.emit_component_code(code, Scope::default())?;
                }
            }
        }
        Ok(())
    }

    fn emit_type_inference(&mut self) -> CodegenResult<()> {
        if self.inference.is_empty() {
            return Ok(());
        }
        let methods = std::mem::take(&mut self.inference);
        self.out.ensure_line_start();
        self.out
            .line(&format!("internal static class {}", names::TYPE_INFERENCE_CLASS))
            .line("{")
            .indent();
        for method in &methods {
            method.write(&mut self.out);
        }
        self.out.dedent().line("}");
        Ok(())
    }

    // ── Mapping helpers ──────────────────────────────────────────────────

    pub(crate) fn span_of(&self, id: IrNodeId) -> CodegenResult<Span> {
        self.ir
            .span(id)
            .ok_or_else(|| CodegenError::MissingSpan(self.ir.kind(id).name()))
    }

    /// Expressions get their own fenced lines only in design-time output.
    pub(crate) fn marks_expressions(&self) -> bool {
        self.options.design_time()
    }

    /// One line `prefix text suffix` where `text` is mapped user code.
    /// `marked` lines are fenced by line markers, except in declaration
    /// output, which keeps the same line layout without any markers.
    pub(crate) fn mapped_line(
        &mut self,
        prefix: &str,
        text: &str,
        span: Span,
        suffix: &str,
        marked: bool,
    ) -> CodegenResult<()> {
        let marked = marked && self.full();
        self.out.ensure_line_start();
        if marked {
            let column = self.out.indent_width() + prefix.chars().count() + 1;
            self.line_marker(span, column);
        }
        self.out.write(prefix);
        self.out.write_mapped(text, span)?;
        self.out.write(suffix).newline();
        if marked {
            self.end_marker();
        }
        Ok(())
    }

    /// User code inside a larger expression: inline, or on its own fenced
    /// lines in design-time output.
    pub(crate) fn write_expression(&mut self, text: &str, span: Span) -> CodegenResult<()> {
        if !self.marks_expressions() {
            return self.out.write_mapped(text, span);
        }
        self.mapped_line("", text, span, "", true)
    }

    /// A user statement block on its own fenced lines.
    pub(crate) fn write_statement(&mut self, text: &str, span: Span) -> CodegenResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.mapped_line("", text, span, "", true)
    }

    fn line_marker(&mut self, span: Span, column: usize) {
        let file = names::string_literal(&self.source.name);
        let marker = if self.options.language_version.enhanced_line_directives() {
            format!(
                "#line ({},{})-({},{}) {} {}",
                span.start_line, span.start_col, span.end_line, span.end_col, column, file
            )
        } else {
            format!("#line {} {}", span.start_line, file)
        };
        self.out.directive(&marker);
    }

    fn end_marker(&mut self) {
        self.out.directive("#line default");
        self.out.directive("#line hidden");
    }

    /// The single code fragment of an expression, if it has exactly one.
    pub(crate) fn sole_fragment(&self, id: IrNodeId) -> Option<(&'a str, IrNodeId)> {
        let ir = self.ir;
        match ir.children(id) {
            [only] => match ir.kind(*only) {
                IrKind::CodeFragment { text } => Some((text.as_str(), *only)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether an expression produces any code at all.
    pub(crate) fn has_code(&self, id: IrNodeId) -> bool {
        let ir = self.ir;
        ir.children(id).iter().any(|&c| match ir.kind(c) {
            IrKind::CodeFragment { text } => !text.trim().is_empty(),
            IrKind::Template { .. } => true,
            _ => false,
        })
    }

    /// `prefix <expression> suffix` as one statement.
    pub(crate) fn expression_statement(
        &mut self,
        expression: IrNodeId,
        prefix: &str,
        suffix: &str,
        scope: Scope,
    ) -> CodegenResult<()> {
        if !self.has_code(expression) {
            return Ok(());
        }
        if let Some((text, fragment)) = self.sole_fragment(expression) {
            let span = self.span_of(fragment)?;
            let marked = self.marks_expressions();
            return self.mapped_line(prefix, text, span, suffix, marked);
        }
        self.out.ensure_line_start();
        self.out.write(prefix);
        self.write_code_parts(expression, scope)?;
        self.out.write(suffix).newline();
        Ok(())
    }

    /// Inline the parts of an expression: code fragments and templates.
    pub(crate) fn write_code_parts(&mut self, expression: IrNodeId, scope: Scope) -> CodegenResult<()> {
        let ir = self.ir;
        for &part in ir.children(expression) {
            match ir.kind(part) {
                IrKind::CodeFragment { text } => {
                    let span = self.span_of(part)?;
                    self.write_expression(text, span)?;
                }
                IrKind::Template { .. } => self.write_template(part, scope)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn write_template(&mut self, template: IrNodeId, scope: Scope) -> CodegenResult<()> {
        if self.shape().is_view() {
            self.write_view_template(template)
        } else {
            self.write_component_template(template, scope)
        }
    }

    /// Statement code with interleaved markup, for either shape.
    pub(crate) fn emit_code_parts<F>(
        &mut self,
        code: IrNodeId,
        scope: Scope,
        mut markup: F,
    ) -> CodegenResult<()>
    where
        F: FnMut(&mut Self, IrNodeId, Scope) -> CodegenResult<()>,
    {
        let ir = self.ir;
        for &part in ir.children(code) {
            match ir.kind(part) {
                IrKind::CodeFragment { text } => {
                    let span = self.span_of(part)?;
                    self.write_statement(text, span)?;
                }
                IrKind::Template { .. } => {
                    self.out.ensure_line_start();
                    self.write_template(part, scope)?;
                    self.out.ensure_line_start();
                }
                _ => markup(self, part, scope)?,
            }
        }
        Ok(())
    }
}
