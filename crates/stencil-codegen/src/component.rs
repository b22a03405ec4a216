//! Component shape: `BuildRenderTree` bodies built from render-tree builder
//! calls, plus the type-inference helpers for generic components whose
//! type arguments are not written out.

use stencil_types::ir::{AttributeBinding, TypeArgument};
use stencil_types::{IrKind, IrNodeId, Span};

use crate::error::CodegenResult;
use crate::generator::{Generator, Scope};
use crate::names::{self, string_literal};
use crate::writer::CodeWriter;

/// One `CreateX_N` method of the nested type-inference class.
#[derive(Debug, Clone)]
pub(crate) struct InferenceMethod {
    name: String,
    type_parameters: Vec<String>,
    parameters: Vec<String>,
    body: Vec<String>,
}

impl InferenceMethod {
    pub(crate) fn write(&self, out: &mut CodeWriter) {
        out.line(&format!(
            "public static void {}<{}>({})",
            self.name,
            self.type_parameters.join(", "),
            self.parameters.join(", ")
        ))
        .line("{")
        .indent();
        for line in &self.body {
            out.line(line);
        }
        out.dedent().line("}");
    }
}

/// Replace explicitly supplied type parameters inside a declared type.
pub(crate) fn substitute_type_arguments(type_name: &str, arguments: &[TypeArgument]) -> String {
    let mut out = String::with_capacity(type_name.len());
    let mut word = String::new();
    let flush = |word: &mut String, out: &mut String| {
        let replacement = arguments
            .iter()
            .find(|a| a.parameter == *word)
            .and_then(|a| a.value.as_deref());
        out.push_str(replacement.unwrap_or(word.as_str()));
        word.clear();
    };
    for c in type_name.chars() {
        if c.is_alphanumeric() || c == '_' {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}

fn short_type_name(type_name: &str) -> &str {
    let name = type_name.rsplit('.').next().unwrap_or(type_name);
    name.split('<').next().unwrap_or(name)
}

impl<'a> Generator<'a> {
    // ── Content ──────────────────────────────────────────────────────────

    pub(crate) fn emit_component_children(&mut self, parent: IrNodeId, scope: Scope) -> CodegenResult<()> {
        let ir = self.ir;
        for &child in ir.children(parent) {
            self.emit_component_node(child, scope)?;
        }
        Ok(())
    }

    fn emit_component_node(&mut self, id: IrNodeId, scope: Scope) -> CodegenResult<()> {
        let ir = self.ir;
        let b = scope.builder();
        match ir.kind(id) {
            IrKind::HtmlContent { text } => {
                if !text.trim().is_empty() {
                    let seq = self.next_sequence();
                    self.out.ensure_line_start();
                    self.out
                        .line(&format!("{b}.AddMarkupContent({seq}, {});", string_literal(text)));
                }
            }
            IrKind::HtmlElement { tag, .. } => self.emit_element(id, tag, scope)?,
            IrKind::Component { .. } => self.emit_component(id, scope)?,
            IrKind::CSharpExpression { .. } => {
                if !self.has_code(id) {
                    return Ok(());
                }
                if self.options.design_time() {
                    let prefix = format!("{} = ", names::DESIGN_TIME_SINK);
                    self.expression_statement(id, &prefix, ";", scope)?;
                } else {
                    let seq = self.next_sequence();
                    let prefix = format!("{b}.AddContent({seq}, ");
                    self.expression_statement(id, &prefix, ");", scope)?;
                }
            }
            IrKind::CSharpCode => self.emit_component_code(id, scope)?,
            IrKind::Template { .. } => {
                let seq = self.next_sequence();
                self.out.ensure_line_start();
                self.out.write(&format!("{b}.AddContent({seq}, "));
                self.write_component_template(id, scope)?;
                self.out.write(");").newline();
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn emit_component_code(&mut self, code: IrNodeId, scope: Scope) -> CodegenResult<()> {
        self.emit_code_parts(code, scope, |g, part, scope| g.emit_component_node(part, scope))
    }

    /// `(__builderN) => { ... }`, left open after the closing brace.
    pub(crate) fn write_component_template(&mut self, template: IrNodeId, scope: Scope) -> CodegenResult<()> {
        let ir = self.ir;
        let children = ir.children(template);
        self.write_fragment_lambda(children, scope)
    }

    fn write_fragment_lambda(&mut self, content: &[IrNodeId], scope: Scope) -> CodegenResult<()> {
        let inner = scope.nested();
        self.out.write(&format!("({}) => {{", inner.builder())).newline().indent();
        for &child in content {
            self.emit_component_node(child, inner)?;
        }
        self.out.ensure_line_start();
        self.out.dedent().write("}");
        Ok(())
    }

    // ── Elements ─────────────────────────────────────────────────────────

    fn emit_element(&mut self, id: IrNodeId, tag: &str, scope: Scope) -> CodegenResult<()> {
        let ir = self.ir;
        let b = scope.builder();
        let seq = self.next_sequence();
        self.out.ensure_line_start();
        self.out
            .line(&format!("{b}.OpenElement({seq}, {});", string_literal(tag)));

        let (attributes, content): (Vec<IrNodeId>, Vec<IrNodeId>) = ir
            .children(id)
            .iter()
            .copied()
            .partition(|&c| matches!(ir.kind(c), IrKind::HtmlAttribute { .. }));
        let attribute_name = |c: IrNodeId| match ir.kind(c) {
            IrKind::HtmlAttribute { name, .. } => name.as_str(),
            _ => "",
        };

        for &attr in attributes.iter().filter(|&&a| attribute_name(a) == "@key") {
            self.emit_key(attr, scope)?;
        }
        for &attr in &attributes {
            let name = attribute_name(attr);
            if name != "@key" && name != "@ref" {
                self.emit_element_attribute(attr, &attributes, scope)?;
            }
        }
        for &attr in attributes.iter().filter(|&&a| attribute_name(a) == "@ref") {
            if let Some((code, span)) = self.attribute_code(attr) {
                let seq = self.next_sequence();
                self.out.ensure_line_start();
                self.out
                    .write(&format!("{b}.AddElementReferenceCapture({seq}, (__value) => {{ "));
                self.write_expression(code, span)?;
                self.out.write(" = __value; });").newline();
            }
        }

        for child in content {
            self.emit_component_node(child, scope)?;
        }
        self.out.ensure_line_start();
        self.out.line(&format!("{b}.CloseElement();"));
        Ok(())
    }

    fn emit_element_attribute(
        &mut self,
        attr: IrNodeId,
        siblings: &[IrNodeId],
        scope: Scope,
    ) -> CodegenResult<()> {
        let ir = self.ir;
        let IrKind::HtmlAttribute { name, minimized } = ir.kind(attr) else {
            return Ok(());
        };
        if name.is_empty() {
            return Ok(());
        }
        let b = scope.builder();

        let Some(directive) = name.strip_prefix('@') else {
            return self.emit_plain_attribute(attr, name, *minimized, scope);
        };
        if let Some((target, modifier)) = directive.split_once(':') {
            // Event modifiers become flags; bind modifiers are read by the binder.
            if target.starts_with("on") && matches!(modifier, "preventDefault" | "stopPropagation") {
                let seq = self.next_sequence();
                let call = if modifier == "preventDefault" {
                    "AddEventPreventDefaultAttribute"
                } else {
                    "AddEventStopPropagationAttribute"
                };
                self.out.ensure_line_start();
                self.out
                    .write(&format!("{b}.{call}({seq}, {}, ", string_literal(target)));
                if *minimized {
                    self.out.write("true");
                } else {
                    self.write_attribute_value(attr, true, scope)?;
                }
                self.out.write(");").newline();
            }
            return Ok(());
        }
        if directive == "bind" || directive.starts_with("bind-") {
            return self.emit_element_bind(attr, name, directive, siblings, scope);
        }
        if directive == "attributes" {
            let seq = self.next_sequence();
            self.out.ensure_line_start();
            self.out.write(&format!(
                "{b}.AddMultipleAttributes({seq}, {}.TypeCheck<global::System.Collections.Generic.IEnumerable<global::System.Collections.Generic.KeyValuePair<string, object>>>(",
                names::RUNTIME_HELPERS
            ));
            self.write_attribute_value(attr, true, scope)?;
            self.out.write("));").newline();
            return Ok(());
        }
        if directive.starts_with("on") {
            let seq = self.next_sequence();
            self.out.ensure_line_start();
            self.out.write(&format!(
                "{b}.AddAttribute({seq}, {}, {}.Factory.Create(this, ",
                string_literal(directive),
                names::EVENT_CALLBACK
            ));
            self.write_attribute_value(attr, true, scope)?;
            self.out.write("));").newline();
            return Ok(());
        }
        self.emit_plain_attribute(attr, directive, *minimized, scope)
    }

    fn emit_plain_attribute(
        &mut self,
        attr: IrNodeId,
        name: &str,
        minimized: bool,
        scope: Scope,
    ) -> CodegenResult<()> {
        let b = scope.builder();
        let seq = self.next_sequence();
        self.out.ensure_line_start();
        self.out
            .write(&format!("{b}.AddAttribute({seq}, {}, ", string_literal(name)));
        if minimized {
            self.out.write("true");
        } else {
            self.write_attribute_value(attr, false, scope)?;
        }
        self.out.write(");").newline();
        Ok(())
    }

    /// `@bind-X="expr"` on an element: a formatted value plus a change
    /// binder, both writing back to `expr`.
    fn emit_element_bind(
        &mut self,
        attr: IrNodeId,
        name: &str,
        directive: &str,
        siblings: &[IrNodeId],
        scope: Scope,
    ) -> CodegenResult<()> {
        let Some((code, span)) = self.attribute_code(attr) else {
            return Ok(());
        };
        if code.trim().is_empty() {
            return Ok(());
        }
        let target = match directive.strip_prefix("bind-") {
            Some(t) if !t.is_empty() => t,
            _ => "value",
        };
        let event_attr = format!("{name}:event");
        let event = siblings
            .iter()
            .find(|&&s| matches!(self.ir.kind(s), IrKind::HtmlAttribute { name, .. } if *name == event_attr))
            .and_then(|&s| self.attribute_literal(s))
            .unwrap_or("onchange");
        let b = scope.builder();

        let seq = self.next_sequence();
        self.out.ensure_line_start();
        self.out.write(&format!(
            "{b}.AddAttribute({seq}, {}, {}.FormatValue(",
            string_literal(target),
            names::BIND_CONVERTER
        ));
        self.write_expression(code, span)?;
        self.out.write("));").newline();

        let seq = self.next_sequence();
        self.out.ensure_line_start();
        self.out.write(&format!(
            "{b}.AddAttribute({seq}, {}, {}.Factory.CreateBinder(this, __value => ",
            string_literal(event),
            names::EVENT_CALLBACK
        ));
        self.write_expression(code, span)?;
        self.out.write(" = __value, ");
        self.write_expression(code, span)?;
        self.out.write("));").newline();
        self.out
            .line(&format!("{b}.SetUpdatesAttributeName({});", string_literal(target)));
        Ok(())
    }

    fn emit_key(&mut self, attr: IrNodeId, scope: Scope) -> CodegenResult<()> {
        let Some((code, span)) = self.attribute_code(attr) else {
            return Ok(());
        };
        self.out.ensure_line_start();
        self.out.write(&format!("{}.SetKey(", scope.builder()));
        self.write_expression(code, span)?;
        self.out.write(");").newline();
        Ok(())
    }

    // ── Attribute values ─────────────────────────────────────────────────

    fn value_parts(&self, attr: IrNodeId) -> Vec<IrNodeId> {
        let ir = self.ir;
        ir.children(attr)
            .iter()
            .copied()
            .filter(|&c| {
                matches!(
                    ir.kind(c),
                    IrKind::HtmlAttributeValue { .. } | IrKind::CSharpExpression { .. }
                )
            })
            .collect()
    }

    /// The one region of user code an attribute value consists of.
    pub(crate) fn attribute_code(&self, attr: IrNodeId) -> Option<(&'a str, Span)> {
        let ir = self.ir;
        match self.value_parts(attr).as_slice() {
            [part] => match ir.kind(*part) {
                IrKind::HtmlAttributeValue { text } => Some((text.as_str(), ir.span(*part)?)),
                IrKind::CSharpExpression { .. } => {
                    let (text, fragment) = self.sole_fragment(*part)?;
                    Some((text, ir.span(fragment)?))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Literal text of an attribute without expressions.
    pub(crate) fn attribute_literal(&self, attr: IrNodeId) -> Option<&'a str> {
        let ir = self.ir;
        match self.value_parts(attr).as_slice() {
            [part] => match ir.kind(*part) {
                IrKind::HtmlAttributeValue { text } => Some(text.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// An attribute value as a C# expression. With `as_code`, a purely
    /// literal value is user code rather than a string.
    fn write_attribute_value(&mut self, attr: IrNodeId, as_code: bool, scope: Scope) -> CodegenResult<()> {
        let ir = self.ir;
        let parts = self.value_parts(attr);
        if parts.is_empty() {
            self.out.write("\"\"");
            return Ok(());
        }
        let mixed = parts.len() > 1;
        for (i, &part) in parts.iter().enumerate() {
            if i > 0 {
                self.out.write(" + ");
            }
            match ir.kind(part) {
                IrKind::HtmlAttributeValue { text } if as_code && !mixed => {
                    let span = self.span_of(part)?;
                    self.write_expression(text, span)?;
                }
                IrKind::HtmlAttributeValue { text } => {
                    self.out.write(&string_literal(text));
                }
                _ if !self.has_code(part) => {
                    self.out.write("null");
                }
                _ if mixed => {
                    self.out.write("(");
                    self.write_code_parts(part, scope)?;
                    self.out.write(")");
                }
                _ => self.write_code_parts(part, scope)?,
            }
        }
        Ok(())
    }

    // ── Components ───────────────────────────────────────────────────────

    fn emit_component(&mut self, id: IrNodeId, scope: Scope) -> CodegenResult<()> {
        let ir = self.ir;
        let IrKind::Component {
            type_name,
            type_arguments,
            ..
        } = ir.kind(id)
        else {
            return Ok(());
        };
        let mut attributes: Vec<(IrNodeId, &'a str, &'a AttributeBinding)> = Vec::new();
        let mut content: Vec<IrNodeId> = Vec::new();
        for &child in ir.children(id) {
            match ir.kind(child) {
                IrKind::ComponentAttribute { name, binding } => {
                    attributes.push((child, name.as_str(), binding))
                }
                // Attributes no descriptor accepted; already diagnosed.
                IrKind::HtmlAttribute { .. } => {}
                IrKind::HtmlContent { text } if text.trim().is_empty() => {}
                _ => content.push(child),
            }
        }

        if type_arguments.iter().any(|a| a.value.is_none()) {
            return self.emit_inferred_component(id, type_name, type_arguments, &attributes, &content, scope);
        }

        let b = scope.builder();
        let component_type = component_type_name(type_name, type_arguments);
        let seq = self.next_sequence();
        self.out.ensure_line_start();
        self.out
            .line(&format!("{b}.OpenComponent<{component_type}>({seq});"));

        for &(attr, name, binding) in &attributes {
            match binding {
                AttributeBinding::Parameter { property, type_name } => {
                    let declared = substitute_type_arguments(type_name, type_arguments);
                    let seq = self.next_sequence();
                    self.out.ensure_line_start();
                    self.out.write(&format!(
                        "{b}.AddComponentParameter({seq}, {}, ",
                        string_literal(property)
                    ));
                    self.write_parameter_value(attr, &declared, scope)?;
                    self.out.write(");").newline();
                }
                AttributeBinding::TwoWay {
                    property,
                    changed,
                    type_name,
                } => {
                    let declared = substitute_type_arguments(type_name, type_arguments);
                    self.emit_component_bind(attr, property, changed, &declared, scope)?;
                }
                AttributeBinding::CaptureUnmatched { .. } => {
                    let seq = self.next_sequence();
                    self.out.ensure_line_start();
                    self.out.write(&format!(
                        "{b}.AddComponentParameter({seq}, {}, ",
                        string_literal(name)
                    ));
                    self.write_attribute_value(attr, false, scope)?;
                    self.out.write(");").newline();
                }
                AttributeBinding::TypeArgument { .. }
                | AttributeBinding::Key
                | AttributeBinding::Ref => {}
            }
        }

        if !content.is_empty() {
            let seq = self.next_sequence();
            self.out.ensure_line_start();
            self.out.write(&format!(
                "{b}.AddComponentParameter({seq}, {}, ({})(",
                string_literal(names::CHILD_CONTENT),
                names::RENDER_FRAGMENT
            ));
            self.write_fragment_lambda(&content, scope)?;
            self.out.write("));").newline();
        }

        for &(attr, _, binding) in &attributes {
            if *binding == AttributeBinding::Key {
                self.emit_key(attr, scope)?;
            }
        }
        for &(attr, _, binding) in &attributes {
            if *binding != AttributeBinding::Ref {
                continue;
            }
            if let Some((code, span)) = self.attribute_code(attr) {
                let seq = self.next_sequence();
                self.out.ensure_line_start();
                self.out
                    .write(&format!("{b}.AddComponentReferenceCapture({seq}, (__value) => {{ "));
                self.write_expression(code, span)?;
                self.out
                    .write(&format!(" = ({component_type})__value; }});"))
                    .newline();
            }
        }

        self.out.ensure_line_start();
        self.out.line(&format!("{b}.CloseComponent();"));
        Ok(())
    }

    /// A bound parameter value, type-checked against the declared type.
    fn write_parameter_value(&mut self, attr: IrNodeId, declared: &str, scope: Scope) -> CodegenResult<()> {
        if self.value_parts(attr).is_empty() {
            self.out.write("true");
            return Ok(());
        }
        if names::is_string_type(declared) {
            return self.write_attribute_value(attr, false, scope);
        }
        self.out
            .write(&format!("{}.TypeCheck<{declared}>(", names::RUNTIME_HELPERS));
        self.write_attribute_value(attr, true, scope)?;
        self.out.write(")");
        Ok(())
    }

    /// `@bind-X="expr"` on a component: the value and its `XChanged`
    /// callback.
    fn emit_component_bind(
        &mut self,
        attr: IrNodeId,
        property: &str,
        changed: &str,
        declared: &str,
        scope: Scope,
    ) -> CodegenResult<()> {
        let Some((code, span)) = self.attribute_code(attr) else {
            return Ok(());
        };
        if code.trim().is_empty() {
            return Ok(());
        }
        let b = scope.builder();

        let seq = self.next_sequence();
        self.out.ensure_line_start();
        self.out.write(&format!(
            "{b}.AddComponentParameter({seq}, {}, {}.TypeCheck<{declared}>(",
            string_literal(property),
            names::RUNTIME_HELPERS
        ));
        self.write_expression(code, span)?;
        self.out.write("));").newline();

        let seq = self.next_sequence();
        self.out.ensure_line_start();
        self.out.write(&format!(
            "{b}.AddComponentParameter({seq}, {}, {}.Factory.Create<{declared}>(this, __value => ",
            string_literal(changed),
            names::EVENT_CALLBACK
        ));
        self.write_expression(code, span)?;
        self.out.write(" = __value));").newline();
        Ok(())
    }

    /// A generic component with inferred type arguments: the values go
    /// through a generic helper method so the host compiler infers them.
    fn emit_inferred_component(
        &mut self,
        id: IrNodeId,
        type_name: &str,
        type_arguments: &[TypeArgument],
        attributes: &[(IrNodeId, &'a str, &'a AttributeBinding)],
        content: &[IrNodeId],
        scope: Scope,
    ) -> CodegenResult<()> {
        let b = scope.builder();
        let component_type = component_type_name(type_name, type_arguments);
        let method_name = format!("Create{}_{}", short_type_name(type_name), id.0);
        let type_parameters: Vec<String> = type_arguments
            .iter()
            .filter(|a| a.value.is_none())
            .map(|a| a.parameter.clone())
            .collect();
        let mut parameters = vec![
            format!("{} {}", names::RENDER_TREE_BUILDER, names::BUILDER),
            "int seq".to_string(),
        ];
        let mut body = vec![format!(
            "{}.OpenComponent<{component_type}>(seq);",
            names::BUILDER
        )];
        let mut offset = 0u32;
        let mut argument = 0usize;
        let mut next_argument = |ty: String, parameters: &mut Vec<String>| {
            let name = format!("__arg{argument}");
            argument += 1;
            parameters.push(format!("{ty} {name}"));
            offset += 1;
            (name, offset)
        };

        let seq = self.next_sequence();
        self.out.ensure_line_start();
        self.out.write(&format!(
            "{}.{method_name}({b}, {seq}",
            names::TYPE_INFERENCE_CLASS
        ));

        for &(attr, name, binding) in attributes {
            match binding {
                AttributeBinding::Parameter { property, type_name } => {
                    let declared = substitute_type_arguments(type_name, type_arguments);
                    let (arg, n) = next_argument(declared.clone(), &mut parameters);
                    body.push(format!(
                        "{}.AddComponentParameter(seq + {n}, {}, {arg});",
                        names::BUILDER,
                        string_literal(property)
                    ));
                    self.out.write(", ");
                    if self.value_parts(attr).is_empty() {
                        self.out.write("true");
                    } else {
                        self.write_attribute_value(attr, !names::is_string_type(&declared), scope)?;
                    }
                }
                AttributeBinding::TwoWay {
                    property,
                    changed,
                    type_name,
                } => {
                    let Some((code, span)) = self.attribute_code(attr) else {
                        continue;
                    };
                    let declared = substitute_type_arguments(type_name, type_arguments);
                    let (value_arg, n) = next_argument(declared.clone(), &mut parameters);
                    body.push(format!(
                        "{}.AddComponentParameter(seq + {n}, {}, {value_arg});",
                        names::BUILDER,
                        string_literal(property)
                    ));
                    let (changed_arg, n) = next_argument(
                        format!("{}<{declared}>", names::EVENT_CALLBACK),
                        &mut parameters,
                    );
                    body.push(format!(
                        "{}.AddComponentParameter(seq + {n}, {}, {changed_arg});",
                        names::BUILDER,
                        string_literal(changed)
                    ));
                    self.out.write(", ");
                    self.write_expression(code, span)?;
                    self.out.write(&format!(
                        ", {}.CreateInferredEventCallback(this, __value => ",
                        names::RUNTIME_HELPERS
                    ));
                    self.write_expression(code, span)?;
                    self.out.write(" = __value, ");
                    self.write_expression(code, span)?;
                    self.out.write(")");
                }
                AttributeBinding::CaptureUnmatched { .. } => {
                    let (arg, n) = next_argument("object".to_string(), &mut parameters);
                    body.push(format!(
                        "{}.AddComponentParameter(seq + {n}, {}, {arg});",
                        names::BUILDER,
                        string_literal(name)
                    ));
                    self.out.write(", ");
                    self.write_attribute_value(attr, false, scope)?;
                }
                AttributeBinding::Key => {
                    let Some((code, span)) = self.attribute_code(attr) else {
                        continue;
                    };
                    let (arg, _) = next_argument("object".to_string(), &mut parameters);
                    body.push(format!("{}.SetKey({arg});", names::BUILDER));
                    self.out.write(", ");
                    self.write_expression(code, span)?;
                }
                AttributeBinding::Ref => {
                    let Some((code, span)) = self.attribute_code(attr) else {
                        continue;
                    };
                    let (arg, n) = next_argument(
                        format!("global::System.Action<{component_type}>"),
                        &mut parameters,
                    );
                    body.push(format!(
                        "{}.AddComponentReferenceCapture(seq + {n}, (__value) => {{ {arg}(({component_type})__value); }});",
                        names::BUILDER
                    ));
                    self.out.write(", (__value) => { ");
                    self.write_expression(code, span)?;
                    self.out.write(" = __value; }");
                }
                AttributeBinding::TypeArgument { .. } => {}
            }
        }

        if !content.is_empty() {
            let (arg, n) = next_argument(names::RENDER_FRAGMENT.to_string(), &mut parameters);
            body.push(format!(
                "{}.AddComponentParameter(seq + {n}, {}, {arg});",
                names::BUILDER,
                string_literal(names::CHILD_CONTENT)
            ));
            self.out.write(", ");
            self.write_fragment_lambda(content, scope)?;
        }
        self.out.write(");").newline();

        body.push(format!("{}.CloseComponent();", names::BUILDER));
        self.sequence += offset;
        self.inference.push(InferenceMethod {
            name: method_name,
            type_parameters,
            parameters,
            body,
        });
        Ok(())
    }
}

/// `global::Ns.Type<Args>` with explicit arguments, or parameter names
/// where they are inferred.
fn component_type_name(type_name: &str, type_arguments: &[TypeArgument]) -> String {
    let mut name = names::qualified_type(type_name);
    if !type_arguments.is_empty() {
        let args: Vec<&str> = type_arguments
            .iter()
            .map(|a| a.value.as_deref().unwrap_or(&a.parameter))
            .collect();
        name.push_str(&format!("<{}>", args.join(", ")));
    }
    name
}
