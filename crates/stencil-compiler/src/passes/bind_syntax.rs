//! Shape checks for `@bind` and `@bind-Property` attributes.

use stencil_types::{Diagnostic, ErrorCode, IrDocument, IrKind, IrNodeId};

use super::{IrPass, PassContext};

pub struct BindSyntaxPass;

impl BindSyntaxPass {
    pub const NAME: &'static str = "bind-syntax";
}

/// Why a bind attribute is malformed, if it is.
fn bind_problem(ir: &IrDocument, attribute: IrNodeId, name: &str) -> Option<&'static str> {
    if name == "@bind-" {
        return Some("missing property name");
    }
    let mut text = false;
    let mut code = false;
    for &part in ir.children(attribute) {
        match ir.kind(part) {
            IrKind::HtmlAttributeValue { text: t } if !t.trim().is_empty() => text = true,
            IrKind::CSharpExpression { .. } => code = true,
            _ => {}
        }
    }
    match (text, code) {
        (false, false) => Some("missing value"),
        (true, true) => Some("value mixes text and code"),
        _ => None,
    }
}

/// `@bind` or `@bind-X`; modifiers such as `@bind:event` are separate.
fn is_bind_attribute(name: &str) -> bool {
    !name.contains(':') && (name == "@bind" || name.starts_with("@bind-"))
}

impl IrPass for BindSyntaxPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, ir: &mut IrDocument, cx: &PassContext<'_>) {
        let attributes = ir.find_all(|k| {
            matches!(k, IrKind::HtmlAttribute { .. } | IrKind::ComponentAttribute { .. })
        });
        let mut found = Vec::new();
        for id in attributes {
            let name = match ir.kind(id) {
                IrKind::HtmlAttribute { name, .. } | IrKind::ComponentAttribute { name, .. } => name,
                _ => continue,
            };
            if !is_bind_attribute(name) {
                continue;
            }
            if let (Some(reason), Some(span)) = (bind_problem(ir, id, name), ir.span(id)) {
                found.push((id, name.clone(), reason, span));
            }
        }
        for (id, name, reason, span) in found {
            let diagnostic = Diagnostic::new(cx.source, ErrorCode::MALFORMED_BIND, [name.as_str(), reason], span);
            ir.attach(id, diagnostic);
        }
    }
}
