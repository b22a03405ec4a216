//! Templates are values: they belong in code. Each template's syntactic
//! slot was recorded during lowering; this pass turns misplaced slots into
//! diagnostics.

use stencil_types::{Diagnostic, IrDocument, IrKind};

use super::{IrPass, PassContext};

pub struct TemplatePlacementPass;

impl TemplatePlacementPass {
    pub const NAME: &'static str = "template-placement";
}

impl IrPass for TemplatePlacementPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, ir: &mut IrDocument, cx: &PassContext<'_>) {
        for id in ir.find_all(|k| matches!(k, IrKind::Template { .. })) {
            let IrKind::Template { slot } = ir.kind(id) else {
                continue;
            };
            let (Some(code), Some(span)) = (slot.diagnostic(), ir.span(id)) else {
                continue;
            };
            let diagnostic = Diagnostic::new(cx.source, code, Vec::<String>::new(), span);
            ir.attach(id, diagnostic);
        }
    }
}
