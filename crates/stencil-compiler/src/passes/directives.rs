//! Repeated directives: the same `@typeparam` name, the same `@inject`
//! member, or a second occurrence of a single-occurrence directive.

use std::collections::HashSet;

use stencil_types::descriptor::builtin;
use stencil_types::{Diagnostic, DirectiveUsage, ErrorCode, IrDocument, IrKind, IrNodeId};

use super::{IrPass, PassContext};

pub struct DuplicateDirectivesPass;

impl DuplicateDirectivesPass {
    pub const NAME: &'static str = "duplicate-directives";
}

impl IrPass for DuplicateDirectivesPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, ir: &mut IrDocument, cx: &PassContext<'_>) {
        let Some(class) = ir.class() else {
            return;
        };
        let directives: Vec<IrNodeId> = ir
            .children(class)
            .iter()
            .copied()
            .filter(|&c| matches!(ir.kind(c), IrKind::Directive { .. }))
            .collect();

        let mut typeparams = HashSet::new();
        let mut injected = HashSet::new();
        let mut single = HashSet::new();
        let mut found = Vec::new();

        for id in directives {
            let IrKind::Directive { name, tokens } = ir.kind(id) else {
                continue;
            };
            let repeated = match name.as_str() {
                builtin::TYPEPARAM => tokens
                    .first()
                    .filter(|t| !t.is_missing() && !typeparams.insert(t.text.clone()))
                    .map(|t| t.text.clone()),
                builtin::INJECT => tokens
                    .get(1)
                    .filter(|t| !t.is_missing() && !injected.insert(t.text.clone()))
                    .map(|t| t.text.clone()),
                _ => {
                    let once = cx
                        .registry
                        .get(name)
                        .is_some_and(|d| d.usage == DirectiveUsage::SingleOccurrence);
                    if once && !single.insert(name.clone()) {
                        let value = tokens.iter().find(|t| !t.is_missing());
                        Some(value.map_or_else(|| name.clone(), |t| t.text.clone()))
                    } else {
                        None
                    }
                }
            };
            if let (Some(value), Some(span)) = (repeated, ir.span(id)) {
                found.push((id, name.clone(), value, span));
            }
        }

        for (id, name, value, span) in found {
            let diagnostic = Diagnostic::new(cx.source, ErrorCode::DUPLICATE_DIRECTIVE, [name, value], span);
            ir.attach(id, diagnostic);
        }
    }
}
