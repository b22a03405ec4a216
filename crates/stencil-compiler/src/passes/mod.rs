//! IR passes and the ordered pipeline that runs them.
//!
//! A pass mutates one document's IR in place: it may reclassify nodes and
//! attach diagnostics, never remove nodes. Passes are stateless and
//! shareable; per-document state lives in the [`PassContext`].

mod bind_syntax;
mod binding;
mod directives;
mod templates;

use std::collections::HashSet;

use stencil_types::{DirectiveRegistry, IrDocument, SourceFile};
use tracing::{debug, info_span};

use crate::components::ComponentSet;
use crate::error::CompileError;

pub use bind_syntax::BindSyntaxPass;
pub use binding::ComponentBindingPass;
pub use directives::DuplicateDirectivesPass;
pub use templates::TemplatePlacementPass;

/// Read-only inputs every pass may consult.
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    pub source: &'a SourceFile,
    pub components: &'a ComponentSet,
    pub registry: &'a DirectiveRegistry,
}

/// One IR transformation.
pub trait IrPass: Send + Sync {
    /// Stable name used in configuration.
    fn name(&self) -> &'static str;

    fn run(&self, ir: &mut IrDocument, cx: &PassContext<'_>);
}

/// Names of the built-in passes, in their default order.
pub const BUILTIN_PASSES: [&str; 4] = [
    ComponentBindingPass::NAME,
    TemplatePlacementPass::NAME,
    DuplicateDirectivesPass::NAME,
    BindSyntaxPass::NAME,
];

fn builtin(name: &str) -> Option<Box<dyn IrPass>> {
    let pass: Box<dyn IrPass> = match name {
        ComponentBindingPass::NAME => Box::new(ComponentBindingPass),
        TemplatePlacementPass::NAME => Box::new(TemplatePlacementPass),
        DuplicateDirectivesPass::NAME => Box::new(DuplicateDirectivesPass),
        BindSyntaxPass::NAME => Box::new(BindSyntaxPass),
        _ => return None,
    };
    Some(pass)
}

/// An ordered, immutable list of passes, assembled once per configuration.
pub struct PassPipeline {
    passes: Vec<Box<dyn IrPass>>,
}

impl PassPipeline {
    /// Every built-in pass in its default order.
    pub fn builtin() -> Self {
        Self {
            passes: BUILTIN_PASSES.iter().filter_map(|name| builtin(name)).collect(),
        }
    }

    /// Built-in passes selected by name, in the given order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, CompileError> {
        let mut seen = HashSet::new();
        let mut passes = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(CompileError::DuplicatePass(name.to_string()));
            }
            let pass = builtin(name).ok_or_else(|| CompileError::UnknownPass(name.to_string()))?;
            passes.push(pass);
        }
        Ok(Self { passes })
    }

    /// A pipeline of caller-provided passes. Names must be unique.
    pub fn from_passes(passes: Vec<Box<dyn IrPass>>) -> Result<Self, CompileError> {
        let mut seen = HashSet::new();
        for pass in &passes {
            if !seen.insert(pass.name()) {
                return Err(CompileError::DuplicatePass(pass.name().to_string()));
            }
        }
        Ok(Self { passes })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass in order over one document.
    pub fn run(&self, ir: &mut IrDocument, cx: &PassContext<'_>) {
        for pass in &self.passes {
            let span = info_span!("pass", name = pass.name());
            let _enter = span.enter();
            pass.run(ir, cx);
            debug!(diagnostics = ir.diagnostics().len(), "pass finished");
        }
    }
}

impl Default for PassPipeline {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for PassPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
