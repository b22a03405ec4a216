//! Stencil compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! Source → Lexer/Parser → Syntax Tree → Lowering → IR Passes → Codegen → C# + Source Map
//! ```
//!
//! One [`CompilerConfig`] (directive registry, pass pipeline, generation
//! switches) and one [`ComponentSet`] are built up front and shared; each
//! call to [`compile`] then works on a single document without touching
//! any shared mutable state.
//!
//! User mistakes never fail a compilation. They surface as diagnostics on
//! the returned [`CodeDocument`]. `Err` is reserved for configuration
//! problems and, with `fail_fast`, generator contract violations.

pub mod checksum;
pub mod classify;
pub mod components;
pub mod config;
pub mod document;
pub mod error;
pub mod lower;
pub mod passes;

pub use checksum::source_checksum;
pub use classify::classify;
pub use components::ComponentSet;
pub use config::{CompilerConfig, CompilerOptions};
pub use document::{CodeDocument, CompileResult};
pub use error::CompileError;
pub use lower::{lower, lower_in_namespace, DEFAULT_ROOT_NAMESPACE};
pub use passes::{IrPass, PassContext, PassPipeline, BUILTIN_PASSES};

use stencil_codegen::{generate, GenerationOptions, SourceMap};
use stencil_types::{Diagnostic, Diagnostics, ErrorCode, FileKind, IrDocument, SourceFile, SyntaxTree};
use tracing::{debug, info_span, warn};

/// Compile one source file.
///
/// Runs parse, lowering, every configured pass, and generation. A
/// generation failure becomes an `E500` diagnostic on the document unless
/// `config.fail_fast` is set.
pub fn compile(
    source: &SourceFile,
    kind: FileKind,
    components: &ComponentSet,
    config: &CompilerConfig,
) -> Result<CodeDocument, CompileError> {
    let span = info_span!("stencil.compile", file = %source.name, kind = ?kind);
    let _enter = span.enter();

    let (syntax, mut ir) = analyze(source, kind, components, config);

    let checksum = source_checksum(&source.source);
    let options = GenerationOptions {
        mode: config.mode,
        phase: config.phase,
        language_version: config.language_version,
        checksum: Some(checksum.clone()),
    };
    let (generated, source_map) = {
        let span = info_span!("generate");
        let _enter = span.enter();
        match generate(&ir, source, &options) {
            Ok(code) => (code.text, code.source_map),
            Err(e) if config.fail_fast => return Err(e.into()),
            Err(e) => {
                warn!(file = %source.name, error = %e, "generation failed");
                let root = ir.root();
                let diagnostic = Diagnostic::new(
                    source,
                    ErrorCode::GENERATION_FAILED,
                    [e.to_string()],
                    source.span(0, 0),
                );
                ir.attach(root, diagnostic);
                (String::new(), SourceMap::new(source.name.clone()))
            }
        }
    };

    let diagnostics = ir.collect_diagnostics();
    debug!(
        errors = diagnostics.total_errors,
        warnings = diagnostics.total_warnings,
        mappings = source_map.len(),
        "compiled document"
    );

    Ok(CodeDocument {
        source: source.clone(),
        file_kind: kind,
        syntax,
        ir,
        generated,
        source_map,
        diagnostics,
        checksum,
        mode: config.mode,
        phase: config.phase,
    })
}

/// Compile text under a file name with the default configuration and no
/// components.
pub fn compile_str(
    text: &str,
    name: &str,
    kind: FileKind,
) -> Result<CodeDocument, CompileError> {
    compile(
        &SourceFile::new(name, text),
        kind,
        &ComponentSet::empty(),
        &CompilerConfig::default(),
    )
}

/// Compile text and return a serializable [`CompileResult`].
///
/// Never fails: a hard error is reported as an `E500` diagnostic.
pub fn compile_to_result(text: &str, name: &str, kind: FileKind) -> CompileResult {
    match compile_str(text, name, kind) {
        Ok(document) => CompileResult::from(&document),
        Err(e) => {
            let source = SourceFile::new(name, text);
            let mut errors = Diagnostics::empty();
            errors.push(Diagnostic::new(
                &source,
                ErrorCode::GENERATION_FAILED,
                [e.to_string()],
                source.span(0, 0),
            ));
            CompileResult {
                success: false,
                generated: None,
                source_map: None,
                checksum: None,
                errors,
            }
        }
    }
}

/// Parse, lower and run the passes without generating code.
///
/// Faster than [`compile`] when only diagnostics are needed.
pub fn check(
    source: &SourceFile,
    kind: FileKind,
    components: &ComponentSet,
    config: &CompilerConfig,
) -> Diagnostics {
    let span = info_span!("stencil.check", file = %source.name);
    let _enter = span.enter();
    let (_, ir) = analyze(source, kind, components, config);
    ir.collect_diagnostics()
}

fn analyze(
    source: &SourceFile,
    kind: FileKind,
    components: &ComponentSet,
    config: &CompilerConfig,
) -> (SyntaxTree, IrDocument) {
    let parsed = stencil_parser::parse(source, kind, &config.registry);
    debug!(
        nodes = parsed.tree.len(),
        syntax_errors = parsed.errors.total_errors,
        "parsed document"
    );

    let mut ir = {
        let span = info_span!("lower");
        let _enter = span.enter();
        lower_in_namespace(&parsed.tree, source, kind, &config.registry, &config.root_namespace)
    };

    let cx = PassContext {
        source,
        components,
        registry: &config.registry,
    };
    config.pipeline.run(&mut ir, &cx);
    (parsed.tree, ir)
}
