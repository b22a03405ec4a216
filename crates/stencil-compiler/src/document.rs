//! The result of compiling one source file.

use serde::{Deserialize, Serialize};
use stencil_codegen::{CompilationPhase, GenerationMode, SourceMap};
use stencil_types::{Diagnostics, DocumentShape, FileKind, IrDocument, SourceFile, SyntaxTree};

/// Everything one compilation produced: the syntax tree, the processed IR,
/// the generated text with its source map, and every diagnostic.
///
/// A document is immutable once built and owns all of its parts, so it can
/// be handed to another thread or kept for tooling queries.
#[derive(Debug, Clone)]
pub struct CodeDocument {
    pub(crate) source: SourceFile,
    pub(crate) file_kind: FileKind,
    pub(crate) syntax: SyntaxTree,
    pub(crate) ir: IrDocument,
    pub(crate) generated: String,
    pub(crate) source_map: SourceMap,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) checksum: String,
    pub(crate) mode: GenerationMode,
    pub(crate) phase: CompilationPhase,
}

impl CodeDocument {
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn file_kind(&self) -> FileKind {
        self.file_kind
    }

    /// The lossless syntax tree.
    pub fn syntax(&self) -> &SyntaxTree {
        &self.syntax
    }

    /// The IR after every configured pass ran.
    pub fn ir(&self) -> &IrDocument {
        &self.ir
    }

    pub fn shape(&self) -> DocumentShape {
        self.ir.shape()
    }

    /// Generated C# text; empty when generation failed.
    pub fn generated_code(&self) -> &str {
        &self.generated
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Syntax, directive, binding, template and generation diagnostics.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Lowercase hex SHA-256 of the source text.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn phase(&self) -> CompilationPhase {
        self.phase
    }

    /// The `public partial class ...` line of the generated text, trimmed.
    pub fn class_declaration(&self) -> Option<&str> {
        self.generated
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("public partial class "))
    }
}

/// Serializable summary of one compilation, for JSON consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    /// No error-severity diagnostics were reported.
    pub success: bool,
    /// Generated text; `None` when generation failed.
    pub generated: Option<String>,
    pub source_map: Option<SourceMap>,
    pub checksum: Option<String>,
    pub errors: Diagnostics,
}

impl From<&CodeDocument> for CompileResult {
    fn from(document: &CodeDocument) -> Self {
        let generation_failed = document
            .diagnostics
            .iter()
            .any(|d| d.code == stencil_types::ErrorCode::GENERATION_FAILED);
        let (generated, source_map) = if generation_failed {
            (None, None)
        } else {
            (Some(document.generated.clone()), Some(document.source_map.clone()))
        };
        Self {
            success: !document.has_errors(),
            generated,
            source_map,
            checksum: Some(document.checksum.clone()),
            errors: document.diagnostics.clone(),
        }
    }
}
