//! Generation switches.

use serde::{Deserialize, Serialize};

/// Who the generated code is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Output that is compiled and run.
    #[default]
    Optimized,
    /// Output consumed by editor tooling: every user span is marked and
    /// directive tokens are kept alive in a helper method.
    DesignTime,
}

/// How much of the class to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationPhase {
    #[default]
    Full,
    /// Only the class surface: usings, class line, injected properties, and
    /// code members. Used to discover declared members before binding.
    DeclarationOnly,
}

/// Target language level. Controls the `#line` marker syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageVersion {
    CSharp9,
    CSharp10,
    #[default]
    Latest,
}

impl LanguageVersion {
    /// `#line (l,c)-(l,c) "file"` rather than `#line l "file"`.
    pub fn enhanced_line_directives(self) -> bool {
        !matches!(self, Self::CSharp9)
    }
}

/// Everything the generator needs besides the IR and the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    pub mode: GenerationMode,
    pub phase: CompilationPhase,
    pub language_version: LanguageVersion,
    /// Hex SHA-256 of the source, emitted as a checksum pragma in
    /// design-time output.
    pub checksum: Option<String>,
}

impl GenerationOptions {
    pub fn design_time(&self) -> bool {
        self.mode == GenerationMode::DesignTime
    }

    pub fn declaration_only(&self) -> bool {
        self.phase == CompilationPhase::DeclarationOnly
    }
}
