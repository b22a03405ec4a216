//! Compiler configuration.
//!
//! [`CompilerOptions`] is plain data, read from JSON or built in code.
//! [`CompilerConfig`] is the validated, immutable form every compile call
//! takes; its registry and pipeline are shared by `Arc`, so one config can
//! drive any number of concurrent compilations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stencil_codegen::{CompilationPhase, GenerationMode, LanguageVersion};
use stencil_types::{DirectiveDescriptor, DirectiveRegistry};

use crate::error::CompileError;
use crate::lower::DEFAULT_ROOT_NAMESPACE;
use crate::passes::PassPipeline;

/// User-facing compiler switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub language_version: LanguageVersion,
    /// Emit design-time output for editor tooling.
    pub design_time: bool,
    /// Emit only the class surface.
    pub declaration_only: bool,
    /// Pass names in run order; `None` runs every built-in pass.
    pub passes: Option<Vec<String>>,
    pub root_namespace: String,
    /// Return generation failures as errors instead of E500 diagnostics.
    pub fail_fast: bool,
    /// Directives registered on top of the built-in set.
    pub extra_directives: Vec<DirectiveDescriptor>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            language_version: LanguageVersion::default(),
            design_time: false,
            declaration_only: false,
            passes: None,
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            fail_fast: false,
            extra_directives: Vec::new(),
        }
    }
}

impl CompilerOptions {
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(|e| CompileError::InvalidOptions(e.to_string()))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Validated configuration threaded through every compile call.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub registry: Arc<DirectiveRegistry>,
    pub pipeline: Arc<PassPipeline>,
    pub mode: GenerationMode,
    pub phase: CompilationPhase,
    pub language_version: LanguageVersion,
    pub root_namespace: String,
    pub fail_fast: bool,
}

impl CompilerConfig {
    /// Build the registry and the pipeline, rejecting bad directives and
    /// unknown or repeated pass names.
    pub fn from_options(options: &CompilerOptions) -> Result<Self, CompileError> {
        let mut registry = DirectiveRegistry::with_defaults();
        for directive in &options.extra_directives {
            registry.register(directive.clone())?;
        }
        let pipeline = match &options.passes {
            Some(names) => PassPipeline::from_names(names)?,
            None => PassPipeline::builtin(),
        };
        Ok(Self {
            registry: Arc::new(registry),
            pipeline: Arc::new(pipeline),
            mode: if options.design_time {
                GenerationMode::DesignTime
            } else {
                GenerationMode::Optimized
            },
            phase: if options.declaration_only {
                CompilationPhase::DeclarationOnly
            } else {
                CompilationPhase::Full
            },
            language_version: options.language_version,
            root_namespace: options.root_namespace.clone(),
            fail_fast: options.fail_fast,
        })
    }

    /// The same configuration in another phase; registry and pipeline stay
    /// shared.
    pub fn with_phase(&self, phase: CompilationPhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    /// The same configuration in another generation mode.
    pub fn with_mode(&self, mode: GenerationMode) -> Self {
        Self { mode, ..self.clone() }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            registry: Arc::new(DirectiveRegistry::with_defaults()),
            pipeline: Arc::new(PassPipeline::builtin()),
            mode: GenerationMode::Optimized,
            phase: CompilationPhase::Full,
            language_version: LanguageVersion::Latest,
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            fail_fast: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_types::{DescriptorError, DirectiveTokenKind};

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.mode, GenerationMode::Optimized);
        assert_eq!(config.phase, CompilationPhase::Full);
        assert_eq!(config.language_version, LanguageVersion::Latest);
        assert_eq!(config.pipeline.len(), 4);
        assert!(config.registry.contains("page"));
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_options_from_json() {
        let json = r#"{
            "language_version": "c_sharp9",
            "design_time": true,
            "passes": ["component-binding", "bind-syntax"],
            "root_namespace": "MyApp"
        }"#;
        let options = CompilerOptions::from_json(json).unwrap();
        assert_eq!(options.language_version, LanguageVersion::CSharp9);
        assert!(options.design_time);
        assert!(!options.declaration_only);
        assert_eq!(options.root_namespace, "MyApp");

        let config = CompilerConfig::from_options(&options).unwrap();
        assert_eq!(config.mode, GenerationMode::DesignTime);
        assert_eq!(config.pipeline.names(), vec!["component-binding", "bind-syntax"]);
    }

    #[test]
    fn test_options_json_roundtrip() {
        let options = CompilerOptions {
            declaration_only: true,
            extra_directives: vec![DirectiveDescriptor::single_line("model")
                .token(DirectiveTokenKind::Type, "ModelType")],
            ..CompilerOptions::default()
        };
        let json = options.to_json().unwrap();
        assert_eq!(CompilerOptions::from_json(&json).unwrap(), options);
    }

    #[test]
    fn test_invalid_json_is_an_options_error() {
        let err = CompilerOptions::from_json("{\"design_time\": 3}").unwrap_err();
        assert!(matches!(err, CompileError::InvalidOptions(_)));
    }

    #[test]
    fn test_unknown_pass_is_rejected() {
        let options = CompilerOptions {
            passes: Some(vec!["component-binding".into(), "minify".into()]),
            ..CompilerOptions::default()
        };
        let err = CompilerConfig::from_options(&options).unwrap_err();
        assert_eq!(err, CompileError::UnknownPass("minify".into()));
    }

    #[test]
    fn test_duplicate_directive_is_rejected() {
        let options = CompilerOptions {
            extra_directives: vec![DirectiveDescriptor::single_line("page")],
            ..CompilerOptions::default()
        };
        let err = CompilerConfig::from_options(&options).unwrap_err();
        assert_eq!(
            err,
            CompileError::Descriptor(DescriptorError::DuplicateDirective("page".into()))
        );
    }

    #[test]
    fn test_extra_directive_is_registered() {
        let options = CompilerOptions {
            extra_directives: vec![DirectiveDescriptor::single_line("model")
                .token(DirectiveTokenKind::Type, "ModelType")],
            ..CompilerOptions::default()
        };
        let config = CompilerConfig::from_options(&options).unwrap();
        assert!(config.registry.contains("model"));
    }

    #[test]
    fn test_with_phase_shares_pipeline() {
        let config = CompilerConfig::default();
        let declaration = config.with_phase(CompilationPhase::DeclarationOnly);
        assert_eq!(declaration.phase, CompilationPhase::DeclarationOnly);
        assert!(Arc::ptr_eq(&config.pipeline, &declaration.pipeline));
        assert!(Arc::ptr_eq(&config.registry, &declaration.registry));
    }
}
