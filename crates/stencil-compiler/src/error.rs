//! Hard failures of a compile call.
//!
//! User mistakes in a template never surface here; they are diagnostics on
//! the compiled document. A `CompileError` means a collaborator broke its
//! contract: bad options, bad descriptors, or a generator fault under
//! `fail_fast`.

use stencil_codegen::CodegenError;
use stencil_types::DescriptorError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A configured pass name matches no known pass.
    #[error("unknown pass '{0}'")]
    UnknownPass(String),

    /// A pass name appears twice in the configured pipeline.
    #[error("pass '{0}' is listed more than once")]
    DuplicatePass(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// Compiler options could not be decoded.
    #[error("invalid compiler options: {0}")]
    InvalidOptions(String),

    /// A component descriptor list could not be decoded.
    #[error("invalid component descriptors: {0}")]
    InvalidComponents(String),
}
