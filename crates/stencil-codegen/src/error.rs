//! Codegen error types.

use thiserror::Error;

/// Errors that can occur while generating code from an IR document.
///
/// These are contract violations between the compiler stages, never user
/// mistakes; user mistakes are diagnostics on the IR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The IR lacks a boilerplate node the generator relies on.
    #[error("IR document has no {0} node")]
    MissingNode(&'static str),

    /// A node that must map back to source has no span.
    #[error("{0} node has no source span")]
    MissingSpan(&'static str),

    /// A mapping points outside the original source text.
    #[error("mapping {offset}..{end} lies outside the source ({source_len} bytes)")]
    MappingOutOfBounds {
        offset: usize,
        end: usize,
        source_len: usize,
    },

    /// A mapping starts before the previous one ended.
    #[error("mapping at generated offset {offset} overlaps the previous mapping ending at {previous_end}")]
    NonMonotonicMapping { offset: usize, previous_end: usize },

    /// An internal consistency check failed.
    #[error("internal codegen error: {0}")]
    Internal(String),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
