//! Shared types for the stencil template compiler.
//!
//! This crate defines source spans, diagnostics, tokens, the lossless syntax
//! tree, component and directive descriptors, and the IR tree used by every
//! compiler stage.

mod error;
mod span;
pub mod descriptor;
pub mod ir;
pub mod syntax;
pub mod token;

pub use descriptor::{
    BoundAttributeDescriptor, ComponentDescriptor, DescriptorError, DirectiveDescriptor,
    DirectiveKind, DirectiveRegistry, DirectiveTokenDescriptor, DirectiveTokenKind,
    DirectiveUsage,
};
pub use error::{
    render_template, Diagnostic, Diagnostics, ErrorCategory, ErrorCode, Severity, MAX_ERRORS,
};
pub use ir::{DocumentShape, IrDocument, IrKind, IrNodeId};
pub use span::{SourceFile, Span};
pub use syntax::{FileKind, NodeId, SyntaxKind, SyntaxTree};
pub use token::{Token, TokenKind, TokenMode};
