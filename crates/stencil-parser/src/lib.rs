//! Stencil parser: converts template source into a lossless syntax tree.
//!
//! The parser never fails. Malformed input yields `Missing` tokens, error
//! nodes, and diagnostics attached to the smallest enclosing node, and the
//! tree always reproduces the source text exactly.

mod parse_code;
mod parse_directive;
mod parse_markup;
mod parser;

pub use parser::{ParseResult, Parser};

use stencil_types::{DirectiveRegistry, FileKind, SourceFile};

/// Parse a source file with the given directive registry.
pub fn parse(source: &SourceFile, file_kind: FileKind, registry: &DirectiveRegistry) -> ParseResult {
    Parser::new(source, file_kind, registry).parse()
}
