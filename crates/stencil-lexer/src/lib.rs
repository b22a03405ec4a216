//! Stencil lexer: a mode-aware cursor over template source text.

pub mod lexer;

pub use lexer::{fault_code, fault_diagnostic, LexMode, LexResult, Lexer};
