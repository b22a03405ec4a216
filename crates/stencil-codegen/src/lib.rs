//! Stencil code generator: lowered IR to C# source plus a source map.
//!
//! # Output shapes
//!
//! - **Component**: a partial class deriving from the component base with a
//!   `BuildRenderTree` override made of render-tree builder calls.
//! - **Page / legacy view**: a partial class with an `ExecuteAsync`
//!   override writing markup through `WriteLiteral` / `Write`.
//!
//! # Modes and phases
//!
//! Optimized output maps user code and fences statement blocks with
//! `#line` markers. Design-time output fences every mapped span, keeps
//! directive tokens alive in a helper method, and carries a checksum
//! pragma. The declaration phase emits only the class surface; each of its
//! lines also appears in the full output.

mod component;
mod generator;
pub mod error;
pub mod names;
pub mod options;
pub mod source_map;
mod view;
pub mod writer;

pub use error::{CodegenError, CodegenResult};
pub use generator::{generate, GeneratedCode};
pub use options::{CompilationPhase, GenerationMode, GenerationOptions, LanguageVersion};
pub use source_map::{GeneratedSpan, SourceMap, SourceMapping};
pub use writer::CodeWriter;
