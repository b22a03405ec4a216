//! Indenting text writer that tracks its own position and records source
//! mappings for verbatim user code.

use stencil_types::Span;

use crate::error::{CodegenError, CodegenResult};
use crate::source_map::{GeneratedSpan, SourceMap, SourceMapping};

const INDENT: &str = "    ";

/// Line-oriented writer for generated C#.
///
/// Indentation is applied lazily at the first write on a line, so mapped
/// user code that spans several lines is copied exactly as written.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buffer: String,
    indent_level: usize,
    line: u32,
    column: u32,
    source_map: SourceMap,
    source_len: usize,
}

impl CodeWriter {
    /// A writer for code generated from `file`, whose text is `source_len`
    /// bytes long.
    pub fn new(file: impl Into<String>, source_len: usize) -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            line: 1,
            column: 1,
            source_map: SourceMap::new(file),
            source_len,
        }
    }

    /// Current byte offset in the output.
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Current 1-based line.
    pub fn line_number(&self) -> u32 {
        self.line
    }

    /// Current 1-based column.
    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn at_line_start(&self) -> bool {
        self.column == 1
    }

    /// Width of the indentation a fresh line receives.
    pub fn indent_width(&self) -> usize {
        self.indent_level * INDENT.len()
    }

    pub fn file(&self) -> &str {
        &self.source_map.file
    }

    /// Add a line of code with current indentation.
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.write(s);
        self.newline()
    }

    /// Add a blank line.
    pub fn blank(&mut self) -> &mut Self {
        self.ensure_line_start();
        self.newline()
    }

    /// Add text, indenting first if at the start of a line.
    pub fn write(&mut self, s: &str) -> &mut Self {
        if s.is_empty() {
            return self;
        }
        self.write_indent();
        self.push_text(s);
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.push_text("\n");
        self
    }

    /// End the current line unless nothing has been written on it.
    pub fn ensure_line_start(&mut self) -> &mut Self {
        if !self.at_line_start() {
            self.newline();
        }
        self
    }

    /// A preprocessor line. Always starts at column 1 on its own line.
    pub fn directive(&mut self, s: &str) -> &mut Self {
        self.ensure_line_start();
        self.push_text(s);
        self.newline()
    }

    /// Increase indentation level.
    pub fn indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    /// Decrease indentation level.
    pub fn dedent(&mut self) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    /// `header`, then a braced, indented body.
    pub fn block<F>(&mut self, header: &str, f: F) -> CodegenResult<()>
    where
        F: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        self.ensure_line_start();
        self.line(header).line("{").indent();
        f(self)?;
        self.ensure_line_start();
        self.dedent().line("}");
        Ok(())
    }

    /// Copy user code verbatim and map it back to `original`.
    pub fn write_mapped(&mut self, text: &str, original: Span) -> CodegenResult<()> {
        if original.end_offset() > self.source_len {
            return Err(CodegenError::MappingOutOfBounds {
                offset: original.offset,
                end: original.end_offset(),
                source_len: self.source_len,
            });
        }
        if text.is_empty() {
            return Ok(());
        }
        self.write_indent();
        let generated = GeneratedSpan {
            offset: self.offset(),
            len: text.len(),
            line: self.line,
            column: self.column,
        };
        self.push_text(text);
        self.source_map.push(SourceMapping {
            generated,
            original,
        })
    }

    /// Consume the writer, returning the text and its mappings.
    pub fn finish(self) -> (String, SourceMap) {
        (self.buffer, self.source_map)
    }

    fn write_indent(&mut self) {
        if self.at_line_start() {
            for _ in 0..self.indent_level {
                self.push_text(INDENT);
            }
        }
    }

    fn push_text(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.buffer.push_str(s);
    }
}
