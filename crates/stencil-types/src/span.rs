use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span.
///
/// `offset`/`len` are byte positions into the source text. Line/column
/// values are 1-based; `end_col` is the column just past the last byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
    #[serde(rename = "line")]
    pub start_line: u32,
    #[serde(rename = "column")]
    pub start_col: u32,
    pub end_line: u32,
    #[serde(rename = "end_column")]
    pub end_col: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(
        offset: usize,
        len: usize,
        start_line: u32,
        start_col: u32,
        end_line: u32,
        end_col: u32,
    ) -> Self {
        Self {
            offset,
            len,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a zero-width span at a single position.
    pub fn point(offset: usize, line: u32, col: u32) -> Self {
        Self::new(offset, 0, line, col, line, col)
    }

    /// Byte offset just past the end of the span.
    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Zero-width span at the end of this span.
    pub fn end_point(&self) -> Span {
        Span::point(self.end_offset(), self.end_line, self.end_col)
    }

    /// Whether `offset` falls inside the span. Empty spans contain their
    /// own position.
    pub fn contains_offset(&self, offset: usize) -> bool {
        if self.len == 0 {
            offset == self.offset
        } else {
            offset >= self.offset && offset < self.end_offset()
        }
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        let (first, second) = if other.offset < self.offset {
            (other, self)
        } else {
            (self, other)
        };
        let (last_end, end_line, end_col) = if second.end_offset() >= first.end_offset() {
            (second.end_offset(), second.end_line, second.end_col)
        } else {
            (first.end_offset(), first.end_line, first.end_col)
        };
        Span::new(
            first.offset,
            last_end - first.offset,
            first.start_line,
            first.start_col,
            end_line,
            end_col,
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Holds the source text of one template together with its identity.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path-like identity supplied by the caller.
    pub name: String,
    pub source: String,
    /// Cached line start byte offsets for fast line lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number, without its line
    /// terminator.
    ///
    /// Returns `None` if the line number is out of range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        if idx >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or(self.source.len());
        let line = &self.source[start..end];
        Some(line.trim_end_matches('\r'))
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// 1-based (line, column) of a byte offset. Offsets past the end clamp
    /// to the end of the text.
    pub fn location(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source.len());
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = self.source[self.line_starts[idx]..offset].chars().count();
        (idx as u32 + 1, col as u32 + 1)
    }

    /// Build a span for `len` bytes starting at `offset`.
    pub fn span(&self, offset: usize, len: usize) -> Span {
        let (start_line, start_col) = self.location(offset);
        let (end_line, end_col) = self.location(offset + len);
        Span::new(offset, len, start_line, start_col, end_line, end_col)
    }

    /// The text covered by a span, or `""` when the span is out of bounds.
    pub fn slice(&self, span: Span) -> &str {
        self.source.get(span.offset..span.end_offset()).unwrap_or("")
    }

    /// The file stem of `name` (`Pages/Counter.stencil` → `Counter`).
    pub fn stem(&self) -> &str {
        let file = self.name.rsplit(['/', '\\']).next().unwrap_or(&self.name);
        match file.rfind('.') {
            Some(0) | None => file,
            Some(dot) => &file[..dot],
        }
    }

    /// Directory segments of `name`, outermost first.
    pub fn directories(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self
            .name
            .split(['/', '\\'])
            .filter(|p| !p.is_empty() && *p != ".")
            .collect();
        parts.pop();
        parts
    }
}
