//! Source mapping: generated text region ↔ template source region.
//!
//! Every mapping covers a run of user code that was copied verbatim from the
//! template, so a mapped region has the same length on both sides and
//! positions inside it translate by a constant offset. Mappings are kept in
//! generated order and never overlap on the generated side; the same source
//! region may appear more than once (a bound expression is written twice
//! for a two-way binding).

use serde::{Deserialize, Serialize};
use stencil_types::Span;

use crate::error::{CodegenError, CodegenResult};

/// Position of a mapped region in the generated text. `line`/`column` are
/// 1-based, counted in characters like [`Span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSpan {
    pub offset: usize,
    pub len: usize,
    pub line: u32,
    pub column: u32,
}

impl GeneratedSpan {
    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }
}

/// One generated region and the template region it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapping {
    pub generated: GeneratedSpan,
    pub original: Span,
}

/// All mappings of one generated document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMap {
    /// Name of the template the original spans point into.
    pub file: String,
    pub mappings: Vec<SourceMapping>,
}

impl SourceMap {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            mappings: Vec::new(),
        }
    }

    /// Append a mapping. Empty regions are skipped; a region starting
    /// before the previous one ended is rejected.
    pub fn push(&mut self, mapping: SourceMapping) -> CodegenResult<()> {
        if mapping.generated.len == 0 || mapping.original.len == 0 {
            return Ok(());
        }
        if let Some(last) = self.mappings.last() {
            let previous_end = last.generated.end_offset();
            if mapping.generated.offset < previous_end {
                return Err(CodegenError::NonMonotonicMapping {
                    offset: mapping.generated.offset,
                    previous_end,
                });
            }
        }
        self.mappings.push(mapping);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceMapping> {
        self.mappings.iter()
    }

    /// Whether generated regions are strictly increasing and disjoint.
    pub fn is_monotonic(&self) -> bool {
        self.mappings
            .windows(2)
            .all(|w| w[0].generated.end_offset() <= w[1].generated.offset)
    }

    /// The mapping whose generated region contains `offset`.
    pub fn find_by_generated(&self, offset: usize) -> Option<&SourceMapping> {
        let idx = self
            .mappings
            .partition_point(|m| m.generated.end_offset() <= offset);
        self.mappings
            .get(idx)
            .filter(|m| m.generated.offset <= offset)
    }

    /// Mappings whose original region contains `offset`, in generated order.
    pub fn find_by_original(&self, offset: usize) -> Vec<&SourceMapping> {
        self.mappings
            .iter()
            .filter(|m| offset >= m.original.offset && offset < m.original.end_offset())
            .collect()
    }

    /// Translate a generated offset back into the template.
    pub fn to_original(&self, generated_offset: usize) -> Option<usize> {
        let m = self.find_by_generated(generated_offset)?;
        Some(m.original.offset + (generated_offset - m.generated.offset))
    }

    /// Translate a template offset to its first generated position.
    pub fn to_generated(&self, original_offset: usize) -> Option<usize> {
        let m = self.find_by_original(original_offset).into_iter().next()?;
        Some(m.generated.offset + (original_offset - m.original.offset))
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(data: &[u8]) -> Option<Self> {
        serde_json::from_slice(data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_types::SourceFile;

    fn mapping(gen: usize, src: &SourceFile, offset: usize, len: usize) -> SourceMapping {
        SourceMapping {
            generated: GeneratedSpan {
                offset: gen,
                len,
                line: 1,
                column: gen as u32 + 1,
            },
            original: src.span(offset, len),
        }
    }

    #[test]
    fn round_trip_json() {
        let src = SourceFile::new("Counter.stencil", "<p>@count</p>\n@code { int count; }");
        let mut sm = SourceMap::new("Counter.stencil");
        sm.push(mapping(10, &src, 4, 5)).unwrap();
        sm.push(mapping(40, &src, 21, 11)).unwrap();

        let json = sm.to_json();
        let sm2 = SourceMap::from_json(&json).expect("parse failed");
        assert_eq!(sm2, sm);
        assert_eq!(sm2.mappings[1].original.start_line, 2);
        assert!(SourceMap::from_json(b"{").is_none());
    }

    #[test]
    fn rejects_overlap_and_skips_empty() {
        let src = SourceFile::new("a.stencil", "@abc @def");
        let mut sm = SourceMap::new("a.stencil");
        sm.push(mapping(5, &src, 1, 3)).unwrap();
        sm.push(mapping(8, &src, 6, 0)).unwrap();
        assert_eq!(sm.len(), 1);
        let err = sm.push(mapping(7, &src, 6, 3)).unwrap_err();
        assert_eq!(
            err,
            CodegenError::NonMonotonicMapping {
                offset: 7,
                previous_end: 8
            }
        );
        sm.push(mapping(8, &src, 6, 3)).unwrap();
        assert!(sm.is_monotonic());
    }

    #[test]
    fn translates_both_directions() {
        let src = SourceFile::new("a.stencil", "@abc @def");
        let mut sm = SourceMap::new("a.stencil");
        sm.push(mapping(20, &src, 1, 3)).unwrap();
        sm.push(mapping(50, &src, 6, 3)).unwrap();
        sm.push(mapping(70, &src, 6, 3)).unwrap();

        assert_eq!(sm.to_original(21), Some(2));
        assert_eq!(sm.to_original(23), None);
        assert_eq!(sm.to_original(52), Some(8));
        assert_eq!(sm.to_generated(7), Some(51));
        assert_eq!(sm.find_by_original(6).len(), 2);
        assert_eq!(sm.to_generated(0), None);
    }
}
