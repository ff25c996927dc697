use sedge::text::TextSize;

/// Byte-offset to line/column mapping over one source text.
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<u32>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// Zero-based line and column (in bytes) for an offset.
    #[must_use]
    pub fn line_col(&self, offset: TextSize) -> (u32, u32) {
        let offset = offset.into();
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        (line as u32, offset - self.line_starts[line])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("1 + pi");
        assert_eq!(index.line_col(TextSize::from(0)), (0, 0));
        assert_eq!(index.line_col(TextSize::from(4)), (0, 4));
    }

    #[test]
    fn test_multi_line() {
        let index = LineIndex::new("a\nbb\nccc");
        assert_eq!(index.line_col(TextSize::from(0)), (0, 0));
        assert_eq!(index.line_col(TextSize::from(2)), (1, 0));
        assert_eq!(index.line_col(TextSize::from(3)), (1, 1));
        assert_eq!(index.line_col(TextSize::from(5)), (2, 0));
        assert_eq!(index.line_col(TextSize::from(8)), (2, 3));
    }

    #[test]
    fn test_offset_at_newline() {
        let index = LineIndex::new("a\nb");
        assert_eq!(index.line_col(TextSize::from(1)), (0, 1));
    }
}
