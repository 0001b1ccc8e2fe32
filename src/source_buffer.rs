//! Owns the full source text of one compile and answers positional
//! questions about it. Every diagnostic carries a byte offset; this is
//! the only place that turns an offset into something a human can read.

/// A 1-based line number together with a 1-based column and the text of
/// that physical line (without the trailing newline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
    pub line_text: String,
}

pub struct SourceBuffer {
    text: String,
    /// Byte offset of every `\n` in `text`, in ascending order.
    newlines: Vec<usize>,
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let newlines = text
            .bytes()
            .enumerate()
            .filter_map(|(i, b)| if b == b'\n' { Some(i) } else { None })
            .collect();
        SourceBuffer { text, newlines }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Index of the line containing `offset` (0-based): the number of
    /// newlines strictly before `offset`.
    fn line_index(&self, offset: usize) -> usize {
        match self.newlines.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i,
        }
    }

    /// 1-based line number of the line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_index(offset) + 1
    }

    /// 1-based column: `offset` minus the byte offset of the last `\n`
    /// strictly before it.
    pub fn column_of(&self, offset: usize) -> usize {
        let line_start = self.line_start(offset);
        offset - line_start + 1
    }

    fn line_start(&self, offset: usize) -> usize {
        let idx = self.line_index(offset);
        if idx == 0 {
            0
        } else {
            self.newlines[idx - 1] + 1
        }
    }

    fn line_end(&self, offset: usize) -> usize {
        let idx = self.line_index(offset);
        self.newlines
            .get(idx)
            .copied()
            .unwrap_or_else(|| self.text.len())
    }

    /// The full text of the physical line containing `offset`, without
    /// the trailing newline.
    pub fn line_text(&self, offset: usize) -> &str {
        let start = self.line_start(offset);
        let end = self.line_end(offset);
        &self.text[start..end.min(self.text.len())]
    }

    /// Convenience bundling `line_of`/`column_of`/`line_text`.
    pub fn line_col(&self, offset: usize) -> LineCol {
        LineCol {
            line: self.line_of(offset),
            column: self.column_of(offset),
            line_text: self.line_text(offset).to_string(),
        }
    }
}
