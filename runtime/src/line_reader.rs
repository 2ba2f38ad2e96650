/// Cells of one row, in column order.
pub type LineBuffer = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// At the start of a cell.
    Normal,
    /// Inside a non-empty cell.
    ReadColumn,
    /// One or more `\r` seen, waiting for `\n`.
    ReadNewline,
}

/// Splits table text into rows of cells.
///
/// Rows end with CRLF and cells are separated by tabs. A cell wrapped in
/// double quotes has the quotes stripped and every `""` inside turned into
/// a single `"`. The last row may omit its CRLF.
///
/// ```
/// let mut r = tablekit_runtime::LineReader::new("a\tb\r\nc\td");
/// assert_eq!(r.next_line(), Some(vec!["a".to_owned(), "b".to_owned()]));
/// assert_eq!(r.next_line(), Some(vec!["c".to_owned(), "d".to_owned()]));
/// assert_eq!(r.next_line(), None);
/// ```
#[derive(Debug, Clone)]
pub struct LineReader<'a> {
    text: &'a str,
    index: usize,
}

impl<'a> LineReader<'a> {
    pub fn new(text: &'a str) -> LineReader<'a> {
        LineReader { text, index: 0 }
    }

    /// Retrieves the byte offset where the next row starts.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Read the next row, or `None` at the end of the text.
    pub fn next_line(&mut self) -> Option<LineBuffer> {
        let bytes = self.text.as_bytes();
        if self.index >= bytes.len() {
            return None;
        }

        let mut line = LineBuffer::new();
        let mut status = Status::Normal;
        let mut col_start = self.index;

        for i in self.index..bytes.len() {
            let c = bytes[i];
            match status {
                Status::Normal => match c {
                    b'\t' => {
                        line.push(String::new());
                        col_start = i + 1;
                    }
                    b'\r' => status = Status::ReadNewline,
                    _ => status = Status::ReadColumn,
                },
                Status::ReadColumn => match c {
                    b'\t' => {
                        line.push(self.column(col_start, i));
                        col_start = i + 1;
                        status = Status::Normal;
                    }
                    b'\r' => status = Status::ReadNewline,
                    _ => {}
                },
                Status::ReadNewline => match c {
                    b'\n' => {
                        // drop the `\r` right before the `\n`
                        line.push(self.column(col_start, i - 1));
                        self.index = i + 1;
                        return Some(line);
                    }
                    b'\r' => {}
                    _ => status = Status::ReadColumn,
                },
            }
        }

        // last row without a line ending
        line.push(self.column(col_start, bytes.len()));
        self.index = bytes.len();
        Some(line)
    }

    fn column(&self, start: usize, end: usize) -> String {
        let cell = &self.text[start..end];
        let bytes = cell.as_bytes();
        if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
            cell[1..cell.len() - 1].replace("\"\"", "\"")
        } else {
            cell.to_owned()
        }
    }
}

impl<'a> Iterator for LineReader<'a> {
    type Item = LineBuffer;

    fn next(&mut self) -> Option<LineBuffer> {
        self.next_line()
    }
}
