use crate::util::parse_int;

/// Splits a single cell into sub-values separated by a one-byte delimiter.
///
/// An empty cell yields exactly one empty token. Otherwise every delimiter
/// ends a token and one more token follows the last delimiter, so `"1;"`
/// yields `"1"` and `""`. Once the cursor has moved past the end of the
/// text the splitter is exhausted.
///
/// ```
/// let mut s = tablekit_runtime::ColumnSplitter::new("1;x;", b';');
/// assert_eq!(s.next_int(), Some(1));
/// assert_eq!(s.next_str(), Some("x"));
/// assert_eq!(s.next_str(), Some(""));
/// assert_eq!(s.next_str(), None);
/// ```
#[derive(Debug, Clone)]
pub struct ColumnSplitter<'a> {
    text: &'a str,
    delimiter: u8,
    index: usize,
}

impl<'a> ColumnSplitter<'a> {
    /// Create a splitter over `text`. The delimiter must be an ASCII byte.
    pub fn new(text: &'a str, delimiter: u8) -> ColumnSplitter<'a> {
        debug_assert!(delimiter.is_ascii());
        ColumnSplitter {
            text,
            delimiter,
            index: 0,
        }
    }

    /// Retrieves the byte offset of the next token. It ends up as
    /// `text.len() + 1` when the splitter is exhausted.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` once every token has been read.
    pub fn is_exhausted(&self) -> bool {
        self.index > self.text.len()
    }

    /// Read the next token as text.
    pub fn next_str(&mut self) -> Option<&'a str> {
        let len = self.text.len();
        if self.index > len {
            return None;
        }
        if self.index == len {
            self.index += 1;
            return Some("");
        }

        let rest = &self.text.as_bytes()[self.index..];
        let start = self.index;
        match rest.iter().position(|&b| b == self.delimiter) {
            Some(offset) => {
                self.index = start + offset + 1;
                Some(&self.text[start..start + offset])
            }
            None => {
                self.index = len + 1;
                Some(&self.text[start..])
            }
        }
    }

    /// Read the next token as a 32-bit integer. Malformed numbers read as
    /// zero; only a missing token is reported.
    pub fn next_int(&mut self) -> Option<i32> {
        self.next_str().map(parse_int)
    }
}

impl<'a> Iterator for ColumnSplitter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.next_str()
    }
}
