//! Runtime helpers for parsing the tab-delimited table text format. Code
//! generated by the tablekit compiler calls into this crate at data-load
//! time.
//!
//! A table file is a sequence of CRLF-terminated rows whose cells are
//! separated by tabs. The first row is a free-form comment line, the second
//! names every column, and data rows follow.
//!
//! ```
//! use tablekit_runtime::*;
//!
//! let mut r = LineReader::new("comment\t\r\nid\tname\r\n1\t\"a\"\"b\"\r\n");
//! assert_eq!(r.next_line(), Some(vec!["comment".to_owned(), "".to_owned()]));
//! assert_eq!(r.next_line(), Some(vec!["id".to_owned(), "name".to_owned()]));
//! assert_eq!(r.next_line(), Some(vec!["1".to_owned(), "a\"b".to_owned()]));
//! assert_eq!(r.next_line(), None);
//! ```

pub mod column_splitter;
pub mod error;
pub mod line_reader;
pub mod util;

pub use column_splitter::*;
pub use error::*;
pub use line_reader::*;

/// Delimiter between the elements of a `list{...}` cell.
pub const LIST_DELIMITER: u8 = b'|';
/// Delimiter between the fields of a struct cell.
pub const STRUCT_DELIMITER: u8 = b';';

/// Implemented by generated struct types so that cells (and list elements)
/// can be decoded into them.
pub trait ParseValue: Sized {
    /// Decodes one struct cell. Returns `None` when a field is missing or
    /// the cell carries trailing data after the last field.
    fn parse(text: &str) -> Option<Self>;
}
