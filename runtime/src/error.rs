use thiserror::Error;

/// Failure raised by a generated table parser. Every variant names the
/// logical line it happened on (1 is the comment line, 2 the name line).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableParseError {
    #[error("comment line is required")]
    MissingCommentLine,

    #[error("name line is required")]
    MissingNameLine,

    #[error("line {line} column count {found} is invalid, should be {expected}")]
    ColumnCount {
        line:     usize,
        found:    usize,
        expected: usize,
    },

    /// `column` is 1-based.
    #[error("column {column} should be named as `{name}`")]
    ColumnName {
        column: usize,
        name:   String,
    },

    #[error("line {line} key `{key}` is empty")]
    EmptyKey {
        line: usize,
        key:  String,
    },

    #[error("line {line} key `{key}` value {value} is duplicated")]
    DuplicateKey {
        line:  usize,
        key:   String,
        value: String,
    },

    #[error("line {line} column `{column}` value is invalid")]
    InvalidValue {
        line:   usize,
        column: String,
    },
}

impl TableParseError {
    /// Logical line number of the offending row.
    pub fn line(&self) -> usize {
        match self {
            TableParseError::MissingCommentLine => 1,
            TableParseError::MissingNameLine | TableParseError::ColumnName { .. } => 2,
            TableParseError::ColumnCount { line, .. }
            | TableParseError::EmptyKey { line, .. }
            | TableParseError::DuplicateKey { line, .. }
            | TableParseError::InvalidValue { line, .. } => *line,
        }
    }
}
