use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed define file, unexpected node or missing attribute.
    #[error("error:{path}:{line}: {msg}")]
    Syntax {
        path: String,
        line: usize,
        msg:  String,
    },

    /// Duplicated or undefined names, bad types, bad keys.
    #[error("error:{path}:{line}: {msg}")]
    Semantic {
        path: String,
        line: usize,
        msg:  String,
    },

    #[error("reader `{0}` is not defined")]
    UnknownReader(String),

    #[error("write file {} failed: {source}", path.display())]
    Write {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("Verifier error: {0}")]
    Verify(String),

    #[error("input file `{file}`: {msg}")]
    Cut {
        file: String,
        msg:  String,
    },

    #[error("language `{0}` is not supported")]
    UnsupportedLanguage(String),
}

impl CompileError {
    /// Line number in the define file, for errors that carry one.
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::Syntax { line, .. } | CompileError::Semantic { line, .. } => Some(*line),
            _ => None,
        }
    }
}
