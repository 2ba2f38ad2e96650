use crate::{error::CompileError, types::Descriptor};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Line ending used for every generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewLineType {
    #[default]
    Unix,
    Dos,
}

impl NewLineType {
    pub fn as_str(self) -> &'static str {
        match self {
            NewLineType::Unix => "\n",
            NewLineType::Dos => "\r\n",
        }
    }

    /// Rewrites `\n`-terminated text to this line ending.
    pub fn apply(self, text: String) -> String {
        match self {
            NewLineType::Unix => text,
            NewLineType::Dos => text.replace('\n', "\r\n"),
        }
    }
}

impl FromStr for NewLineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unix" => Ok(NewLineType::Unix),
            "dos" => Ok(NewLineType::Dos),
            other => Err(format!("new line type `{}` is not supported", other)),
        }
    }
}

/// A target language backend.
///
/// `descriptor` must already be filtered for `reader`. One artifact set is
/// written per global struct and per table, in declaration order. The
/// first write failure is returned immediately; files written before it
/// are left in place.
pub trait CodeGenerator {
    fn generate(
        &self,
        descriptor: &Descriptor,
        reader: &str,
        output_dir: &Path,
        new_line_type: NewLineType,
    ) -> Result<(), CompileError>;
}

pub(crate) fn write_artifact(
    output_dir: &Path,
    file_name: &str,
    content: &str,
) -> Result<(), CompileError> {
    let path = output_dir.join(file_name);
    fs::write(&path, content).map_err(|source| CompileError::Write {
        path: path.clone(),
        source,
    })?;
    debug!("wrote {}", path.display());
    Ok(())
}
