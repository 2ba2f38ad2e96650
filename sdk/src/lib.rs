//! tablekit
//!
//! Facade over the tablekit compiler and runtime.
//!
//! - Define file analysis, filtering and code generation (re-exported from the compiler)
//! - Table text readers used by generated code (re-exported from the runtime)
//! - JSON rendering of an analyzed descriptor

use serde::Serialize;
use std::io;

pub use tablekit_compiler::error::CompileError;
pub use tablekit_compiler::types::Descriptor;
pub use tablekit_compiler::{
    compile_schema, cut_tables, filter_by_reader, generate_for_reader, load_schema,
    CodeGenerator, Language, NewLineType,
};
pub use tablekit_runtime::{ColumnSplitter, LineReader, ParseValue, TableParseError};

/// Render any serializable value as pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, CompileError> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    Ok(json)
}

/// Render a descriptor as pretty-printed JSON.
pub fn descriptor_to_json(descriptor: &Descriptor) -> Result<String, CompileError> {
    to_json(descriptor)
}

pub mod error {
    pub use tablekit_compiler::error::CompileError;
    pub use tablekit_runtime::TableParseError;
}

pub mod types {
    pub use tablekit_compiler::types::*;
}

pub mod runtime {
    pub use tablekit_runtime::*;
}
