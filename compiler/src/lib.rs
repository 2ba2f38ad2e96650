//! tablekit-compiler
//!
//! This crate implements:
//!  1) A define file analyzer (`parse_schema`) building a `Descriptor` of
//!     readers, global structs and tables out of the XML schema,
//!  2) A descriptor verifier (identifiers, duplicates, key columns, struct references),
//!  3) The reader view filter (`filter_by_reader`),
//!  4) Code generation through the `CodeGenerator` trait, with a C++ and a Rust backend,
//!  5) The data file cutter (`cut_tables`), and error types (`CompileError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod parser;
pub mod verifier;
pub mod filter;
pub mod traits;
pub mod gen_cpp;
pub mod gen_rust;
pub mod cutter;
pub mod compiler;

pub use compiler::{compile_schema, generate_for_reader, generator_for, load_schema, Language};
pub use cutter::{cut_table, cut_tables};
pub use filter::filter_by_reader;
pub use gen_cpp::CppCodeGenerator;
pub use gen_rust::RustCodeGenerator;
pub use parser::parse_schema;
pub use traits::{CodeGenerator, NewLineType};
