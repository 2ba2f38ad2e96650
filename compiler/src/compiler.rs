use crate::{
    error::CompileError,
    filter::filter_by_reader,
    gen_cpp::CppCodeGenerator,
    gen_rust::RustCodeGenerator,
    parser::parse_schema,
    traits::{CodeGenerator, NewLineType},
    types::Descriptor,
    verifier::verify_descriptor,
};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Target language of the generated table parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Cpp,
    Rust,
}

impl FromStr for Language {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpp" => Ok(Language::Cpp),
            "rust" => Ok(Language::Rust),
            other => Err(CompileError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Cpp => write!(f, "cpp"),
            Language::Rust => write!(f, "rust"),
        }
    }
}

/// Returns the code generator for `language`.
pub fn generator_for(language: Language) -> Box<dyn CodeGenerator> {
    match language {
        Language::Cpp => Box::new(CppCodeGenerator),
        Language::Rust => Box::new(RustCodeGenerator),
    }
}

/// Analyze a define file's text into a verified `Descriptor`.
/// `file_path` is only used in diagnostics.
pub fn compile_schema(text: &str, file_path: &str) -> Result<Descriptor, CompileError> {
    let descriptor = parse_schema(text, file_path)?;
    verify_descriptor(&descriptor)?;
    Ok(descriptor)
}

/// Read and analyze the define file at `path`.
pub fn load_schema(path: &Path) -> Result<Descriptor, CompileError> {
    let text = fs::read_to_string(path)?;
    compile_schema(&text, &path.display().to_string())
}

/// Filter `descriptor` for `reader`, then write its artifacts for
/// `language` into `output_dir`.
pub fn generate_for_reader(
    descriptor: Descriptor,
    reader: &str,
    language: Language,
    output_dir: &Path,
    new_line_type: NewLineType,
) -> Result<(), CompileError> {
    let filtered = filter_by_reader(descriptor, reader)?;
    verify_descriptor(&filtered)?;

    generator_for(language).generate(&filtered, reader, output_dir, new_line_type)?;

    info!(
        language = %language,
        tables = filtered.tables.len(),
        "compiled {} for reader `{}`",
        filtered.file_path,
        reader
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_names() {
        assert_eq!("cpp".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("rust".parse::<Language>().unwrap(), Language::Rust);
        let err = "csharp".parse::<Language>().unwrap_err();
        assert_eq!(err.to_string(), "language `csharp` is not supported");
        assert_eq!(Language::Rust.to_string(), "rust");
    }

    #[test]
    fn compile_schema_reports_path_and_line() {
        let err = compile_schema("<define>\n<reader/>\n</define>", "bad.xml").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().starts_with("error:bad.xml:2: "));
    }

    #[test]
    fn load_schema_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_schema(&dir.path().join("nope.xml")).unwrap_err();
        assert!(matches!(err, CompileError::Io(_)));
    }
}
