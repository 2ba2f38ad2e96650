use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tablekit::{descriptor_to_json, filter_by_reader};
use tablekit_compiler::error::CompileError;
use tablekit_compiler::{cut_tables, generate_for_reader, load_schema, Language, NewLineType};

#[derive(Parser)]
#[command(name = "tablekit")]
#[command(about = "Generate table parsers from a define file, or cut table data files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate table parsers for one reader
    Compile {
        /// Define file
        #[arg(short = 'f', long = "file")]
        define_file: PathBuf,

        /// Target language (`cpp` or `rust`)
        #[arg(short, long)]
        language: Language,

        /// Reader to generate code for
        #[arg(short, long)]
        reader: String,

        /// Output directory, must exist
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Line ending of generated files (`unix` or `dos`)
        #[arg(short, long, default_value = "unix")]
        newline: NewLineType,
    },

    /// Copy table data files keeping only the columns a reader can read
    Cut {
        /// Define file
        #[arg(short = 'f', long = "file")]
        define_file: PathBuf,

        /// Reader to cut the data files for
        #[arg(short, long)]
        reader: String,

        /// Directory of the input data files
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory, must exist and differ from the input directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the analyzed define file as JSON (printed to stdout)
    Dump {
        /// Define file
        #[arg(short = 'f', long = "file")]
        define_file: PathBuf,

        /// Only show what this reader can read
        #[arg(short, long)]
        reader: Option<String>,
    },
}

fn require_dir(path: &Path, what: &str) -> Result<(), CompileError> {
    if !path.is_dir() {
        return Err(CompileError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("can not find {} directory `{}`", what, path.display()),
        )));
    }
    Ok(())
}

fn main() -> Result<(), CompileError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { define_file, language, reader, output, newline } => {
            require_dir(&output, "output")?;
            let descriptor = load_schema(&define_file)?;
            generate_for_reader(descriptor, &reader, language, &output, newline)?;
            println!(
                "Compiled {} ({}, reader `{}`) → {}",
                define_file.display(),
                language,
                reader,
                output.display()
            );
            Ok(())
        }

        Commands::Cut { define_file, reader, input, output } => {
            require_dir(&input, "input")?;
            require_dir(&output, "output")?;
            if fs::canonicalize(&input)? == fs::canonicalize(&output)? {
                return Err(CompileError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "output directory can not be same as input directory",
                )));
            }
            let descriptor = load_schema(&define_file)?;
            cut_tables(&descriptor, &reader, &input, &output)?;
            println!("Cut {} → {}", input.display(), output.display());
            Ok(())
        }

        Commands::Dump { define_file, reader } => {
            let mut descriptor = load_schema(&define_file)?;
            if let Some(reader) = reader {
                descriptor = filter_by_reader(descriptor, &reader)?;
            }
            debug!(tables = descriptor.tables.len(), "dumping descriptor");
            println!("{}", descriptor_to_json(&descriptor)?);
            Ok(())
        }
    }
}
