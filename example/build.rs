// example/build.rs

use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use tablekit_compiler::{generate_for_reader, load_schema, Language, NewLineType};

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=tables.xml");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let descriptor = load_schema(Path::new("tables.xml"))?;

    // Only what the client reads ends up in the generated code.
    generate_for_reader(descriptor, "client", Language::Rust, &out_dir, NewLineType::Unix)?;
    Ok(())
}
