use crate::{
    error::CompileError,
    traits::{write_artifact, CodeGenerator, NewLineType},
    types::{ColumnDef, ColumnType, Descriptor, FieldType, KeyType, StructDef, TableDef},
    utils::camel_to_underscore,
};
use std::path::Path;
use tracing::info;

/// Rust backend. Every global struct and every table becomes its own
/// module file, and `mod.rs` declares them all.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCodeGenerator;

impl CodeGenerator for RustCodeGenerator {
    fn generate(
        &self,
        descriptor: &Descriptor,
        reader: &str,
        output_dir: &Path,
        new_line_type: NewLineType,
    ) -> Result<(), CompileError> {
        let mut modules = Vec::new();

        for def in &descriptor.global_structs {
            let module = module_name(&def.name);
            write_artifact(
                output_dir,
                &format!("{}.rs", module),
                &new_line_type.apply(compile_global_struct(def)),
            )?;
            modules.push(module);
        }

        for def in &descriptor.tables {
            let module = module_name(&def.name);
            write_artifact(
                output_dir,
                &format!("{}.rs", module),
                &new_line_type.apply(compile_table(descriptor, def)),
            )?;
            modules.push(module);
        }

        write_artifact(
            output_dir,
            "mod.rs",
            &new_line_type.apply(compile_mod_file(descriptor, reader, &modules)),
        )?;

        info!(
            structs = descriptor.global_structs.len(),
            tables = descriptor.tables.len(),
            "generated Rust code for reader `{}` in {}",
            reader,
            output_dir.display()
        );
        Ok(())
    }
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "abstract", "as", "async", "await", "become", "box", "break", "const",
        "continue", "crate", "do", "dyn", "else", "enum", "extern", "false",
        "final", "fn", "for", "gen", "if", "impl", "in", "let", "loop",
        "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
        "ref", "return", "self", "Self", "static", "struct", "super", "trait",
        "true", "try", "type", "typeof", "unsafe", "unsized", "use", "virtual",
        "where", "while", "yield",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Module (and file stem) of a generated struct or table. `self`, `super`
/// and `crate` can not be raw identifiers, so the suffix is used here too.
fn module_name(name: &str) -> String {
    escape_rust_keyword(&camel_to_underscore(name))
}

/// Type name of a generated struct as written inside the table module.
/// Global structs are referenced by path so they never clash with `Row`.
fn struct_path(descriptor: &Descriptor, table: &TableDef, column: &ColumnDef) -> String {
    match column.struct_ref.and_then(|r| descriptor.struct_def(table, r)) {
        Some(s) if s.is_global() => {
            format!("super::{}::{}", module_name(&s.name), escape_rust_keyword(&s.name))
        }
        Some(s) => escape_rust_keyword(&s.name),
        None => String::new(),
    }
}

fn dont_edit_comment() -> String {
    "// Generated by tablekit table compiler.\n// Do not edit unless you are sure that you know what you are doing.\n"
        .to_string()
}

fn map_field_type(type_: FieldType) -> &'static str {
    match type_ {
        FieldType::Int => "i32",
        FieldType::String => "String",
    }
}

fn map_column_type(descriptor: &Descriptor, table: &TableDef, column: &ColumnDef) -> String {
    let rust_type = match column.value_type() {
        ColumnType::Int => "i32".to_string(),
        ColumnType::String => "String".to_string(),
        _ => struct_path(descriptor, table, column),
    };
    if column.is_list() {
        format!("Vec<{}>", rust_type)
    } else {
        rust_type
    }
}

/// Expression that copies the key out of `expr` without moving it.
fn key_copy(table: &TableDef, expr: &str) -> String {
    match table.key_column().type_ {
        ColumnType::Int => expr.to_string(),
        _ => format!("{}.clone()", expr),
    }
}

/// Module `mod.rs` listing every generated module in declaration order.
pub fn compile_mod_file(descriptor: &Descriptor, reader: &str, modules: &[String]) -> String {
    let mut rust_code: Vec<String> = Vec::new();
    rust_code.push(dont_edit_comment());

    if let Some(namespace) = descriptor
        .reader(reader)
        .map(|r| r.namespace_parts.join("::"))
        .filter(|ns| !ns.is_empty())
    {
        rust_code.push(format!("// Tables readable by `{}` ({}).", reader, namespace));
        rust_code.push("".to_string());
    }

    for module in modules {
        rust_code.push(format!("pub mod {};", module));
    }

    rust_code.join("\n") + "\n"
}

/// A global struct module: the struct and its `ParseValue` impl.
pub fn compile_global_struct(def: &StructDef) -> String {
    let mut rust_code: Vec<String> = Vec::new();
    rust_code.push(dont_edit_comment());

    if def.fields.is_empty() {
        rust_code.push("use tablekit_runtime::ParseValue;".to_string());
    } else {
        rust_code.push("use tablekit_runtime::{ColumnSplitter, ParseValue, STRUCT_DELIMITER};".to_string());
    }
    rust_code.push("".to_string());
    rust_code.push(generate_struct(def));

    rust_code.join("\n")
}

/// Generates a struct definition followed by its `ParseValue` impl.
fn generate_struct(def: &StructDef) -> String {
    let fields: Vec<String> = def
        .fields
        .iter()
        .map(|field| {
            format!(
                "    pub {}: {},",
                escape_rust_keyword(&field.name),
                map_field_type(field.type_)
            )
        })
        .collect();

    let name = escape_rust_keyword(&def.name);
    let derived = "#[derive(Debug, Clone, PartialEq, Eq, Default)]";
    let struct_def = if fields.is_empty() {
        format!("{}\npub struct {} {{}}\n", derived, name)
    } else {
        format!("{}\npub struct {} {{\n{}\n}}\n", derived, name, fields.join("\n"))
    };

    format!("{}\n{}", struct_def, generate_parse_value(def))
}

fn generate_parse_value(def: &StructDef) -> String {
    let mut impl_lines = Vec::new();
    impl_lines.push(format!("impl ParseValue for {} {{", escape_rust_keyword(&def.name)));

    if def.fields.is_empty() {
        impl_lines.push("    fn parse(_text: &str) -> Option<Self> {".to_string());
        impl_lines.push("        Some(Self {})".to_string());
        impl_lines.push("    }".to_string());
        impl_lines.push("}".to_string());
        return impl_lines.join("\n") + "\n";
    }

    impl_lines.push("    fn parse(text: &str) -> Option<Self> {".to_string());
    impl_lines.push("        let mut s = ColumnSplitter::new(text, STRUCT_DELIMITER);".to_string());
    impl_lines.push("        let value = Self {".to_string());
    for field in &def.fields {
        let read = match field.type_ {
            FieldType::Int => "s.next_int()?",
            FieldType::String => "s.next_str()?.to_owned()",
        };
        impl_lines.push(format!(
            "            {}: {},",
            escape_rust_keyword(&field.name),
            read
        ));
    }
    impl_lines.push("        };".to_string());
    impl_lines.push("        if s.next_str().is_some() {".to_string());
    impl_lines.push("            return None;".to_string());
    impl_lines.push("        }".to_string());
    impl_lines.push("        Some(value)".to_string());
    impl_lines.push("    }".to_string());
    impl_lines.push("}".to_string());

    impl_lines.join("\n") + "\n"
}

/// A table module: local structs, `Row`, the row collection aliases and the
/// table type with its parser and accessors.
pub fn compile_table(descriptor: &Descriptor, def: &TableDef) -> String {
    let mut rust_code: Vec<String> = Vec::new();
    rust_code.push(dont_edit_comment());

    // Imports
    let has_local_fields = def.local_structs.iter().any(|s| !s.fields.is_empty());
    let parses_struct = def.columns.iter().any(|c| c.type_ == ColumnType::Struct);
    let mut runtime_imports = vec!["util", "LineReader"];
    if has_local_fields {
        runtime_imports.push("ColumnSplitter");
    }
    if !def.local_structs.is_empty() || parses_struct {
        runtime_imports.push("ParseValue");
    }
    if has_local_fields {
        runtime_imports.push("STRUCT_DELIMITER");
    }
    runtime_imports.push("TableParseError");

    rust_code.push("use std::collections::BTreeMap;".to_string());
    rust_code.push(format!("use tablekit_runtime::{{{}}};", runtime_imports.join(", ")));
    rust_code.push("".to_string());

    for local in &def.local_structs {
        rust_code.push(generate_struct(local));
    }

    rust_code.push(generate_row(descriptor, def));
    rust_code.push(generate_table_struct(def));
    rust_code.push(generate_table_impl(descriptor, def));

    rust_code.join("\n")
}

fn generate_row(descriptor: &Descriptor, def: &TableDef) -> String {
    let fields: Vec<String> = def
        .columns
        .iter()
        .map(|column| {
            format!(
                "    pub {}: {},",
                escape_rust_keyword(&column.name),
                map_column_type(descriptor, def, column)
            )
        })
        .collect();

    let key_type = map_column_type(descriptor, def, def.key_column());
    let aliases = match def.key_type {
        KeyType::SingleKey => format!("pub type Rows = BTreeMap<{}, Row>;\n", key_type),
        KeyType::SetKey => format!(
            "pub type RowSet = Vec<Row>;\npub type RowSets = BTreeMap<{}, RowSet>;\n",
            key_type
        ),
    };

    format!(
        "#[derive(Debug, Clone, PartialEq, Default)]\npub struct Row {{\n{}\n}}\n\n{}",
        fields.join("\n"),
        aliases
    )
}

fn generate_table_struct(def: &TableDef) -> String {
    let member = match def.key_type {
        KeyType::SingleKey => "    rows: Rows,",
        KeyType::SetKey => "    row_sets: RowSets,",
    };
    format!(
        "#[derive(Debug, Clone, Default)]\npub struct {} {{\n{}\n}}\n",
        escape_rust_keyword(&def.name),
        member
    )
}

fn generate_table_impl(descriptor: &Descriptor, def: &TableDef) -> String {
    let mut impl_lines = Vec::new();
    impl_lines.push(format!("impl {} {{", escape_rust_keyword(&def.name)));
    impl_lines.push("    pub fn new() -> Self {".to_string());
    impl_lines.push("        Self::default()".to_string());
    impl_lines.push("    }".to_string());
    impl_lines.push("".to_string());
    impl_lines.push(
        "    /// Replaces the loaded rows with the content of `text`. On failure".to_string(),
    );
    impl_lines.push("    /// the previously loaded rows are kept.".to_string());
    impl_lines.push(
        "    pub fn parse(&mut self, text: &str) -> Result<(), TableParseError> {".to_string(),
    );
    impl_lines.push(format!("        const COLUMN_COUNT: usize = {};", def.columns.len()));
    impl_lines.push("        let mut r = LineReader::new(text);".to_string());
    impl_lines.push("".to_string());

    // read comment line
    impl_lines.push(
        "        let line = r.next_line().ok_or(TableParseError::MissingCommentLine)?;".to_string(),
    );
    impl_lines.push("        util::check_column_count(1, &line, COLUMN_COUNT)?;".to_string());
    impl_lines.push("".to_string());

    // read name line
    impl_lines.push(
        "        let line = r.next_line().ok_or(TableParseError::MissingNameLine)?;".to_string(),
    );
    impl_lines.push("        util::check_column_count(2, &line, COLUMN_COUNT)?;".to_string());
    for (index, column) in def.columns.iter().enumerate() {
        impl_lines.push(format!(
            "        util::check_column_name(&line, {}, \"{}\")?;",
            index, column.name
        ));
    }
    impl_lines.push("".to_string());

    match def.key_type {
        KeyType::SingleKey => impl_lines.extend(single_key_read_data_lines(descriptor, def)),
        KeyType::SetKey => impl_lines.extend(set_key_read_data_lines(descriptor, def)),
    }
    impl_lines.push("        Ok(())".to_string());
    impl_lines.push("    }".to_string());
    impl_lines.push("".to_string());
    impl_lines.extend(accessors(def));
    impl_lines.push("}".to_string());

    impl_lines.join("\n") + "\n"
}

fn empty_key_error(def: &TableDef) -> String {
    format!(
        "TableParseError::EmptyKey {{ line: line_number, key: \"{}\".to_owned() }}",
        def.key_name
    )
}

fn duplicate_key_check(def: &TableDef, map: &str, indent: &str) -> Vec<String> {
    let key = escape_rust_keyword(&def.key_name);
    vec![
        format!("{}if {}.contains_key(&row.{}) {{", indent, map, key),
        format!("{}    return Err(TableParseError::DuplicateKey {{", indent),
        format!("{}        line: line_number,", indent),
        format!("{}        key: \"{}\".to_owned(),", indent, def.key_name),
        format!("{}        value: row.{}.to_string(),", indent, key),
        format!("{}    }});", indent),
        format!("{}}}", indent),
    ]
}

/// `let row = Row { ... };` with one initializer per column.
fn build_row(descriptor: &Descriptor, def: &TableDef, binding: &str) -> Vec<String> {
    let mut lines = vec![format!("            let {} = Row {{", binding)];
    for (index, column) in def.columns.iter().enumerate() {
        let cell = format!("&line[{}]", index);
        let invalid = format!(
            ".ok_or_else(|| TableParseError::InvalidValue {{ line: line_number, column: \"{}\".to_owned() }})?",
            column.name
        );
        let value = match (column.value_type(), column.is_list()) {
            (ColumnType::Int, false) => format!("util::parse_int({})", cell),
            (ColumnType::Int, true) => format!("util::read_int_list({})", cell),
            (ColumnType::String, false) => format!("line[{}].clone()", index),
            (ColumnType::String, true) => format!("util::read_string_list({})", cell),
            (_, is_list) => {
                let struct_name = struct_path(descriptor, def, column);
                if is_list {
                    format!("util::read_struct_list::<{}>({}){}", struct_name, cell, invalid)
                } else {
                    format!("{}::parse({}){}", struct_name, cell, invalid)
                }
            }
        };
        lines.push(format!(
            "                {}: {},",
            escape_rust_keyword(&column.name),
            value
        ));
    }
    lines.push("            };".to_string());
    lines
}

fn single_key_read_data_lines(descriptor: &Descriptor, def: &TableDef) -> Vec<String> {
    let key = escape_rust_keyword(&def.key_name);
    let mut lines = vec![
        "        let mut rows = Rows::new();".to_string(),
        "        let mut line_number = 3;".to_string(),
        "        while let Some(line) = r.next_line() {".to_string(),
        "            util::check_column_count(line_number, &line, COLUMN_COUNT)?;".to_string(),
        format!("            if line[{}].is_empty() {{", def.key_column_index),
        format!("                return Err({});", empty_key_error(def)),
        "            }".to_string(),
        "".to_string(),
    ];
    lines.extend(build_row(descriptor, def, "row"));
    lines.extend(duplicate_key_check(def, "rows", "            "));
    lines.push(format!(
        "            rows.insert({}, row);",
        key_copy(def, &format!("row.{}", key))
    ));
    lines.push("            line_number += 1;".to_string());
    lines.push("        }".to_string());
    lines.push("        self.rows = rows;".to_string());
    lines
}

fn set_key_read_data_lines(descriptor: &Descriptor, def: &TableDef) -> Vec<String> {
    let key = escape_rust_keyword(&def.key_name);
    let key_type = match def.key_column().type_ {
        ColumnType::Int => "i32",
        _ => "String",
    };
    let mut lines = vec![
        "        let mut row_sets = RowSets::new();".to_string(),
        format!("        let mut last_key: Option<{}> = None;", key_type),
        "        let mut line_number = 3;".to_string(),
        "        while let Some(line) = r.next_line() {".to_string(),
        "            util::check_column_count(line_number, &line, COLUMN_COUNT)?;".to_string(),
        "            // an empty key continues the current group".to_string(),
        format!("            let continued_key = if line[{}].is_empty() {{", def.key_column_index),
        format!(
            "                Some(last_key.clone().ok_or_else(|| {})?)",
            empty_key_error(def)
        ),
        "            } else {".to_string(),
        "                None".to_string(),
        "            };".to_string(),
        "".to_string(),
    ];
    lines.extend(build_row(descriptor, def, "mut row"));
    lines.push("            match continued_key {".to_string());
    lines.push("                Some(key) => {".to_string());
    lines.push(format!("                    row.{} = {};", key, key_copy(def, "key")));
    lines.push("                    row_sets.entry(key).or_default().push(row);".to_string());
    lines.push("                }".to_string());
    lines.push("                None => {".to_string());
    lines.extend(duplicate_key_check(def, "row_sets", "                    "));
    lines.push(format!(
        "                    last_key = Some({});",
        key_copy(def, &format!("row.{}", key))
    ));
    lines.push(format!(
        "                    row_sets.insert({}, vec![row]);",
        key_copy(def, &format!("row.{}", key))
    ));
    lines.push("                }".to_string());
    lines.push("            }".to_string());
    lines.push("            line_number += 1;".to_string());
    lines.push("        }".to_string());
    lines.push("        self.row_sets = row_sets;".to_string());
    lines
}

fn accessors(def: &TableDef) -> Vec<String> {
    let (param, lookup) = match def.key_column().type_ {
        ColumnType::Int => ("i32", "&key"),
        _ => ("&str", "key"),
    };
    match def.key_type {
        KeyType::SingleKey => vec![
            format!("    pub fn get_row(&self, key: {}) -> Option<&Row> {{", param),
            format!("        self.rows.get({})", lookup),
            "    }".to_string(),
            "".to_string(),
            "    pub fn rows(&self) -> &Rows {".to_string(),
            "        &self.rows".to_string(),
            "    }".to_string(),
        ],
        KeyType::SetKey => vec![
            format!("    pub fn get_row_set(&self, key: {}) -> Option<&RowSet> {{", param),
            format!("        self.row_sets.get({})", lookup),
            "    }".to_string(),
            "".to_string(),
            "    pub fn row_sets(&self) -> &RowSets {".to_string(),
            "        &self.row_sets".to_string(),
            "    }".to_string(),
        ],
    }
}
