use crate::{
    error::CompileError,
    traits::{write_artifact, CodeGenerator, NewLineType},
    types::{ColumnDef, ColumnType, Descriptor, FieldType, KeyType, StructDef, TableDef},
    utils::camel_to_underscore,
};
use std::path::Path;
use tracing::info;

const INDENT: &str = "    ";

/// C++ backend. Every global struct and every table gets a `.h`/`.cc`
/// pair named after the lower_snake_case form of its name.
#[derive(Debug, Default, Clone, Copy)]
pub struct CppCodeGenerator;

impl CodeGenerator for CppCodeGenerator {
    fn generate(
        &self,
        descriptor: &Descriptor,
        reader: &str,
        output_dir: &Path,
        new_line_type: NewLineType,
    ) -> Result<(), CompileError> {
        let gen = CppGen::new(descriptor, reader);

        for def in &descriptor.global_structs {
            let base = camel_to_underscore(&def.name);
            write_artifact(
                output_dir,
                &format!("{}.h", base),
                &new_line_type.apply(gen.global_struct_header(def)),
            )?;
            write_artifact(
                output_dir,
                &format!("{}.cc", base),
                &new_line_type.apply(gen.global_struct_source(def)),
            )?;
        }

        for def in &descriptor.tables {
            let base = camel_to_underscore(&def.name);
            write_artifact(
                output_dir,
                &format!("{}.h", base),
                &new_line_type.apply(gen.table_header(def)),
            )?;
            write_artifact(
                output_dir,
                &format!("{}.cc", base),
                &new_line_type.apply(gen.table_source(def)),
            )?;
        }

        info!(
            structs = descriptor.global_structs.len(),
            tables = descriptor.tables.len(),
            "generated C++ code for reader `{}` in {}",
            reader,
            output_dir.display()
        );
        Ok(())
    }
}

/// Renders C++ text with `\n` line endings; the caller converts them.
pub struct CppGen<'a> {
    descriptor:      &'a Descriptor,
    namespace_parts: &'a [String],
}

impl<'a> CppGen<'a> {
    pub fn new(descriptor: &'a Descriptor, reader: &str) -> Self {
        let namespace_parts = descriptor
            .reader(reader)
            .map(|r| r.namespace_parts.as_slice())
            .unwrap_or(&[]);
        CppGen {
            descriptor,
            namespace_parts,
        }
    }

    pub fn global_struct_header(&self, def: &StructDef) -> String {
        let (guard_start, guard_end) = self.include_guard(&def.name);
        let includes = global_struct_header_includes(def);
        let (ns_start, ns_end) = self.namespace_decl();

        let mut out = String::new();
        out.push_str(&dont_edit_comment());
        out.push_str(&guard_start);
        out.push('\n');
        out.push_str(&includes);
        out.push('\n');
        if !ns_start.is_empty() {
            out.push_str(&ns_start);
            out.push('\n');
        }
        out.push_str(&struct_decl(def, ""));
        out.push('\n');
        if !ns_end.is_empty() {
            out.push_str(&ns_end);
            out.push('\n');
        }
        out.push_str(&guard_end);
        out
    }

    pub fn global_struct_source(&self, def: &StructDef) -> String {
        let (ns_start, ns_end) = self.namespace_decl();

        let mut out = String::new();
        out.push_str(&dont_edit_comment());
        out.push_str(&format!(
            "#include \"{}.h\"\n\n#include <tablekit/column_splitter.h>\n",
            camel_to_underscore(&def.name)
        ));
        out.push('\n');
        if !ns_start.is_empty() {
            out.push_str(&ns_start);
            out.push('\n');
        }
        out.push_str(&struct_impl(def));
        if !ns_end.is_empty() {
            out.push('\n');
            out.push_str(&ns_end);
        }
        out
    }

    pub fn table_header(&self, def: &TableDef) -> String {
        let (guard_start, guard_end) = self.include_guard(&def.name);
        let includes = self.table_header_includes(def);
        let (ns_start, ns_end) = self.namespace_decl();

        let mut out = String::new();
        out.push_str(&dont_edit_comment());
        out.push_str(&guard_start);
        out.push('\n');
        out.push_str(&includes);
        out.push('\n');
        if !ns_start.is_empty() {
            out.push_str(&ns_start);
            out.push('\n');
        }
        out.push_str(&self.table_decl(def));
        out.push('\n');
        if !ns_end.is_empty() {
            out.push_str(&ns_end);
            out.push('\n');
        }
        out.push_str(&guard_end);
        out
    }

    pub fn table_source(&self, def: &TableDef) -> String {
        let (ns_start, ns_end) = self.namespace_decl();

        let mut impls: Vec<String> = def.local_structs.iter().map(struct_impl).collect();
        impls.push(self.table_impl(def));

        let mut out = String::new();
        out.push_str(&dont_edit_comment());
        out.push_str(&table_source_includes(def));
        out.push('\n');
        if !ns_start.is_empty() {
            out.push_str(&ns_start);
            out.push('\n');
        }
        out.push_str(&impls.join("\n"));
        if !ns_end.is_empty() {
            out.push('\n');
            out.push_str(&ns_end);
        }
        out
    }

    fn namespace_decl(&self) -> (String, String) {
        if self.namespace_parts.is_empty() {
            return (String::new(), String::new());
        }
        let name = self.namespace_parts.join("::");
        (
            format!("namespace {} {{\n", name),
            format!("}} // namespace {}\n", name),
        )
    }

    fn include_guard(&self, entity_name: &str) -> (String, String) {
        let mut parts = vec!["TABLEKIT_GENERATED".to_string()];
        parts.extend(self.namespace_parts.iter().cloned());
        parts.push(camel_to_underscore(entity_name));
        parts.push("H".to_string());
        let guard = parts.join("_").to_uppercase();

        (
            format!("#ifndef {0}\n#define {0}\n", guard),
            "#endif\n".to_string(),
        )
    }

    fn column_type(&self, table: &TableDef, column: &ColumnDef) -> String {
        let value_type = match column.value_type() {
            ColumnType::Int => "int32_t".to_string(),
            ColumnType::String => "std::string".to_string(),
            _ => column
                .struct_ref
                .and_then(|r| self.descriptor.struct_def(table, r))
                .map(|s| s.name.clone())
                .unwrap_or_default(),
        };
        if column.is_list() {
            format!("std::vector<{}>", value_type)
        } else {
            value_type
        }
    }

    /// Key parameter type: strings by const reference, ints by value.
    fn key_param_type(&self, table: &TableDef) -> String {
        let key = table.key_column();
        let cpp_type = self.column_type(table, key);
        if key.type_ == ColumnType::String {
            format!("const {} &", cpp_type)
        } else {
            format!("{} ", cpp_type)
        }
    }

    fn table_header_includes(&self, def: &TableDef) -> String {
        let mut use_stdint = false;
        let mut use_vector = def.key_type == KeyType::SetKey;
        // first-seen order keeps the output stable
        let mut global_structs: Vec<&str> = Vec::new();

        for column in &def.columns {
            if column.is_list() {
                use_vector = true;
            }
            match column.value_type() {
                ColumnType::Int => use_stdint = true,
                ColumnType::Struct => {
                    let referenced = column
                        .struct_ref
                        .and_then(|r| self.descriptor.struct_def(def, r))
                        .filter(|s| s.is_global());
                    if let Some(s) = referenced {
                        if !global_structs.contains(&s.name.as_str()) {
                            global_structs.push(&s.name);
                        }
                    }
                }
                _ => {}
            }
        }
        if def
            .local_structs
            .iter()
            .flat_map(|s| &s.fields)
            .any(|f| f.type_ == FieldType::Int)
        {
            use_stdint = true;
        }

        let mut out = String::new();
        if use_stdint {
            out.push_str("#include <cstdint>\n");
        }
        out.push_str("#include <map>\n");
        out.push_str("#include <string>\n");
        if use_vector {
            out.push_str("#include <vector>\n");
        }
        if !global_structs.is_empty() {
            out.push('\n');
            for name in global_structs {
                out.push_str(&format!("#include \"{}.h\"\n", camel_to_underscore(name)));
            }
        }
        out
    }

    fn table_decl(&self, def: &TableDef) -> String {
        let mut out = format!("class {} {{\npublic:\n", def.name);

        for local in &def.local_structs {
            out.push_str(&struct_decl(local, INDENT));
            out.push('\n');
        }

        out.push_str(&self.row_class_decl(def));
        out.push('\n');
        out.push_str(&self.table_func_decl(def));
        out.push('\n');
        out.push_str("private:\n");
        match def.key_type {
            KeyType::SingleKey => out.push_str(&format!("{}Rows rows_;\n", INDENT)),
            KeyType::SetKey => out.push_str(&format!("{}RowSets row_sets_;\n", INDENT)),
        }
        out.push_str("};\n");
        out
    }

    fn row_class_decl(&self, def: &TableDef) -> String {
        let mut out = format!(
            "{0}class Row {{\n{0}public:\n{0}    Row();\n{0}    ~Row();\n",
            INDENT
        );
        if !def.columns.is_empty() {
            out.push('\n');
            out.push_str(&format!("{}public:\n", INDENT));
        }
        for column in &def.columns {
            out.push_str(&format!(
                "{}    {} {};\n",
                INDENT,
                self.column_type(def, column),
                column.name
            ));
        }
        out.push_str(&format!("{}}};\n", INDENT));

        let key_type = self.column_type(def, def.key_column());
        out.push('\n');
        match def.key_type {
            KeyType::SingleKey => {
                out.push_str(&format!("{}using Rows = std::map<{}, Row>;\n", INDENT, key_type));
            }
            KeyType::SetKey => {
                out.push_str(&format!("{}using RowSet = std::vector<Row>;\n", INDENT));
                out.push_str(&format!(
                    "{}using RowSets = std::map<{}, RowSet>;\n",
                    INDENT, key_type
                ));
            }
        }
        out
    }

    fn table_func_decl(&self, def: &TableDef) -> String {
        let mut out = format!(
            "{0}{1}();\n{0}~{1}();\n\n{0}bool parse(const std::string &text, std::string *error_info);\n",
            INDENT, def.name
        );
        let key_param = self.key_param_type(def);
        match def.key_type {
            KeyType::SingleKey => out.push_str(&format!(
                "{0}const Row *getRow({1}key) const;\n{0}const Rows &getRows() const {{ return rows_; }}\n",
                INDENT, key_param
            )),
            KeyType::SetKey => out.push_str(&format!(
                "{0}const RowSet *getRowSet({1}key) const;\n{0}const RowSets &getRowSets() const {{ return row_sets_; }}\n",
                INDENT, key_param
            )),
        }
        out
    }

    fn table_impl(&self, def: &TableDef) -> String {
        let getter = match def.key_type {
            KeyType::SingleKey => self.get_row_func(def),
            KeyType::SetKey => self.get_row_set_func(def),
        };
        [
            row_constructor(def),
            format!("{0}::Row::~Row()\n{{\n}}\n", def.name),
            format!("{0}::{0}()\n{{\n}}\n", def.name),
            format!("{0}::~{0}()\n{{\n}}\n", def.name),
            self.parse_func(def),
            getter,
        ]
        .join("\n")
    }

    fn parse_func(&self, def: &TableDef) -> String {
        let mut out = format!(
            "bool {}::parse(const std::string &text, std::string *error_info)\n\
             {{\n\
             {i}tablekit::LineReader r(text);\n\
             {i}const tablekit::LineReader::LineBuffer *line_buffer = nullptr;\n\
             {i}size_t column_count_req = {};\n\
             \n",
            def.name,
            def.columns.len(),
            i = INDENT
        );
        out.push_str(&read_header_line("comment"));
        out.push_str(&read_name_line(def));
        match def.key_type {
            KeyType::SingleKey => out.push_str(&self.single_key_read_data_lines(def)),
            KeyType::SetKey => out.push_str(&self.set_key_read_data_lines(def)),
        }
        out.push_str(&format!(
            "{i}*error_info = \"\";\n{i}return true;\n}}\n",
            i = INDENT
        ));
        out
    }

    fn single_key_read_data_lines(&self, def: &TableDef) -> String {
        let key = def.key_column();
        let (key_format, key_value) = key_format(key);
        let i = INDENT;

        let mut out = String::new();
        out.push_str(&format!("{i}// read data lines\n"));
        out.push_str(&format!("{i}size_t line_number = 3;\n"));
        out.push_str(&format!("{i}Rows rows;\n"));
        out.push_str(&read_data_line_start());
        out.push_str(&format!(
            "{i}    if ((*line_buffer)[{}].empty()) {{\n\
             {i}        *error_info = tablekit::util::error(\n\
             {i}            \"line %zd key `{}` is empty\", line_number);\n\
             {i}        return false;\n\
             {i}    }}\n\
             \n\
             {i}    Row row;\n\
             {i}    size_t col_number = 0;\n\
             \n",
            def.key_column_index, key.name
        ));
        out.push_str(&self.parse_columns(def));
        out.push('\n');
        out.push_str(&format!(
            "{i}    if (rows.find(row.{k}) != rows.end()) {{\n\
             {i}        *error_info = tablekit::util::error(\n\
             {i}            \"line %zd key `{k}` value {f} is duplicated\", line_number, {v});\n\
             {i}        return false;\n\
             {i}    }}\n\
             \n\
             {i}    rows.insert(std::make_pair(row.{k}, row));\n\
             \n\
             {i}    line_number += 1;\n\
             {i}}}\n\
             {i}rows_.swap(rows);\n\
             \n",
            k = key.name,
            f = key_format,
            v = key_value
        ));
        out
    }

    fn set_key_read_data_lines(&self, def: &TableDef) -> String {
        let key = def.key_column();
        let (key_format, key_value) = key_format(key);
        let last_key_decl = match key.type_ {
            ColumnType::Int => "int32_t last_key = 0;",
            _ => "std::string last_key;",
        };
        let i = INDENT;

        let mut out = String::new();
        out.push_str(&format!("{i}// read data lines\n"));
        out.push_str(&format!("{i}size_t line_number = 3;\n"));
        out.push_str(&format!("{i}bool has_last_key = false;\n"));
        out.push_str(&format!("{i}{}\n", last_key_decl));
        out.push_str(&format!("{i}RowSets row_sets;\n"));
        out.push_str(&read_data_line_start());
        out.push_str(&format!(
            "\n\
             {i}    // an empty key continues the current group\n\
             {i}    bool is_continuation = (*line_buffer)[{}].empty();\n\
             {i}    if (is_continuation && has_last_key == false) {{\n\
             {i}        *error_info = tablekit::util::error(\n\
             {i}            \"line %zd key `{}` is empty\", line_number);\n\
             {i}        return false;\n\
             {i}    }}\n\
             \n\
             {i}    Row row;\n\
             {i}    size_t col_number = 0;\n\
             \n",
            def.key_column_index, key.name
        ));
        out.push_str(&self.parse_columns(def));
        out.push('\n');
        out.push_str(&format!(
            "{i}    if (is_continuation) {{\n\
             {i}        row.{k} = last_key;\n\
             {i}        row_sets[last_key].push_back(row);\n\
             {i}    }} else {{\n\
             {i}        if (row_sets.find(row.{k}) != row_sets.end()) {{\n\
             {i}            *error_info = tablekit::util::error(\n\
             {i}                \"line %zd key `{k}` value {f} is duplicated\", line_number, {v});\n\
             {i}            return false;\n\
             {i}        }}\n\
             {i}        RowSet row_set;\n\
             {i}        row_set.push_back(row);\n\
             {i}        row_sets.insert(std::make_pair(row.{k}, row_set));\n\
             {i}        last_key = row.{k};\n\
             {i}        has_last_key = true;\n\
             {i}    }}\n\
             \n\
             {i}    line_number += 1;\n\
             {i}}}\n\
             {i}row_sets_.swap(row_sets);\n\
             \n",
            k = key.name,
            f = key_format,
            v = key_value
        ));
        out
    }

    fn parse_columns(&self, def: &TableDef) -> String {
        let i = "        ";
        let mut out = String::new();

        for column in &def.columns {
            let name = &column.name;
            match (column.value_type(), column.is_list()) {
                (ColumnType::Int, false) => out.push_str(&format!(
                    "{i}row.{name} = tablekit::util::parseInt((*line_buffer)[col_number++]);\n"
                )),
                (ColumnType::Int, true) => out.push_str(&format!(
                    "{i}tablekit::util::readColumnIntList((*line_buffer)[col_number++], &row.{name});\n"
                )),
                (ColumnType::String, false) => out.push_str(&format!(
                    "{i}row.{name} = (*line_buffer)[col_number++];\n"
                )),
                (ColumnType::String, true) => out.push_str(&format!(
                    "{i}tablekit::util::readColumnStringList((*line_buffer)[col_number++], &row.{name});\n"
                )),
                (_, is_list) => {
                    let call = if is_list {
                        format!(
                            "tablekit::util::readColumnStructList((*line_buffer)[col_number++], &row.{name})"
                        )
                    } else {
                        format!("row.{name}.parse((*line_buffer)[col_number++])")
                    };
                    out.push_str(&format!(
                        "{i}if ({call} == false) {{\n\
                         {i}    *error_info = tablekit::util::error(\n\
                         {i}        \"line %zd column `{name}` value is invalid\", line_number);\n\
                         {i}    return false;\n\
                         {i}}}\n"
                    ));
                }
            }
        }

        out
    }

    fn get_row_func(&self, def: &TableDef) -> String {
        format!(
            "const {0}::Row *{0}::getRow({1}key) const\n\
             {{\n\
             {i}Rows::const_iterator iter = rows_.find(key);\n\
             {i}if (iter == rows_.end()) {{\n\
             {i}    return nullptr;\n\
             {i}}}\n\
             \n\
             {i}return &iter->second;\n\
             }}\n",
            def.name,
            self.key_param_type(def),
            i = INDENT
        )
    }

    fn get_row_set_func(&self, def: &TableDef) -> String {
        format!(
            "const {0}::RowSet *{0}::getRowSet({1}key) const\n\
             {{\n\
             {i}RowSets::const_iterator iter = row_sets_.find(key);\n\
             {i}if (iter == row_sets_.end()) {{\n\
             {i}    return nullptr;\n\
             {i}}}\n\
             \n\
             {i}return &iter->second;\n\
             }}\n",
            def.name,
            self.key_param_type(def),
            i = INDENT
        )
    }
}

fn dont_edit_comment() -> String {
    "/*\n * Generated by tablekit table compiler.\n * Do not edit unless you are sure that you know what you are doing.\n */\n"
        .to_string()
}

fn field_type(type_: FieldType) -> &'static str {
    match type_ {
        FieldType::Int => "int32_t",
        FieldType::String => "std::string",
    }
}

/// printf format and argument for a key value in error messages.
fn key_format(key: &ColumnDef) -> (&'static str, String) {
    match key.type_ {
        ColumnType::Int => ("%d", format!("row.{}", key.name)),
        _ => ("%s", format!("row.{}.c_str()", key.name)),
    }
}

fn global_struct_header_includes(def: &StructDef) -> String {
    let mut out = String::new();
    if def.fields.iter().any(|f| f.type_ == FieldType::Int) {
        out.push_str("#include <cstdint>\n");
    }
    out.push_str("#include <string>\n");
    out
}

fn table_source_includes(def: &TableDef) -> String {
    let use_splitter = !def.local_structs.is_empty()
        || def
            .columns
            .iter()
            .any(|c| c.type_ == ColumnType::Struct || c.type_ == ColumnType::List);

    let mut out = format!("#include \"{}.h\"\n", camel_to_underscore(&def.name));
    out.push_str("\n#include <cstddef>\n");
    out.push('\n');
    if use_splitter {
        out.push_str("#include <tablekit/column_splitter.h>\n");
    }
    out.push_str("#include <tablekit/line_reader.h>\n");
    out.push_str("#include <tablekit/util.h>\n");
    out
}

/// Class declaration of a struct; `indent` is non-empty for local structs
/// nested in their table class.
fn struct_decl(def: &StructDef, indent: &str) -> String {
    let mut out = format!(
        "{0}class {1} {{\n{0}public:\n{0}    {1}();\n{0}    ~{1}();\n\n{0}    bool parse(const std::string &text);\n",
        indent, def.name
    );
    if !def.fields.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}public:\n", indent));
    }
    for field in &def.fields {
        out.push_str(&format!(
            "{}    {} {};\n",
            indent,
            field_type(field.type_),
            field.name
        ));
    }
    out.push_str(&format!("{}}};\n", indent));
    out
}

fn class_prefix(def: &StructDef) -> String {
    match &def.owner {
        Some(table) => format!("{}::", table),
        None => String::new(),
    }
}

fn init_list<'a>(int_members: impl Iterator<Item = &'a String>) -> String {
    let members: Vec<String> = int_members.map(|name| format!("    {}(0)", name)).collect();
    if members.is_empty() {
        String::new()
    } else {
        format!(" :\n{}", members.join(",\n"))
    }
}

fn struct_impl(def: &StructDef) -> String {
    let prefix = class_prefix(def);
    let init = init_list(
        def.fields
            .iter()
            .filter(|f| f.type_ == FieldType::Int)
            .map(|f| &f.name),
    );

    let mut out = String::new();
    out.push_str(&format!("{0}{1}::{1}(){2}\n{{\n}}\n", prefix, def.name, init));
    out.push('\n');
    out.push_str(&format!("{0}{1}::~{1}()\n{{\n}}\n", prefix, def.name));
    out.push('\n');
    out.push_str(&format!(
        "bool {}{}::parse(const std::string &text)\n{{\n",
        prefix, def.name
    ));
    if def.fields.is_empty() {
        out.push_str(&format!("{}return true;\n", INDENT));
    } else {
        out.push_str(&format!(
            "{}tablekit::ColumnSplitter s(text, ';');\n\n",
            INDENT
        ));
        for field in &def.fields {
            let method = match field.type_ {
                FieldType::Int => "nextInt",
                FieldType::String => "nextString",
            };
            out.push_str(&format!(
                "{i}if (s.{}(&this->{}) == false) {{\n{i}    return false;\n{i}}}\n",
                method,
                field.name,
                i = INDENT
            ));
        }
        out.push_str(&format!(
            "{i}if (s.nextString(nullptr)) {{\n{i}    return false;\n{i}}}\n\n{i}return true;\n",
            i = INDENT
        ));
    }
    out.push_str("}\n");
    out
}

fn row_constructor(def: &TableDef) -> String {
    let init = init_list(
        def.columns
            .iter()
            .filter(|c| c.type_ == ColumnType::Int)
            .map(|c| &c.name),
    );
    format!("{}::Row::Row(){}\n{{\n}}\n", def.name, init)
}

fn read_header_line(which: &str) -> String {
    format!(
        "{i}// read {w} line\n\
         {i}line_buffer = r.nextLine();\n\
         {i}if (line_buffer == nullptr) {{\n\
         {i}    *error_info = \"{w} line is required\";\n\
         {i}    return false;\n\
         {i}}}\n\
         {i}if (line_buffer->size() != column_count_req) {{\n\
         {i}    *error_info = tablekit::util::error(\n\
         {i}        \"{w} line column count %zd is invalid, should be %zd\",\n\
         {i}        line_buffer->size(), column_count_req);\n\
         {i}    return false;\n\
         {i}}}\n",
        i = INDENT,
        w = which
    )
}

fn read_name_line(def: &TableDef) -> String {
    let i = INDENT;
    let mut out = String::from("\n");
    out.push_str(&read_header_line("name"));
    out.push_str(&format!("{i}{{\n{i}    size_t col_number = 0;\n\n"));
    for column in &def.columns {
        out.push_str(&format!(
            "{i}    if ((*line_buffer)[col_number++] != \"{n}\") {{\n\
             {i}        *error_info = tablekit::util::error(\n\
             {i}            \"column %zd should be named as `{n}`\", col_number);\n\
             {i}        return false;\n\
             {i}    }}\n",
            n = column.name
        ));
    }
    out.push_str(&format!("{i}}}\n\n"));
    out
}

fn read_data_line_start() -> String {
    let i = INDENT;
    format!(
        "{i}for (;;) {{\n\
         {i}    line_buffer = r.nextLine();\n\
         {i}    if (line_buffer == nullptr) {{\n\
         {i}        break;\n\
         {i}    }}\n\
         {i}    if (line_buffer->size() != column_count_req) {{\n\
         {i}        *error_info = tablekit::util::error(\n\
         {i}            \"line %zd column count %zd is invalid, should be %zd\",\n\
         {i}            line_number, line_buffer->size(), column_count_req);\n\
         {i}        return false;\n\
         {i}    }}\n"
    )
}
