use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Names of generated table members; a table-local struct may not use them.
pub const RESERVED_LOCAL_STRUCT_NAMES: [&str; 4] = ["Row", "Rows", "RowSet", "RowSets"];

/// Whole define file after analysis. Every collection keeps declaration
/// order and is paired with a name index used for lookups only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Descriptor {
    pub file_path:      String,
    pub readers:        Vec<ReaderDef>,
    pub global_structs: Vec<StructDef>,
    pub tables:         Vec<TableDef>,

    #[serde(skip)]
    reader_index:        HashMap<String, usize>,
    #[serde(skip)]
    global_struct_index: HashMap<String, usize>,
    #[serde(skip)]
    table_index:         HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderDef {
    pub name:            String,
    pub line:            usize,
    pub namespace_parts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Int,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub name:  String,
    pub line:  usize,
    pub type_: FieldType,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StructDef {
    pub name:   String,
    pub line:   usize,
    /// Owning table name, `None` for a global struct.
    pub owner:  Option<String>,
    pub fields: Vec<FieldDef>,

    #[serde(skip)]
    field_index: HashMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Int,
    String,
    Struct,
    List,
}

/// Where a column's struct type lives. Filtering never removes structs, so
/// the indices stay valid for the lifetime of the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StructRef {
    Global(usize),
    Local(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    pub name:       String,
    pub line:       usize,
    pub type_:      ColumnType,
    /// Element type, set only when `type_` is `List`.
    pub list_type:  Option<ColumnType>,
    pub struct_ref: Option<StructRef>,
    /// Empty means every reader.
    pub readers:    BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyType {
    SingleKey,
    SetKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableDef {
    pub name:             String,
    pub line:             usize,
    pub file_name:        String,
    pub key_type:         KeyType,
    pub key_name:         String,
    pub key_column_index: usize,
    /// Empty means every reader.
    pub readers:          BTreeSet<String>,
    pub local_structs:    Vec<StructDef>,
    pub columns:          Vec<ColumnDef>,

    #[serde(skip)]
    local_struct_index: HashMap<String, usize>,
    #[serde(skip)]
    column_index:       HashMap<String, usize>,
}

impl Descriptor {
    pub fn new(file_path: impl Into<String>) -> Self {
        Descriptor {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn reader(&self, name: &str) -> Option<&ReaderDef> {
        self.reader_index.get(name).map(|&i| &self.readers[i])
    }

    pub fn global_struct(&self, name: &str) -> Option<&StructDef> {
        self.global_struct_index.get(name).map(|&i| &self.global_structs[i])
    }

    pub fn global_struct_position(&self, name: &str) -> Option<usize> {
        self.global_struct_index.get(name).copied()
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.table_index.get(name).map(|&i| &self.tables[i])
    }

    pub fn add_reader(&mut self, def: ReaderDef) {
        self.reader_index.insert(def.name.clone(), self.readers.len());
        self.readers.push(def);
    }

    pub fn add_global_struct(&mut self, def: StructDef) {
        self.global_struct_index
            .insert(def.name.clone(), self.global_structs.len());
        self.global_structs.push(def);
    }

    pub fn add_table(&mut self, def: TableDef) {
        self.table_index.insert(def.name.clone(), self.tables.len());
        self.tables.push(def);
    }

    /// Looks up the struct a column refers to inside `table`.
    pub fn struct_def<'a>(&'a self, table: &'a TableDef, r: StructRef) -> Option<&'a StructDef> {
        match r {
            StructRef::Global(i) => self.global_structs.get(i),
            StructRef::Local(i) => table.local_structs.get(i),
        }
    }

    /// Rebuilds every name index from the ordered collections.
    pub fn rebuild_indices(&mut self) {
        self.reader_index = index_by_name(&self.readers, |r| &r.name);
        self.global_struct_index = index_by_name(&self.global_structs, |s| &s.name);
        self.table_index = index_by_name(&self.tables, |t| &t.name);
        for def in &mut self.global_structs {
            def.rebuild_indices();
        }
        for def in &mut self.tables {
            def.rebuild_indices();
        }
    }
}

impl StructDef {
    pub fn new(name: impl Into<String>, line: usize, owner: Option<String>) -> Self {
        StructDef {
            name: name.into(),
            line,
            owner,
            ..Default::default()
        }
    }

    pub fn is_global(&self) -> bool {
        self.owner.is_none()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    pub fn add_field(&mut self, def: FieldDef) {
        self.field_index.insert(def.name.clone(), self.fields.len());
        self.fields.push(def);
    }

    pub fn rebuild_indices(&mut self) {
        self.field_index = index_by_name(&self.fields, |f| &f.name);
    }
}

impl ColumnDef {
    pub fn is_list(&self) -> bool {
        self.type_ == ColumnType::List
    }

    /// Type of a single value: the element type for lists, else `type_`.
    pub fn value_type(&self) -> ColumnType {
        self.list_type.unwrap_or(self.type_)
    }

    pub fn readable_by(&self, reader: &str) -> bool {
        self.readers.is_empty() || self.readers.contains(reader)
    }
}

impl TableDef {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        TableDef {
            name:               name.into(),
            line,
            file_name:          String::new(),
            key_type:           KeyType::SingleKey,
            key_name:           String::new(),
            key_column_index:   0,
            readers:            BTreeSet::new(),
            local_structs:      Vec::new(),
            columns:            Vec::new(),
            local_struct_index: HashMap::new(),
            column_index:       HashMap::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.column_index.get(name).map(|&i| &self.columns[i])
    }

    pub fn local_struct(&self, name: &str) -> Option<&StructDef> {
        self.local_struct_index.get(name).map(|&i| &self.local_structs[i])
    }

    pub fn local_struct_position(&self, name: &str) -> Option<usize> {
        self.local_struct_index.get(name).copied()
    }

    pub fn add_column(&mut self, def: ColumnDef) {
        self.column_index.insert(def.name.clone(), self.columns.len());
        self.columns.push(def);
    }

    pub fn add_local_struct(&mut self, def: StructDef) {
        self.local_struct_index
            .insert(def.name.clone(), self.local_structs.len());
        self.local_structs.push(def);
    }

    /// Key column. Valid once the table has been analyzed.
    pub fn key_column(&self) -> &ColumnDef {
        &self.columns[self.key_column_index]
    }

    pub fn is_key_column(&self, column: &ColumnDef) -> bool {
        column.name == self.key_name
    }

    pub fn readable_by(&self, reader: &str) -> bool {
        self.readers.is_empty() || self.readers.contains(reader)
    }

    /// Recomputes `key_column_index` from `columns`. Returns `false` when
    /// the key column is missing.
    pub fn calculate_key_column_index(&mut self) -> bool {
        match self.columns.iter().position(|c| c.name == self.key_name) {
            Some(i) => {
                self.key_column_index = i;
                true
            }
            None => false,
        }
    }

    pub fn rebuild_indices(&mut self) {
        self.local_struct_index = index_by_name(&self.local_structs, |s| &s.name);
        self.column_index = index_by_name(&self.columns, |c| &c.name);
        for def in &mut self.local_structs {
            def.rebuild_indices();
        }
    }
}

fn index_by_name<T>(items: &[T], name: impl Fn(&T) -> &String) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (name(item).clone(), i))
        .collect()
}
