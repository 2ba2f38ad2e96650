use std::collections::HashSet;
use crate::{
    types::{ColumnType, Descriptor, StructDef, TableDef, RESERVED_LOCAL_STRUCT_NAMES},
    utils::{is_identifier, quote},
    error::CompileError,
};

/// Re-checks every descriptor invariant. Analysis already enforces them
/// one by one; this is run on filtered descriptors before generation.
pub fn verify_descriptor(descriptor: &Descriptor) -> Result<(), CompileError> {
    // 1) Readers
    let mut reader_names = HashSet::new();
    for reader in &descriptor.readers {
        check_name(&reader.name, "reader")?;
        if !reader_names.insert(reader.name.as_str()) {
            return Err(duplicated("reader", &reader.name));
        }
        for part in &reader.namespace_parts {
            check_name(part, "namespace part")?;
        }
    }

    // 2) Global structs and tables share one namespace
    let mut global_names = HashSet::new();
    for def in &descriptor.global_structs {
        if def.owner.is_some() {
            return Err(CompileError::Verify(format!(
                "The global struct {} has an owner",
                quote(&def.name)
            )));
        }
        if !global_names.insert(def.name.as_str()) {
            return Err(duplicated("struct", &def.name));
        }
        verify_struct(def)?;
    }
    for table in &descriptor.tables {
        if !global_names.insert(table.name.as_str()) {
            return Err(duplicated("table", &table.name));
        }
        verify_table(descriptor, table, &reader_names)?;
    }

    Ok(())
}

fn check_name(name: &str, what: &str) -> Result<(), CompileError> {
    if !is_identifier(name) {
        return Err(CompileError::Verify(format!(
            "The {} name {} is invalid",
            what,
            quote(name)
        )));
    }
    Ok(())
}

fn duplicated(what: &str, name: &str) -> CompileError {
    CompileError::Verify(format!("The {} {} is defined twice", what, quote(name)))
}

fn verify_struct(def: &StructDef) -> Result<(), CompileError> {
    check_name(&def.name, "struct")?;
    let mut field_names = HashSet::new();
    for field in &def.fields {
        check_name(&field.name, "field")?;
        if !field_names.insert(field.name.as_str()) {
            return Err(duplicated("field", &field.name));
        }
    }
    Ok(())
}

fn verify_table(
    descriptor: &Descriptor,
    table: &TableDef,
    reader_names: &HashSet<&str>,
) -> Result<(), CompileError> {
    check_name(&table.name, "table")?;
    check_readers(&table.readers, reader_names)?;

    let mut local_names = HashSet::new();
    for def in &table.local_structs {
        if def.owner.as_deref() != Some(table.name.as_str()) {
            return Err(CompileError::Verify(format!(
                "The local struct {} is not owned by table {}",
                quote(&def.name),
                quote(&table.name)
            )));
        }
        if RESERVED_LOCAL_STRUCT_NAMES.contains(&def.name.as_str()) {
            return Err(CompileError::Verify(format!(
                "The local struct name {} is reserved",
                quote(&def.name)
            )));
        }
        if !local_names.insert(def.name.as_str()) {
            return Err(duplicated("struct", &def.name));
        }
        verify_struct(def)?;
    }

    let mut column_names = HashSet::new();
    for column in &table.columns {
        check_name(&column.name, "column")?;
        if !column_names.insert(column.name.as_str()) {
            return Err(duplicated("column", &column.name));
        }
        check_readers(&column.readers, reader_names)?;

        let list_ok = match column.type_ {
            ColumnType::List => matches!(
                column.list_type,
                Some(ColumnType::Int | ColumnType::String | ColumnType::Struct)
            ),
            _ => column.list_type.is_none(),
        };
        if !list_ok {
            return Err(CompileError::Verify(format!(
                "The column {} has an invalid list type",
                quote(&column.name)
            )));
        }

        let needs_struct = column.value_type() == ColumnType::Struct;
        let resolved = column
            .struct_ref
            .map(|r| descriptor.struct_def(table, r).is_some());
        match (needs_struct, resolved) {
            (true, Some(true)) | (false, None) => {}
            _ => {
                return Err(CompileError::Verify(format!(
                    "The type of column {} does not resolve",
                    quote(&column.name)
                )));
            }
        }
    }

    let key = table
        .columns
        .get(table.key_column_index)
        .filter(|c| c.name == table.key_name)
        .ok_or_else(|| {
            CompileError::Verify(format!(
                "The key {} of table {} is not at column {}",
                quote(&table.key_name),
                quote(&table.name),
                table.key_column_index
            ))
        })?;
    if key.type_ != ColumnType::Int && key.type_ != ColumnType::String {
        return Err(CompileError::Verify(format!(
            "The key {} of table {} must be int or string",
            quote(&table.key_name),
            quote(&table.name)
        )));
    }

    Ok(())
}

fn check_readers<'a>(
    readers: impl IntoIterator<Item = &'a String>,
    declared: &HashSet<&str>,
) -> Result<(), CompileError> {
    for reader in readers {
        if !declared.contains(reader.as_str()) {
            return Err(CompileError::Verify(format!(
                "The reader {} is not defined",
                quote(reader)
            )));
        }
    }
    Ok(())
}
