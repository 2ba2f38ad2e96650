use crate::{error::CompileError, types::Descriptor};
use tracing::debug;

/// Project `descriptor` onto what `reader` may read.
///
/// Tables not readable by the reader are dropped with everything in them.
/// Inside the remaining tables, columns not readable by the reader are
/// dropped, except the key column which is always kept. Key column indices
/// and name indices are recomputed afterwards.
pub fn filter_by_reader(mut descriptor: Descriptor, reader: &str) -> Result<Descriptor, CompileError> {
    if descriptor.reader(reader).is_none() {
        return Err(CompileError::UnknownReader(reader.to_string()));
    }

    let table_count = descriptor.tables.len();
    descriptor.tables.retain(|table| table.readable_by(reader));

    let mut dropped_columns = 0;
    for table in &mut descriptor.tables {
        let key_name = table.key_name.clone();
        let before = table.columns.len();
        table
            .columns
            .retain(|column| column.name == key_name || column.readable_by(reader));
        dropped_columns += before - table.columns.len();
        table.calculate_key_column_index();
    }

    descriptor.rebuild_indices();

    debug!(
        reader,
        dropped_tables = table_count - descriptor.tables.len(),
        dropped_columns,
        "filtered descriptor"
    );

    Ok(descriptor)
}
