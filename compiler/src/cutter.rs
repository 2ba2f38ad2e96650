use crate::{
    error::CompileError,
    types::{Descriptor, TableDef},
};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const LINE_SEPARATOR: &str = "\r\n";
const COLUMN_SEPARATOR: char = '\t';

/// Removes from a table data file every column that `reader` can not read.
///
/// The key column is always kept. Every line, the last one included, must
/// end with CRLF; the comment and name lines must be present; every line
/// must have the declared column count and the name line must match the
/// declared column names.
pub fn cut_table(table: &TableDef, reader: &str, content: &str) -> Result<String, CompileError> {
    let cut_error = |msg: String| CompileError::Cut {
        file: table.file_name.clone(),
        msg,
    };

    let kept: Vec<bool> = table
        .columns
        .iter()
        .map(|column| table.is_key_column(column) || column.readable_by(reader))
        .collect();

    let mut lines: Vec<&str> = content.split(LINE_SEPARATOR).collect();
    if lines.last() != Some(&"") {
        return Err(cut_error("file line ending is required".to_string()));
    }
    lines.pop();
    if lines.len() < 2 {
        return Err(cut_error("comment line and name line is required".to_string()));
    }

    let mut rows = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let cols: Vec<&str> = line.split(COLUMN_SEPARATOR).collect();
        if cols.len() != table.columns.len() {
            return Err(cut_error(format!(
                "line {} column count {} is invalid, should be {}",
                i + 1,
                cols.len(),
                table.columns.len()
            )));
        }
        rows.push(cols);
    }

    for (i, column) in table.columns.iter().enumerate() {
        if rows[1][i] != column.name {
            return Err(cut_error(format!(
                "column {} should be named as `{}`",
                i + 1,
                column.name
            )));
        }
    }

    let mut out = String::with_capacity(content.len());
    for cols in &rows {
        let kept_cols: Vec<&str> = cols
            .iter()
            .zip(&kept)
            .filter(|(_, keep)| **keep)
            .map(|(col, _)| *col)
            .collect();
        out.push_str(&kept_cols.join("\t"));
        out.push_str(LINE_SEPARATOR);
    }
    Ok(out)
}

/// Cuts the data file of every table `reader` can read, from `input_dir`
/// into a file of the same name in `output_dir`. Stops at the first
/// failure.
pub fn cut_tables(
    descriptor: &Descriptor,
    reader: &str,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<(), CompileError> {
    if descriptor.reader(reader).is_none() {
        return Err(CompileError::UnknownReader(reader.to_string()));
    }

    let mut count = 0;
    for table in descriptor.tables.iter().filter(|t| t.readable_by(reader)) {
        let input_path = input_dir.join(&table.file_name);
        let content = fs::read_to_string(&input_path).map_err(|e| CompileError::Cut {
            file: table.file_name.clone(),
            msg:  format!("can not read input file: {}", e),
        })?;

        let output = cut_table(table, reader, &content)?;

        let output_path = output_dir.join(&table.file_name);
        fs::write(&output_path, output).map_err(|source| CompileError::Write {
            path: output_path.clone(),
            source,
        })?;
        debug!("cut table {} into {}", table.name, output_path.display());
        count += 1;
    }

    info!(tables = count, "cut data files for reader `{}`", reader);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;

    const SCHEMA: &str = r#"<define>
  <reader name="client"/>
  <reader name="server"/>
  <table name="Item" file="item.txt" key="id" readby="client|server">
    <col name="note" type="string" readby="server"/>
    <col name="id" type="int" readby="server"/>
    <col name="name" type="string"/>
  </table>
  <table name="Secret" file="secret.txt" key="id" readby="server">
    <col name="id" type="int"/>
  </table>
</define>"#;

    fn descriptor() -> Descriptor {
        parse_schema(SCHEMA, "t.xml").unwrap()
    }

    #[test]
    fn drops_unreadable_columns_but_keeps_key() {
        let d = descriptor();
        let input = "n\ti\tm\r\nnote\tid\tname\r\nx\t1\tsword\r\ny\t2\tshield\r\n";
        let out = cut_table(d.table("Item").unwrap(), "client", input).unwrap();
        assert_eq!(out, "i\tm\r\nid\tname\r\n1\tsword\r\n2\tshield\r\n");

        let out = cut_table(d.table("Item").unwrap(), "server", input).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn rejects_malformed_files() {
        let d = descriptor();
        let table = d.table("Item").unwrap();

        let err = cut_table(table, "client", "a\tb\tc\r\nnote\tid\tname").unwrap_err();
        assert_eq!(err.to_string(), "input file `item.txt`: file line ending is required");

        let err = cut_table(table, "client", "a\tb\tc\r\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "input file `item.txt`: comment line and name line is required"
        );

        let err = cut_table(table, "client", "a\tb\tc\r\nnote\tid\r\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "input file `item.txt`: line 2 column count 2 is invalid, should be 3"
        );

        let err = cut_table(table, "client", "a\tb\tc\r\nnote\tid\tnmae\r\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "input file `item.txt`: column 3 should be named as `name`"
        );
    }

    #[test]
    fn cuts_only_readable_tables() {
        let d = descriptor();
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        fs::write(
            input_dir.path().join("item.txt"),
            "c\tc\tc\r\nnote\tid\tname\r\nx\t1\tsword\r\n",
        )
        .unwrap();

        cut_tables(&d, "client", input_dir.path(), output_dir.path()).unwrap();

        let out = fs::read_to_string(output_dir.path().join("item.txt")).unwrap();
        assert_eq!(out, "c\tc\r\nid\tname\r\n1\tsword\r\n");
        assert!(!output_dir.path().join("secret.txt").exists());
    }

    #[test]
    fn missing_input_file() {
        let d = descriptor();
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let err = cut_tables(&d, "server", input_dir.path(), output_dir.path()).unwrap_err();
        assert!(matches!(err, CompileError::Cut { ref file, .. } if file == "item.txt"));
    }

    #[test]
    fn unknown_reader() {
        let d = descriptor();
        let dir = tempfile::tempdir().unwrap();
        let err = cut_tables(&d, "tools", dir.path(), dir.path()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownReader(_)));
    }
}
