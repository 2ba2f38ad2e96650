use crate::{
    error::CompileError,
    types::{
        ColumnDef, ColumnType, Descriptor, FieldDef, FieldType, KeyType, ReaderDef, StructDef,
        StructRef, TableDef, RESERVED_LOCAL_STRUCT_NAMES,
    },
    utils::is_identifier,
};
use lazy_static::lazy_static;
use regex::Regex;
use roxmltree::{Document, Node};
use std::collections::BTreeSet;
use tracing::debug;

lazy_static! {
    static ref LIST_TYPE: Regex = Regex::new(r"^list\{(.+)\}$").unwrap();
}

/// Analyze a define file into a `Descriptor`.
///
/// Readers are declared first, then global structs, then tables, whatever
/// their order in the file. The first error aborts the analysis.
pub fn parse_schema(text: &str, file_path: &str) -> Result<Descriptor, CompileError> {
    let doc = Document::parse(text).map_err(|e| CompileError::Syntax {
        path: file_path.to_string(),
        line: e.pos().row as usize,
        msg:  format!("can not load define file: {}", e),
    })?;

    let mut parser = SchemaParser {
        doc:        &doc,
        descriptor: Descriptor::new(file_path),
    };

    let root = doc.root_element();
    if root.tag_name().name() != "define" {
        return Err(parser.syntax(root, "root node must be `define` node"));
    }

    for element in child_elements(root).filter(|n| n.has_tag_name("reader")) {
        parser.add_reader_def(element)?;
    }
    for element in child_elements(root).filter(|n| n.has_tag_name("struct")) {
        let def = parser.parse_struct_def(None, element)?;
        parser.descriptor.add_global_struct(def);
    }
    for element in child_elements(root).filter(|n| n.has_tag_name("table")) {
        parser.add_table_def(element)?;
    }

    debug!(
        readers = parser.descriptor.readers.len(),
        structs = parser.descriptor.global_structs.len(),
        tables = parser.descriptor.tables.len(),
        "parsed define file {}",
        file_path
    );

    Ok(parser.descriptor)
}

fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

struct SchemaParser<'a, 'input> {
    doc:        &'a Document<'input>,
    descriptor: Descriptor,
}

impl<'a, 'input> SchemaParser<'a, 'input> {
    fn line(&self, node: Node) -> usize {
        self.doc.text_pos_at(node.range().start).row as usize
    }

    fn syntax(&self, node: Node, msg: impl Into<String>) -> CompileError {
        CompileError::Syntax {
            path: self.descriptor.file_path.clone(),
            line: self.line(node),
            msg:  msg.into(),
        }
    }

    fn semantic(&self, node: Node, msg: impl Into<String>) -> CompileError {
        CompileError::Semantic {
            path: self.descriptor.file_path.clone(),
            line: self.line(node),
            msg:  msg.into(),
        }
    }

    fn required_attr<'n, 'i>(
        &self,
        node: Node<'n, 'i>,
        attr: &str,
    ) -> Result<&'n str, CompileError> {
        node.attribute(attr).ok_or_else(|| {
            self.syntax(
                node,
                format!(
                    "`{}` node must contain a `{}` attribute",
                    node.tag_name().name(),
                    attr
                ),
            )
        })
    }

    /// Reads the `name` attribute and checks its syntax.
    fn name_attr<'n, 'i>(&self, node: Node<'n, 'i>) -> Result<&'n str, CompileError> {
        let name = self.required_attr(node, "name")?;
        if !is_identifier(name) {
            return Err(self.semantic(
                node,
                format!("`{}` node `name` attribute is invalid", node.tag_name().name()),
            ));
        }
        Ok(name)
    }

    fn duplicated(&self, node: Node) -> CompileError {
        self.semantic(
            node,
            format!("`{}` node `name` attribute duplicated", node.tag_name().name()),
        )
    }

    fn add_reader_def(&mut self, element: Node) -> Result<(), CompileError> {
        let name = self.name_attr(element)?;
        if self.descriptor.reader(name).is_some() {
            return Err(self.duplicated(element));
        }

        let mut namespace_parts = Vec::new();
        if let Some(namespace) = element.attribute("namespace") {
            for part in namespace.split('.') {
                if !is_identifier(part) {
                    return Err(self.semantic(
                        element,
                        "`reader` node `namespace` attribute is invalid",
                    ));
                }
                namespace_parts.push(part.to_string());
            }
        }

        self.descriptor.add_reader(ReaderDef {
            name: name.to_string(),
            line: self.line(element),
            namespace_parts,
        });
        Ok(())
    }

    /// Parses a global struct (`table` is `None`) or a local struct of
    /// `table`. The caller registers the result.
    fn parse_struct_def(
        &self,
        table: Option<&TableDef>,
        element: Node,
    ) -> Result<StructDef, CompileError> {
        let name = self.name_attr(element)?;
        match table {
            None => {
                if self.descriptor.global_struct(name).is_some()
                    || self.descriptor.table(name).is_some()
                {
                    return Err(self.duplicated(element));
                }
            }
            Some(table) => {
                if table.local_struct(name).is_some() {
                    return Err(self.duplicated(element));
                }
                if RESERVED_LOCAL_STRUCT_NAMES.contains(&name) {
                    return Err(self.semantic(
                        element,
                        "local struct can not be named as `Row`, `Rows`, `RowSet` or `RowSets`",
                    ));
                }
            }
        }

        let mut def = StructDef::new(name, self.line(element), table.map(|t| t.name.clone()));

        for child in child_elements(element) {
            if !child.has_tag_name("field") {
                return Err(self.syntax(child, "expect a `field` node"));
            }
            self.add_field_def(&mut def, child)?;
        }

        Ok(def)
    }

    fn add_field_def(&self, def: &mut StructDef, element: Node) -> Result<(), CompileError> {
        let name = self.name_attr(element)?;
        if def.field(name).is_some() {
            return Err(self.duplicated(element));
        }

        let type_str = self.required_attr(element, "type")?;
        let type_ = match type_str {
            "int" => FieldType::Int,
            "string" => FieldType::String,
            other => {
                return Err(self.semantic(element, format!("type `{}` is invalid", other)));
            }
        };

        def.add_field(FieldDef {
            name: name.to_string(),
            line: self.line(element),
            type_,
        });
        Ok(())
    }

    fn add_table_def(&mut self, element: Node) -> Result<(), CompileError> {
        let name = self.name_attr(element)?;
        if self.descriptor.table(name).is_some() || self.descriptor.global_struct(name).is_some() {
            return Err(self.duplicated(element));
        }

        let mut def = TableDef::new(name, self.line(element));

        // local structs first, so a column may use a struct declared after it
        let mut column_elements = Vec::new();
        for child in child_elements(element) {
            match child.tag_name().name() {
                "struct" => {
                    let local = self.parse_struct_def(Some(&def), child)?;
                    def.add_local_struct(local);
                }
                "col" => column_elements.push(child),
                _ => return Err(self.syntax(child, "expect a `struct` or `col` node")),
            }
        }
        for child in column_elements {
            self.add_column_def(&mut def, child)?;
        }

        let (key, key_type) = match (element.attribute("key"), element.attribute("setkey")) {
            (Some(key), None) => (key, KeyType::SingleKey),
            (None, Some(key)) => (key, KeyType::SetKey),
            (Some(_), Some(_)) => {
                return Err(self.syntax(
                    element,
                    "`table` node can not contain both `key` and `setkey` attribute",
                ));
            }
            (None, None) => {
                return Err(self.syntax(
                    element,
                    "`table` node must contain a `key` or `setkey` attribute",
                ));
            }
        };
        let key_column = def
            .column(key)
            .ok_or_else(|| self.semantic(element, format!("table key `{}` is not defined", key)))?;
        if key_column.type_ != ColumnType::Int && key_column.type_ != ColumnType::String {
            return Err(self.semantic(element, "table key can only be `int` or `string` type"));
        }
        def.key_name = key.to_string();
        def.key_type = key_type;

        def.file_name = self.required_attr(element, "file")?.to_string();
        def.readers = self.parse_readby(element)?;

        def.calculate_key_column_index();
        self.descriptor.add_table(def);
        Ok(())
    }

    fn add_column_def(&self, table: &mut TableDef, element: Node) -> Result<(), CompileError> {
        let name = self.name_attr(element)?;
        if table.column(name).is_some() {
            return Err(self.duplicated(element));
        }

        let type_str = self.required_attr(element, "type")?;
        let (is_list, value_type_str) = match LIST_TYPE.captures(type_str) {
            Some(caps) => (true, caps.get(1).map_or("", |m| m.as_str())),
            None => (false, type_str),
        };

        let (value_type, struct_ref) = match value_type_str {
            "int" => (ColumnType::Int, None),
            "string" => (ColumnType::String, None),
            other => {
                let struct_ref = if let Some(i) = table.local_struct_position(other) {
                    StructRef::Local(i)
                } else if let Some(i) = self.descriptor.global_struct_position(other) {
                    StructRef::Global(i)
                } else {
                    return Err(self.semantic(element, format!("type `{}` is undefined", other)));
                };
                (ColumnType::Struct, Some(struct_ref))
            }
        };

        let (type_, list_type) = if is_list {
            (ColumnType::List, Some(value_type))
        } else {
            (value_type, None)
        };

        let readers = self.parse_readby(element)?;

        table.add_column(ColumnDef {
            name: name.to_string(),
            line: self.line(element),
            type_,
            list_type,
            struct_ref,
            readers,
        });
        Ok(())
    }

    /// `readby="a|b"`; every name must be a declared reader.
    fn parse_readby(&self, element: Node) -> Result<BTreeSet<String>, CompileError> {
        let mut readers = BTreeSet::new();
        if let Some(attr) = element.attribute("readby") {
            for reader in attr.split('|') {
                if self.descriptor.reader(reader).is_none() {
                    return Err(
                        self.semantic(element, format!("reader `{}` is not defined", reader))
                    );
                }
                readers.insert(reader.to_string());
            }
        }
        Ok(readers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Descriptor, CompileError> {
        parse_schema(text, "test.xml")
    }

    fn error_of(text: &str) -> (usize, String) {
        match parse(text).unwrap_err() {
            CompileError::Syntax { line, msg, .. } | CompileError::Semantic { line, msg, .. } => {
                (line, msg)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn parses_readers_structs_and_tables() {
        let d = parse(
            r#"<define>
  <table name="TblItem" file="item.txt" key="id" readby="server">
    <struct name="Cost">
      <field name="item" type="int"/>
      <field name="count" type="int"/>
    </struct>
    <col name="id" type="int"/>
    <col name="pos" type="Pos"/>
    <col name="costs" type="list{Cost}" readby="client|server"/>
    <col name="tags" type="list{string}"/>
  </table>
  <reader name="server" namespace="game.server"/>
  <reader name="client"/>
  <struct name="Pos">
    <field name="x" type="int"/>
    <field name="y" type="string"/>
  </struct>
</define>"#,
        )
        .unwrap();

        assert_eq!(d.readers.len(), 2);
        assert_eq!(d.reader("server").unwrap().namespace_parts, vec!["game", "server"]);
        assert!(d.reader("client").unwrap().namespace_parts.is_empty());

        let pos = d.global_struct("Pos").unwrap();
        assert!(pos.is_global());
        assert_eq!(pos.fields[1].type_, FieldType::String);

        let table = d.table("TblItem").unwrap();
        assert_eq!(table.file_name, "item.txt");
        assert_eq!(table.key_type, KeyType::SingleKey);
        assert_eq!(table.key_column_index, 0);
        assert_eq!(table.line, 2);
        assert_eq!(table.local_structs[0].owner.as_deref(), Some("TblItem"));

        let pos_col = table.column("pos").unwrap();
        assert_eq!(pos_col.type_, ColumnType::Struct);
        assert_eq!(pos_col.struct_ref, Some(StructRef::Global(0)));

        let costs = table.column("costs").unwrap();
        assert_eq!(costs.type_, ColumnType::List);
        assert_eq!(costs.list_type, Some(ColumnType::Struct));
        assert_eq!(costs.struct_ref, Some(StructRef::Local(0)));
        assert_eq!(costs.readers.len(), 2);

        let tags = table.column("tags").unwrap();
        assert_eq!(tags.value_type(), ColumnType::String);
        assert!(tags.struct_ref.is_none());
    }

    #[test]
    fn local_struct_shadows_global() {
        let d = parse(
            r#"<define>
  <struct name="Pos"><field name="x" type="int"/></struct>
  <table name="T" file="t.txt" setkey="k">
    <col name="k" type="string"/>
    <col name="p" type="Pos"/>
    <struct name="Pos"><field name="z" type="string"/></struct>
  </table>
</define>"#,
        )
        .unwrap();
        let table = d.table("T").unwrap();
        assert_eq!(table.key_type, KeyType::SetKey);
        assert_eq!(table.column("p").unwrap().struct_ref, Some(StructRef::Local(0)));
    }

    #[test]
    fn key_column_index_follows_column_order() {
        let d = parse(
            r#"<define>
  <table name="T" file="t.txt" key="id">
    <col name="name" type="string"/>
    <col name="id" type="int"/>
  </table>
</define>"#,
        )
        .unwrap();
        assert_eq!(d.tables[0].key_column_index, 1);
        assert_eq!(d.tables[0].key_column().name, "id");
    }

    #[test]
    fn rejects_bad_root() {
        let (line, msg) = error_of("<tables/>");
        assert_eq!(line, 1);
        assert_eq!(msg, "root node must be `define` node");
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(matches!(parse("<define>"), Err(CompileError::Syntax { .. })));
    }

    #[test]
    fn rejects_invalid_and_duplicated_names() {
        let (_, msg) = error_of(r#"<define><reader name="1x"/></define>"#);
        assert_eq!(msg, "`reader` node `name` attribute is invalid");

        let (line, msg) = error_of("<define>\n<reader name=\"a\"/>\n<reader name=\"a\"/>\n</define>");
        assert_eq!(line, 3);
        assert_eq!(msg, "`reader` node `name` attribute duplicated");

        let (_, msg) = error_of(
            r#"<define><struct name="A"/><table name="A" file="a" key="k"><col name="k" type="int"/></table></define>"#,
        );
        assert_eq!(msg, "`table` node `name` attribute duplicated");

        let (_, msg) = error_of(
            r#"<define><struct name="S"><field name="a" type="int"/><field name="a" type="int"/></struct></define>"#,
        );
        assert_eq!(msg, "`field` node `name` attribute duplicated");
    }

    #[test]
    fn rejects_bad_namespace() {
        let (_, msg) = error_of(r#"<define><reader name="a" namespace="x..y"/></define>"#);
        assert_eq!(msg, "`reader` node `namespace` attribute is invalid");
    }

    #[test]
    fn rejects_reserved_local_struct_name() {
        let (_, msg) = error_of(
            r#"<define><table name="T" file="t" key="k"><struct name="RowSet"/><col name="k" type="int"/></table></define>"#,
        );
        assert!(msg.starts_with("local struct can not be named"));
    }

    #[test]
    fn rejects_bad_types() {
        let (_, msg) = error_of(
            r#"<define><struct name="S"><field name="a" type="float"/></struct></define>"#,
        );
        assert_eq!(msg, "type `float` is invalid");

        let (_, msg) = error_of(
            r#"<define><table name="T" file="t" key="k"><col name="k" type="int"/><col name="v" type="list{Missing}"/></table></define>"#,
        );
        assert_eq!(msg, "type `Missing` is undefined");

        let (_, msg) = error_of(
            r#"<define><table name="T" file="t" key="k"><col name="k" type="int"/><col name="v" type="list{list{int}}"/></table></define>"#,
        );
        assert_eq!(msg, "type `list{int}` is undefined");
    }

    #[test]
    fn rejects_bad_keys() {
        let (_, msg) = error_of(
            r#"<define><table name="T" file="t"><col name="k" type="int"/></table></define>"#,
        );
        assert_eq!(msg, "`table` node must contain a `key` or `setkey` attribute");

        let (_, msg) = error_of(
            r#"<define><table name="T" file="t" key="x"><col name="k" type="int"/></table></define>"#,
        );
        assert_eq!(msg, "table key `x` is not defined");

        let (_, msg) = error_of(
            r#"<define><table name="T" file="t" key="k"><col name="k" type="list{int}"/></table></define>"#,
        );
        assert_eq!(msg, "table key can only be `int` or `string` type");
    }

    #[test]
    fn rejects_undeclared_readers() {
        let (_, msg) = error_of(
            r#"<define><reader name="a"/><table name="T" file="t" key="k" readby="a|b"><col name="k" type="int"/></table></define>"#,
        );
        assert_eq!(msg, "reader `b` is not defined");
    }

    #[test]
    fn rejects_missing_attributes() {
        let err = parse(
            r#"<define><table name="T" key="k"><col name="k" type="int"/></table></define>"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
        assert!(err.to_string().ends_with("`table` node must contain a `file` attribute"));
    }

    #[test]
    fn rejects_unexpected_children() {
        let (_, msg) = error_of(
            r#"<define><table name="T" file="t" key="k"><column name="k" type="int"/></table></define>"#,
        );
        assert_eq!(msg, "expect a `struct` or `col` node");
    }
}
