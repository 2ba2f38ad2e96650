// example/src/lib.rs
//
// Table parsers generated by build.rs from tables.xml for the `client` reader.

pub mod pos {
    include!(concat!(env!("OUT_DIR"), "/pos.rs"));
}

pub mod item {
    include!(concat!(env!("OUT_DIR"), "/item.rs"));
}

pub mod npc {
    include!(concat!(env!("OUT_DIR"), "/npc.rs"));
}

pub mod shop_goods {
    include!(concat!(env!("OUT_DIR"), "/shop_goods.rs"));
}

pub mod row {
    include!(concat!(env!("OUT_DIR"), "/row.rs"));
}

pub mod type_ {
    include!(concat!(env!("OUT_DIR"), "/type_.rs"));
}

#[cfg(test)]
mod tests {
    use super::item::{self, Item};
    use super::npc::Npc;
    use super::pos::Pos;
    use super::row::Row;
    use super::shop_goods::ShopGoods;
    use super::type_::Type;
    use tablekit_runtime::TableParseError;

    fn table(lines: &[&str]) -> String {
        lines.iter().map(|line| format!("{}\r\n", line)).collect()
    }

    const ITEM_HEADER: [&str; 2] = [
        "ID\tName\tType\tSpawn\tCosts\tTags",
        "id\tname\ttype\tspawn\tcosts\ttags",
    ];

    fn item_table(data: &[&str]) -> String {
        let mut lines = ITEM_HEADER.to_vec();
        lines.extend_from_slice(data);
        table(&lines)
    }

    #[test]
    fn parses_single_key_rows() {
        let mut items = Item::new();
        items
            .parse(&item_table(&[
                "1\tsword\t2\t3;4\t100;2|101;1\tsharp|metal",
                "2\t\"say \"\"hi\"\"\"\tabc\t0;0\t\t",
            ]))
            .unwrap();

        assert_eq!(items.rows().len(), 2);
        let sword = items.get_row(1).unwrap();
        assert_eq!(
            sword,
            &item::Row {
                id: 1,
                name: "sword".to_string(),
                type_: 2,
                spawn: Pos { x: 3, y: 4 },
                costs: vec![
                    item::Cost { item: 100, count: 2 },
                    item::Cost { item: 101, count: 1 },
                ],
                tags: vec!["sharp".to_string(), "metal".to_string()],
            }
        );

        let second = items.get_row(2).unwrap();
        assert_eq!(second.name, "say \"hi\"");
        // malformed ints read as zero
        assert_eq!(second.type_, 0);
        assert!(second.costs.is_empty());
        assert!(second.tags.is_empty());
        assert!(items.get_row(3).is_none());
    }

    fn quote_cell(text: &str) -> String {
        format!("\"{}\"", text.replace('"', "\"\""))
    }

    fn render_item(row: &item::Row) -> String {
        let costs: Vec<String> = row
            .costs
            .iter()
            .map(|cost| format!("{};{}", cost.item, cost.count))
            .collect();
        [
            row.id.to_string(),
            quote_cell(&row.name),
            row.type_.to_string(),
            format!("{};{}", row.spawn.x, row.spawn.y),
            costs.join("|"),
            row.tags.join("|"),
        ]
        .join("\t")
    }

    #[test]
    fn rendered_rows_parse_back() {
        let rows = vec![
            item::Row {
                id: 1,
                name: "plain".to_string(),
                type_: 2,
                spawn: Pos { x: 3, y: -4 },
                costs: vec![
                    item::Cost { item: 100, count: 2 },
                    item::Cost { item: 101, count: 1 },
                ],
                tags: vec!["sharp".to_string(), "metal".to_string()],
            },
            item::Row {
                id: 2,
                name: "say \"hi\"".to_string(),
                type_: 0,
                spawn: Pos { x: 0, y: 0 },
                costs: vec![],
                tags: vec![],
            },
            item::Row {
                id: 7,
                name: "\"quoted\" | a;b".to_string(),
                type_: -3,
                spawn: Pos { x: -1, y: 9 },
                costs: vec![item::Cost { item: 5, count: 0 }],
                tags: vec!["x".to_string()],
            },
        ];
        let data: Vec<String> = rows.iter().map(render_item).collect();
        let data: Vec<&str> = data.iter().map(String::as_str).collect();

        let mut items = Item::new();
        items.parse(&item_table(&data)).unwrap();
        let parsed: Vec<item::Row> = items.rows().values().cloned().collect();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn duplicate_key_names_the_line() {
        let mut items = Item::new();
        let err = items
            .parse(&item_table(&["1\ta\t0\t0;0\t\t", "1\tb\t0\t0;0\t\t"]))
            .unwrap_err();
        assert_eq!(
            err,
            TableParseError::DuplicateKey {
                line: 4,
                key: "id".to_string(),
                value: "1".to_string(),
            }
        );
        assert_eq!(err.to_string(), "line 4 key `id` value 1 is duplicated");
    }

    #[test]
    fn empty_key_and_bad_values() {
        let mut items = Item::new();
        let err = items.parse(&item_table(&["\ta\t0\t0;0\t\t"])).unwrap_err();
        assert_eq!(err, TableParseError::EmptyKey { line: 3, key: "id".to_string() });

        let err = items.parse(&item_table(&["1\ta\t0\t3\t\t"])).unwrap_err();
        assert_eq!(
            err,
            TableParseError::InvalidValue { line: 3, column: "spawn".to_string() }
        );

        // trailing data after the last struct field
        let err = items.parse(&item_table(&["1\ta\t0\t3;4;\t\t"])).unwrap_err();
        assert_eq!(err.line(), 3);

        let err = items.parse(&item_table(&["1\ta\t0\t0;0\t7\t"])).unwrap_err();
        assert_eq!(
            err,
            TableParseError::InvalidValue { line: 3, column: "costs".to_string() }
        );

        let err = items.parse(&item_table(&["1\ta"])).unwrap_err();
        assert_eq!(
            err,
            TableParseError::ColumnCount { line: 3, found: 2, expected: 6 }
        );
    }

    #[test]
    fn header_lines_are_checked() {
        let mut items = Item::new();
        assert_eq!(items.parse("").unwrap_err(), TableParseError::MissingCommentLine);
        assert_eq!(
            items.parse(&table(&[ITEM_HEADER[0]])).unwrap_err(),
            TableParseError::MissingNameLine
        );
        assert_eq!(
            items.parse(&table(&["a\tb"])).unwrap_err(),
            TableParseError::ColumnCount { line: 1, found: 2, expected: 6 }
        );

        let err = items
            .parse(&table(&[ITEM_HEADER[0], "id\tname\ttype\tspawn\tcosts\ttgas"]))
            .unwrap_err();
        assert_eq!(err, TableParseError::ColumnName { column: 6, name: "tags".to_string() });
        assert_eq!(err.to_string(), "column 6 should be named as `tags`");
    }

    #[test]
    fn failed_parse_keeps_loaded_rows() {
        let mut items = Item::new();
        items.parse(&item_table(&["1\ta\t0\t0;0\t\t"])).unwrap();
        assert!(items.parse(&item_table(&["1\ta\t0\tbad\t\t"])).is_err());
        assert_eq!(items.rows().len(), 1);
        assert_eq!(items.get_row(1).unwrap().name, "a");
    }

    #[test]
    fn string_keys_and_filtered_columns() {
        let mut npcs = Npc::new();
        npcs.parse(&table(&["Name\tPos", "name\tpos", "guard\t10;20", "smith\t-1;5"]))
            .unwrap();
        assert_eq!(npcs.get_row("guard").unwrap().pos, Pos { x: 10, y: 20 });
        assert_eq!(npcs.get_row("smith").unwrap().pos, Pos { x: -1, y: 5 });
        let keys: Vec<&str> = npcs.rows().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["guard", "smith"]);

        // `script` is server only, so the client file has two columns
        let err = npcs
            .parse(&table(&["Name\tPos\tScript", "name\tpos\tscript"]))
            .unwrap_err();
        assert_eq!(err, TableParseError::ColumnCount { line: 1, found: 3, expected: 2 });
    }

    const SHOP_HEADER: [&str; 2] = ["Shop\tGoods\tPrices", "shop\tgoods\tprices"];

    fn shop_table(data: &[&str]) -> String {
        let mut lines = SHOP_HEADER.to_vec();
        lines.extend_from_slice(data);
        table(&lines)
    }

    #[test]
    fn set_key_groups_continuation_rows() {
        let mut shops = ShopGoods::new();
        shops
            .parse(&shop_table(&["5\ta\t1|2|3", "\tb\t", "7\tc\t4"]))
            .unwrap();

        let group = shops.get_row_set(5).unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].goods, "a");
        assert_eq!(group[0].prices, vec![1, 2, 3]);
        assert_eq!(group[1].shop, 5);
        assert_eq!(group[1].goods, "b");
        assert!(group[1].prices.is_empty());
        assert_eq!(shops.get_row_set(7).unwrap().len(), 1);
        assert_eq!(shops.row_sets().len(), 2);
    }

    #[test]
    fn set_key_repeated_key_is_a_duplicate() {
        let mut shops = ShopGoods::new();
        let err = shops
            .parse(&shop_table(&["5\ta\t", "5\tb\t"]))
            .unwrap_err();
        assert_eq!(
            err,
            TableParseError::DuplicateKey {
                line: 4,
                key: "shop".to_string(),
                value: "5".to_string(),
            }
        );
        assert!(shops.row_sets().is_empty());
    }

    #[test]
    fn set_key_reopened_group_is_a_duplicate() {
        let mut shops = ShopGoods::new();
        let err = shops
            .parse(&shop_table(&["5\ta\t", "\tb\t", "5\tc\t"]))
            .unwrap_err();
        assert_eq!(
            err,
            TableParseError::DuplicateKey {
                line: 5,
                key: "shop".to_string(),
                value: "5".to_string(),
            }
        );

        let err = shops.parse(&shop_table(&["\ta\t"])).unwrap_err();
        assert_eq!(err, TableParseError::EmptyKey { line: 3, key: "shop".to_string() });

        let err = shops
            .parse(&table(&[SHOP_HEADER[0], "shop\titme\tprices"]))
            .unwrap_err();
        assert_eq!(err, TableParseError::ColumnName { column: 2, name: "goods".to_string() });
    }

    #[test]
    fn reserved_words_and_row_struct() {
        let mut types = Type::new();
        types
            .parse(&table(&[
                "ID\tYield\tFinal\tFirst\tLayout",
                "id\tyield\tfinal\tfirst\tlayout",
                "1\t30\tdone\t0;2\t1;2|2;3",
            ]))
            .unwrap();

        let row: &super::type_::Row = types.get_row(1).unwrap();
        assert_eq!(row.yield_, 30);
        assert_eq!(row.final_, "done");
        assert_eq!(row.first, Row { slot: 0, type_: 2 });
        assert_eq!(row.layout, vec![Row { slot: 1, type_: 2 }, Row { slot: 2, type_: 3 }]);
    }
}
