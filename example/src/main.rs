// example/src/main.rs

use example_app::item::Item;
use example_app::shop_goods::ShopGoods;
use tablekit_runtime::TableParseError;

const ITEM_TXT: &str = "ID\tName\tType\tSpawn\tCosts\tTags\r\n\
id\tname\ttype\tspawn\tcosts\ttags\r\n\
1\tsword\t2\t3;4\t100;2|101;1\tsharp|metal\r\n\
2\tshield\t3\t0;0\t\t\r\n";

const SHOP_GOODS_TXT: &str = "Shop\tGoods\tPrices\r\n\
shop\tgoods\tprices\r\n\
5\tsword\t120|100\r\n\
\tshield\t80\r\n\
7\tpotion\t5\r\n";

fn main() -> Result<(), TableParseError> {
    let mut items = Item::new();
    items.parse(ITEM_TXT)?;

    for (id, row) in items.rows() {
        println!(
            "item {} = {} (type {}, spawn {};{}, {} costs, tags {:?})",
            id,
            row.name,
            row.type_,
            row.spawn.x,
            row.spawn.y,
            row.costs.len(),
            row.tags
        );
    }

    let mut shops = ShopGoods::new();
    shops.parse(SHOP_GOODS_TXT)?;

    for (shop, goods) in shops.row_sets() {
        let names: Vec<&str> = goods.iter().map(|row| row.goods.as_str()).collect();
        println!("shop {} sells {:?}", shop, names);
    }

    Ok(())
}
