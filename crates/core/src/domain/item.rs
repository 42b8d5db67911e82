use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_code: String,
    pub item_group: String,
    pub stock_uom: String,
    pub standard_rate: Decimal,
}

/// Answer of the item-stats query: current stock balance plus the rate on
/// the most recently recorded sale line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub item_code: String,
    pub stock_level: Decimal,
    pub last_sale_price: Decimal,
}
